//! # Fehres
//!
//! Command-line client for a retrieval-augmented-generation backend.
//!
//! Fehres uploads documents, triggers chunking and scraping jobs, pushes
//! chunks into the backend's vector index, runs semantic search, and holds
//! a conversation with an assistant grounded in the indexed content. The
//! backend does all of the heavy lifting; this crate is the typed
//! request/response contract plus a persisted settings/chat store.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Commands   │──▶│  Domain API  │──▶│  ApiClient   │──▶ backend
//! │ chat/ingest… │   │ data/nlp/…   │   │   reqwest    │
//! └──────┬───────┘   └──────────────┘   └──────┬───────┘
//!        │                                     │ base URL read per call
//!        ▼                                     ▼
//!   ┌──────────────────────────────────────────────┐
//!   │ SettingsStore (fehres-core) ── FileStorage   │
//!   └──────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! fehres settings set-api-url http://localhost:8000/api/v1
//! fehres health
//! fehres upload docs/*.pdf --process
//! fehres index push
//! fehres search "connection pooling" --limit 5
//! fehres ask "how do I configure the pool size?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`client`] | HTTP transport, timeouts, multipart progress |
//! | [`error`] | Typed backend-call failures |
//! | [`api`] | One function per backend capability |
//! | [`storage`] | On-disk backend for the settings/chat store |
//! | [`app`] | Store + client context handed to commands |
//! | [`library`] | Backend status, library listing and selection |
//! | [`chat`] | Conversational turns and transcript display |
//! | [`ingest`] | Upload, processing and project data commands |
//! | [`scrape`] | Documentation scraping and cache resume |
//! | [`index`] | Vector index push and statistics |
//! | [`search`] | Semantic search |
//! | [`analyze`] | Prescription image analysis |
//! | [`settings`] | Settings inspection and mutation |
//! | [`progress`] | Upload progress reporting on stderr |

pub mod analyze;
pub mod api;
pub mod app;
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod library;
pub mod progress;
pub mod scrape;
pub mod search;
pub mod settings;
pub mod storage;
