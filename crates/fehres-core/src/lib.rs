//! # Fehres Core
//!
//! I/O-free logic shared by every Fehres front end: the data model
//! exchanged with the RAG backend, the persisted settings/chat store,
//! library selection and client-side upload tracking.
//!
//! This crate contains no tokio, reqwest, or filesystem I/O. Durable
//! storage is reached only through the [`store::StateStorage`] trait, so
//! the store can be backed by a file, a browser's local storage, or the
//! in-memory backend used in tests.

pub mod chat;
pub mod error;
pub mod models;
pub mod selection;
pub mod store;
pub mod upload;

pub use error::ValidationError;
pub use models::{
    ChatMessage, ChatMetadata, ChatRole, Library, SearchResult, Settings, Theme, UploadStatus,
    UploadedFile,
};
pub use store::{SettingsStore, StateStorage, StoreState, SubscriptionId};
