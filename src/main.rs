//! # Fehres CLI (`fehres`)
//!
//! The `fehres` binary drives a RAG backend from the terminal: uploading
//! and processing documents, scraping documentation sites, managing the
//! vector index, searching, and chatting with the assistant.
//!
//! ## Usage
//!
//! ```bash
//! fehres --config ./config/fehres.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fehres health` | Check whether the backend is reachable |
//! | `fehres libraries` | List libraries (projects) on the backend |
//! | `fehres upload <files...>` | Upload files, optionally processing them |
//! | `fehres process` | Chunk previously uploaded files |
//! | `fehres scrape run <url>` | Scrape a documentation site |
//! | `fehres scrape cancel` | Cancel the running scrape |
//! | `fehres scrape resume <url>` | Chunk a finished scrape from the backend cache |
//! | `fehres index push` | Push chunks into the vector index |
//! | `fehres index info` | Show vector index statistics |
//! | `fehres search "<query>"` | Semantic search |
//! | `fehres ask "<question>"` | Ask the assistant; the turn is kept in history |
//! | `fehres history` | Show or clear the chat transcript |
//! | `fehres prescription <image>` | OCR a prescription image |
//! | `fehres reset --yes` | Delete all project data on the backend |
//! | `fehres delete-asset <id>` | Delete one uploaded asset (or `--all`) |
//! | `fehres settings ...` | Show or change persisted settings |
//! | `fehres completions <shell>` | Print a shell completion script |
//!
//! ## Examples
//!
//! ```bash
//! # Point the client at a backend (persisted)
//! fehres settings set-api-url http://localhost:8000/api/v1
//!
//! # One-off override without touching the stored setting
//! FEHRES_API_URL=http://staging:8000/api/v1 fehres health
//!
//! # Scrape, and recover if the client gives up before the backend does
//! fehres scrape run https://docs.rs/tokio --reset
//! fehres scrape resume https://docs.rs/tokio
//! ```

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use fehres::app::App;
use fehres::progress::ProgressMode;
use fehres::{analyze, chat, config, index, ingest, library, scrape, search, settings};

/// Fehres CLI: a command-line client for a retrieval-augmented-generation
/// backend.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/fehres.example.toml` for a full example. A missing
/// config file means defaults.
#[derive(Parser)]
#[command(
    name = "fehres",
    about = "Fehres: a command-line client for a retrieval-augmented-generation backend",
    version,
    long_about = "Fehres uploads documents, triggers chunking, scraping and indexing jobs, \
    runs semantic search and converses with an assistant grounded in the indexed content. \
    Settings and the chat transcript persist between runs."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/fehres.toml")]
    config: PathBuf,

    /// Use this API base URL for this run only. The stored setting is not
    /// changed.
    #[arg(long, global = true, env = "FEHRES_API_URL")]
    api_url: Option<String>,

    /// Increase log verbosity (`-v` debug, `-vv` trace). `RUST_LOG` wins
    /// when set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Check whether the backend is reachable.
    Health,

    /// List libraries on the backend.
    ///
    /// The first listed library is the default for every command that
    /// takes `--library`.
    Libraries {
        #[arg(long)]
        json: bool,
    },

    /// Upload files to the backend.
    ///
    /// Each file is tracked as pending, uploading, then uploaded or error.
    /// A failed file does not stop the rest.
    Upload {
        /// Files to upload.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Process (chunk) the project's files after uploading.
        #[arg(long)]
        process: bool,

        /// With `--process`: clear existing chunks first.
        #[arg(long, requires = "process")]
        reset: bool,

        /// Progress output on stderr. Defaults to human when stderr is a TTY.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Chunk previously uploaded files.
    Process {
        /// Clear existing chunks first.
        #[arg(long)]
        reset: bool,

        /// Process only this uploaded file.
        #[arg(long)]
        file_id: Option<String>,
    },

    /// Scrape a documentation site.
    Scrape {
        #[command(subcommand)]
        action: ScrapeAction,
    },

    /// Manage the vector index.
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },

    /// Semantic search over the index.
    ///
    /// Results are printed in the backend's ranking order.
    Search {
        query: String,

        /// Number of results, 1 to 20. Defaults to `search.default_limit`.
        #[arg(long)]
        limit: Option<i64>,

        /// Library to search. Defaults to the first listed library.
        #[arg(long)]
        library: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Ask the assistant a question.
    ///
    /// Recent turns are sent as context. Both the question and the answer
    /// (or the error) are appended to the chat history.
    Ask {
        question: String,

        /// Context chunks to retrieve, 1 to 20. Defaults to `chat.answer_limit`.
        #[arg(long)]
        limit: Option<i64>,

        #[arg(long)]
        library: Option<String>,

        /// Also print the full prompt the backend used.
        #[arg(long)]
        show_prompt: bool,
    },

    /// Show or clear the chat transcript.
    History {
        /// Clear the transcript. Settings are untouched.
        #[arg(long)]
        clear: bool,

        #[arg(long, conflicts_with = "clear")]
        json: bool,
    },

    /// OCR a prescription image and list the medicines found.
    Prescription {
        image: PathBuf,

        #[arg(long)]
        json: bool,

        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Delete every chunk and index entry of the active project.
    Reset {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Delete an uploaded asset with its chunks and vectors.
    DeleteAsset {
        /// Backend file id.
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,

        /// Delete every uploaded asset of the project.
        #[arg(long)]
        all: bool,
    },

    /// Show or change persisted settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Print a shell completion script to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Scrape subcommands.
#[derive(Subcommand)]
enum ScrapeAction {
    /// Scrape and chunk a documentation site.
    ///
    /// On a client-side timeout the backend may still finish; use
    /// `scrape resume` with the same URL afterwards.
    Run {
        /// Absolute base URL of the site.
        url: String,

        /// Clear existing chunks first.
        #[arg(long)]
        reset: bool,
    },

    /// Ask the backend to stop the running scrape.
    Cancel,

    /// Chunk the cached result of a finished scrape without refetching.
    Resume { url: String },
}

/// Index subcommands.
#[derive(Subcommand)]
enum IndexAction {
    /// Push processed chunks into the vector index.
    Push {
        /// Recreate the collection first.
        #[arg(long)]
        reset: bool,

        #[arg(long)]
        library: Option<String>,
    },

    /// Show collection statistics.
    Info {
        #[arg(long)]
        library: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

/// Settings subcommands.
#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings.
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Set the API base URL used by every later call.
    SetApiUrl { url: String },
    /// Set the project id (a positive integer).
    SetProject {
        #[arg(allow_hyphen_values = true)]
        id: String,
    },
    /// Switch between the dark and light theme.
    ToggleTheme,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "fehres", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_or_minimal(&cli.config)?;
    let app = App::open(cfg, cli.api_url)?;

    match cli.command {
        Commands::Health => {
            library::run_health(&app).await?;
        }
        Commands::Libraries { json } => {
            library::run_libraries(&app, json).await?;
        }
        Commands::Upload {
            files,
            process,
            reset,
            progress,
        } => {
            ingest::run_upload(&app, &files, process, reset, progress).await?;
        }
        Commands::Process { reset, file_id } => {
            ingest::run_process(&app, reset, file_id).await?;
        }
        Commands::Scrape { action } => match action {
            ScrapeAction::Run { url, reset } => {
                scrape::run_scrape(&app, &url, reset).await?;
            }
            ScrapeAction::Cancel => {
                scrape::run_cancel(&app).await?;
            }
            ScrapeAction::Resume { url } => {
                scrape::run_resume(&app, &url).await?;
            }
        },
        Commands::Index { action } => match action {
            IndexAction::Push { reset, library } => {
                index::run_push(&app, reset, library.as_deref()).await?;
            }
            IndexAction::Info { library, json } => {
                index::run_info(&app, library.as_deref(), json).await?;
            }
        },
        Commands::Search {
            query,
            limit,
            library,
            json,
        } => {
            search::run_search(&app, &query, limit, library.as_deref(), json).await?;
        }
        Commands::Ask {
            question,
            limit,
            library,
            show_prompt,
        } => {
            chat::run_ask(&app, &question, limit, library.as_deref(), show_prompt).await?;
        }
        Commands::History { clear, json } => {
            chat::run_history(&app, clear, json)?;
        }
        Commands::Prescription {
            image,
            json,
            progress,
        } => {
            analyze::run_prescription(&app, &image, json, progress).await?;
        }
        Commands::Reset { yes } => {
            ingest::run_reset(&app, yes).await?;
        }
        Commands::DeleteAsset { id, all } => {
            ingest::run_delete_asset(&app, id.as_deref(), all).await?;
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show { json } => settings::run_show(&app, json)?,
            SettingsAction::SetApiUrl { url } => settings::run_set_api_url(&app, &url)?,
            SettingsAction::SetProject { id } => settings::run_set_project(&app, &id)?,
            SettingsAction::ToggleTheme => settings::run_toggle_theme(&app)?,
        },
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
