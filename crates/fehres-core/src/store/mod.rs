//! Persisted settings/chat store.
//!
//! [`SettingsStore`] is the single owner of [`Settings`] and the chat
//! transcript. Any component may read a snapshot; only the store's actions
//! mutate it. Every mutation is an atomic read-modify-write under one lock,
//! is written through to a [`StateStorage`] backend under [`STORE_KEY`],
//! and is then broadcast to subscribers.
//!
//! # Persisted record
//!
//! ```json
//! {
//!   "state": {
//!     "apiUrl": "/api/v1",
//!     "theme": "dark",
//!     "projectId": 1,
//!     "chatHistory": [ { "id": "…", "role": "user", "content": "…", "timestamp": "…" } ]
//!   },
//!   "version": 0
//! }
//! ```
//!
//! The record is versionless in practice: unknown fields are ignored and
//! every missing or invalid field falls back to its own default. A record
//! that cannot be parsed at all yields the full defaults.

pub mod memory;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::models::{ChatMessage, Settings, Theme};

pub use memory::MemoryStorage;

/// Namespace key of the persisted record.
pub const STORE_KEY: &str = "fehres-settings";

/// Maximum number of transcript entries kept; older ones are evicted first.
pub const CHAT_HISTORY_LIMIT: usize = 50;

/// Version tag written into the persisted record.
pub const STATE_VERSION: u64 = 0;

/// Durable key/value storage for the serialized store record.
///
/// Implementations must be `Send + Sync`; the store serializes all calls
/// under its own lock.
pub trait StateStorage: Send + Sync {
    /// Read the raw record stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>>;
    /// Replace the raw record stored under `key`.
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: StateStorage + ?Sized> StateStorage for std::sync::Arc<T> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }
    fn save(&self, key: &str, value: &str) -> Result<()> {
        (**self).save(key, value)
    }
}

/// Everything the store owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(flatten)]
    pub settings: Settings,
    /// Oldest first, at most [`CHAT_HISTORY_LIMIT`] entries.
    pub chat_history: Vec<ChatMessage>,
}

impl StoreState {
    /// Serialize into the persisted record format.
    pub fn to_record(&self) -> String {
        serde_json::json!({
            "state": self,
            "version": STATE_VERSION,
        })
        .to_string()
    }

    /// Rebuild state from a raw persisted record, failing open to defaults.
    ///
    /// `None` (nothing stored yet) and malformed records both yield
    /// [`StoreState::default`]; a partially valid record keeps whatever
    /// fields are usable.
    pub fn from_record(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                tracing::warn!(error = %e, "persisted state is malformed, using defaults");
                Self::default()
            }
        }
    }

    fn from_value(value: &Value) -> Self {
        let state = match value.get("state") {
            Some(inner) if inner.is_object() => inner,
            _ if value.is_object() => value,
            _ => {
                tracing::warn!("persisted state is not an object, using defaults");
                return Self::default();
            }
        };

        let defaults = Settings::default();

        let api_url = state
            .get("apiUrl")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.api_url);

        let theme = match state.get("theme").and_then(Value::as_str) {
            Some("light") => Theme::Light,
            Some("dark") => Theme::Dark,
            _ => defaults.theme,
        };

        let project_id = state
            .get("projectId")
            .and_then(Value::as_u64)
            .filter(|id| *id >= 1)
            .unwrap_or(defaults.project_id);

        let mut chat_history: Vec<ChatMessage> = state
            .get("chatHistory")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        cap_history(&mut chat_history);

        Self {
            settings: Settings {
                api_url,
                theme,
                project_id,
            },
            chat_history,
        }
    }
}

/// Identifies a subscription returned by [`SettingsStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&StoreState) + Send + Sync>;

/// Process-wide settings and chat transcript with write-through persistence.
///
/// Construct one with [`SettingsStore::open`] at startup and share it by
/// reference (or `Arc`) with every component that needs it.
pub struct SettingsStore {
    state: RwLock<StoreState>,
    storage: Box<dyn StateStorage>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl SettingsStore {
    /// Rehydrate the store from `storage`. Never fails: unreadable or
    /// malformed records fall back to defaults.
    pub fn open(storage: Box<dyn StateStorage>) -> Self {
        let raw = match storage.load(STORE_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "could not read persisted state, using defaults");
                None
            }
        };
        let state = StoreState::from_record(raw.as_deref());
        Self {
            state: RwLock::new(state),
            storage,
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// A store backed by [`MemoryStorage`], starting from defaults.
    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryStorage::new()))
    }

    pub fn snapshot(&self) -> StoreState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn settings(&self) -> Settings {
        self.read(|s| s.settings.clone())
    }

    pub fn api_url(&self) -> String {
        self.read(|s| s.settings.api_url.clone())
    }

    pub fn project_id(&self) -> u64 {
        self.read(|s| s.settings.project_id)
    }

    pub fn theme(&self) -> Theme {
        self.read(|s| s.settings.theme)
    }

    pub fn chat_history(&self) -> Vec<ChatMessage> {
        self.read(|s| s.chat_history.clone())
    }

    /// Overwrite the API base URL used by all subsequent calls.
    pub fn set_api_url(&self, url: &str) -> Result<(), ValidationError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ValidationError::EmptyApiUrl);
        }
        self.update(|s| s.settings.api_url = url.to_string());
        Ok(())
    }

    /// Overwrite the project id from textual input.
    ///
    /// Non-numeric or non-positive input leaves the stored id untouched.
    pub fn set_project_id(&self, input: &str) -> Result<u64, ValidationError> {
        let id = parse_project_id(input)?;
        self.update(|s| s.settings.project_id = id);
        Ok(id)
    }

    /// Flip between dark and light. Returns the new theme.
    pub fn toggle_theme(&self) -> Theme {
        self.update(|s| {
            s.settings.theme = s.settings.theme.toggled();
            s.settings.theme
        })
    }

    /// Append to the transcript, evicting the oldest entries beyond
    /// [`CHAT_HISTORY_LIMIT`].
    pub fn add_message(&self, message: ChatMessage) {
        self.update(|s| {
            s.chat_history.push(message);
            cap_history(&mut s.chat_history);
        });
    }

    /// Empty the transcript. Settings are untouched.
    pub fn clear_history(&self) {
        self.update(|s| s.chat_history.clear());
    }

    /// Register a listener called with the new state after every mutation.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&StoreState) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Apply `f` and persist while still holding the write lock, so records
    /// reach storage in mutation order. Listeners run after both locks are
    /// released and may read the store or (un)subscribe.
    fn update<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let result = f(&mut state);
            if let Err(e) = self.storage.save(STORE_KEY, &state.to_record()) {
                tracing::warn!(error = %e, "failed to persist state");
            }
            (result, state.clone())
        };
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in &listeners {
            listener(&snapshot);
        }
        result
    }
}

/// Parse textual project-id input into a positive integer.
pub fn parse_project_id(input: &str) -> Result<u64, ValidationError> {
    input
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id >= 1)
        .ok_or_else(|| ValidationError::InvalidProjectId {
            input: input.to_string(),
        })
}

fn cap_history(history: &mut Vec<ChatMessage>) {
    if history.len() > CHAT_HISTORY_LIMIT {
        let excess = history.len() - CHAT_HISTORY_LIMIT;
        history.drain(..excess);
    }
}
