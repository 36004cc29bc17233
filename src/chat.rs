//! Conversational turns against the answer endpoint.
//!
//! A [`ChatSession`] turns one question into transcript entries:
//!
//! 1. the recent window of prior turns is taken from the store,
//! 2. the user message is appended,
//! 3. the answer is requested with that window as context,
//! 4. the assistant reply is appended, or on failure an assistant message
//!    `"Error: <message>"` so the conversation stays continuous.
//!
//! The error is still returned to the caller after it has been recorded.

use anyhow::Result;
use fehres_core::chat::{error_turn_content, recent_turns};
use fehres_core::{ChatMessage, ChatMetadata, ChatRole, SettingsStore};
use serde::Serialize;

use crate::api::nlp::{self, AnswerRequest, ChatTurn};
use crate::api::{require_limit, require_query};
use crate::app::App;
use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::library::select_library;

pub struct ChatSession<'a> {
    client: &'a ApiClient,
    history_window: usize,
    result_limit: i64,
}

impl<'a> ChatSession<'a> {
    pub fn new(client: &'a ApiClient, history_window: usize, result_limit: i64) -> Self {
        Self {
            client,
            history_window,
            result_limit,
        }
    }

    fn store(&self) -> &SettingsStore {
        self.client.store()
    }

    /// Ask `question`, recording both sides of the turn in the transcript.
    ///
    /// Input is validated before anything is recorded.
    pub async fn ask(&self, question: &str, library_name: Option<&str>) -> ApiResult<ChatMessage> {
        require_query(question)?;

        let history = self.store().chat_history();
        let chat_history: Vec<ChatTurn> = recent_turns(&history, self.history_window)
            .into_iter()
            .map(ChatTurn::from)
            .collect();

        self.store().add_message(ChatMessage::user(question));

        let request = AnswerRequest {
            query_text: question.to_string(),
            result_limit: self.result_limit,
            library_name: library_name.map(str::to_string),
            chat_history,
        };

        match nlp::get_answer(self.client, &request).await {
            Ok(answer) => {
                let reply = ChatMessage::assistant(answer.answer_text).with_metadata(ChatMetadata {
                    full_prompt: answer.full_prompt_text,
                    chat_history: answer.chat_history_echo,
                });
                self.store().add_message(reply.clone());
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!(error = %e, "answer request failed");
                self.store()
                    .add_message(ChatMessage::assistant(error_turn_content(&e.user_message())));
                Err(e)
            }
        }
    }
}

pub async fn run_ask(
    app: &App,
    question: &str,
    limit: Option<i64>,
    library: Option<&str>,
    show_prompt: bool,
) -> Result<()> {
    let limit = limit.unwrap_or(app.config.chat.answer_limit);
    require_query(question).map_err(ApiError::from)?;
    require_limit(limit).map_err(ApiError::from)?;

    let library = select_library(&app.client, library).await?;
    let session = ChatSession::new(&app.client, app.config.chat.history_window, limit);

    let reply = session
        .ask(question, library.as_ref().map(|l| l.name.as_str()))
        .await?;

    println!("{}", reply.content);
    if show_prompt {
        if let Some(prompt) = reply.metadata.as_ref().and_then(|m| m.full_prompt.as_deref()) {
            println!();
            println!("--- Prompt ---");
            println!("{}", prompt);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct HistoryEntry<'a> {
    role: &'a str,
    content: &'a str,
    timestamp: &'a str,
}

pub fn run_history(app: &App, clear: bool, json: bool) -> Result<()> {
    if clear {
        app.store.clear_history();
        println!("Chat history cleared.");
        return Ok(());
    }

    let history = app.store.chat_history();

    if json {
        let entries: Vec<HistoryEntry> = history
            .iter()
            .map(|m| HistoryEntry {
                role: m.role.as_str(),
                content: &m.content,
                timestamp: &m.timestamp,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No chat history.");
        return Ok(());
    }

    for message in &history {
        let who = match message.role {
            ChatRole::User => "you",
            ChatRole::Assistant => "assistant",
            ChatRole::System => "system",
        };
        println!("[{}] {}:", format_ts_relative(&message.timestamp), who);
        println!("{}", message.content);
        println!();
    }
    Ok(())
}

/// Format an ISO-8601 timestamp relative to now (e.g. "3 hours ago").
fn format_ts_relative(timestamp: &str) -> String {
    let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(timestamp) else {
        return timestamp.to_string();
    };
    let delta = chrono::Utc::now().timestamp() - parsed.timestamp();

    if delta < 0 {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        parsed.format("%Y-%m-%d %H:%M").to_string()
    }
}
