//! Vector index management, semantic search and answer generation.

use fehres_core::{ChatMessage, SearchResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{flag, require_limit, require_query};
use crate::client::{ApiClient, Deadline};
use crate::error::ApiResult;

/// One prior conversation turn sent as answer context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl From<&ChatMessage> for ChatTurn {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushRequest {
    pub reset_before_indexing: bool,
    pub library_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushOutcome {
    pub status: Option<String>,
    pub inserted_item_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query_text: String,
    pub result_limit: i64,
    pub library_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRequest {
    pub query_text: String,
    pub result_limit: i64,
    pub library_name: Option<String>,
    /// Oldest first.
    pub chat_history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer_text: String,
    pub full_prompt_text: Option<String>,
    /// The conversation as the backend saw it, returned verbatim.
    pub chat_history_echo: Option<Vec<Value>>,
}

/// Table description reported by pgvector-backed indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub table_owner: Option<String>,
    #[serde(default)]
    pub table_space: Option<String>,
    #[serde(default)]
    pub has_indexes: Option<bool>,
}

/// Collection statistics. Every field is optional: the vector store behind
/// the backend decides which ones are reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    #[serde(default)]
    pub vectors_count: Option<i64>,
    #[serde(default)]
    pub points_count: Option<i64>,
    #[serde(default)]
    pub indexed_vectors_count: Option<i64>,
    #[serde(default)]
    pub record_count: Option<i64>,
    #[serde(default)]
    pub table_info: Option<TableInfo>,
    /// Anything else the store reports, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CollectionInfo {
    /// Best available vector count: `record_count`, then `vectors_count`,
    /// `points_count`, `indexed_vectors_count`.
    pub fn vector_count(&self) -> Option<i64> {
        self.record_count
            .or(self.vectors_count)
            .or(self.points_count)
            .or(self.indexed_vectors_count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexInfo {
    pub status: Option<String>,
    pub collection: CollectionInfo,
}

// ============ Wire shapes ============

#[derive(Serialize)]
struct PushWire<'a> {
    do_reset: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_name: Option<&'a str>,
}

#[derive(Deserialize)]
struct PushResponseWire {
    #[serde(rename = "Signal", alias = "signal", default)]
    signal: Option<String>,
    #[serde(rename = "InsertedItemsCount", default)]
    inserted_items_count: i64,
}

#[derive(Deserialize)]
struct IndexInfoWire {
    #[serde(rename = "Signal", alias = "signal", default)]
    signal: Option<String>,
    #[serde(rename = "CollectionInfo", default)]
    collection_info: Option<CollectionInfo>,
}

#[derive(Serialize)]
struct QueryWire<'a> {
    text: &'a str,
    limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_history: Option<&'a [ChatTurn]>,
}

#[derive(Deserialize)]
struct SearchResponseWire {
    #[serde(rename = "Results", default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct AnswerResponseWire {
    #[serde(rename = "Answer", default)]
    answer: Option<String>,
    #[serde(rename = "FullPrompt", default)]
    full_prompt: Option<String>,
    #[serde(rename = "ChatHistory", default)]
    chat_history: Option<Vec<Value>>,
}

// ============ Operations ============

/// `POST /nlp/index/push`: embed the project's chunks into its index.
pub async fn push_to_index(client: &ApiClient, request: &PushRequest) -> ApiResult<PushOutcome> {
    let body = PushWire {
        do_reset: flag(request.reset_before_indexing),
        project_name: request.library_name.as_deref(),
    };
    let wire: PushResponseWire = client
        .post("/nlp/index/push", Some(&body), Deadline::LongRunning)
        .await?;
    Ok(PushOutcome {
        status: wire.signal,
        inserted_item_count: wire.inserted_items_count,
    })
}

/// `GET /nlp/index/info`: collection statistics.
pub async fn index_info(client: &ApiClient, library_name: Option<&str>) -> ApiResult<IndexInfo> {
    let query: Vec<(&str, String)> = library_name
        .map(|name| vec![("project_name", name.to_string())])
        .unwrap_or_default();
    let wire: IndexInfoWire = client.get("/nlp/index/info", &query).await?;
    Ok(IndexInfo {
        status: wire.signal,
        collection: wire.collection_info.unwrap_or_default(),
    })
}

/// `POST /nlp/index/search`: ranked chunks, in the backend's order.
pub async fn search_index(
    client: &ApiClient,
    request: &SearchRequest,
) -> ApiResult<Vec<SearchResult>> {
    require_query(&request.query_text)?;
    require_limit(request.result_limit)?;
    let body = QueryWire {
        text: &request.query_text,
        limit: request.result_limit,
        project_name: request.library_name.as_deref(),
        chat_history: None,
    };
    let wire: SearchResponseWire = client
        .post("/nlp/index/search", Some(&body), Deadline::Request)
        .await?;
    Ok(wire.results)
}

/// `POST /nlp/index/answer`: generate an answer grounded in retrieved
/// chunks, with prior turns as context.
pub async fn get_answer(client: &ApiClient, request: &AnswerRequest) -> ApiResult<Answer> {
    require_query(&request.query_text)?;
    require_limit(request.result_limit)?;
    let body = QueryWire {
        text: &request.query_text,
        limit: request.result_limit,
        project_name: request.library_name.as_deref(),
        chat_history: (!request.chat_history.is_empty()).then_some(&request.chat_history[..]),
    };
    let wire: AnswerResponseWire = client
        .post("/nlp/index/answer", Some(&body), Deadline::LongRunning)
        .await?;
    Ok(Answer {
        answer_text: wire.answer.unwrap_or_default(),
        full_prompt_text: wire.full_prompt,
        chat_history_echo: wire.chat_history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_count_precedence() {
        let info = CollectionInfo {
            vectors_count: Some(10),
            points_count: Some(20),
            ..Default::default()
        };
        assert_eq!(info.vector_count(), Some(10));

        let info = CollectionInfo {
            record_count: Some(3),
            vectors_count: Some(10),
            ..Default::default()
        };
        assert_eq!(info.vector_count(), Some(3));

        let info = CollectionInfo {
            indexed_vectors_count: Some(7),
            ..Default::default()
        };
        assert_eq!(info.vector_count(), Some(7));
        assert_eq!(CollectionInfo::default().vector_count(), None);
    }

    #[test]
    fn partial_collection_info_parses() {
        let wire: IndexInfoWire = serde_json::from_str(
            r#"{"Signal":"vectordb_collection_retrieved","CollectionInfo":{"points_count":42,"status":"green"}}"#,
        )
        .unwrap();
        let info = wire.collection_info.unwrap();
        assert_eq!(info.points_count, Some(42));
        assert_eq!(info.vectors_count, None);
        assert_eq!(info.extra["status"], "green");
    }

    #[test]
    fn search_body_omits_absent_fields() {
        let body = serde_json::to_value(QueryWire {
            text: "what is a future",
            limit: 5,
            project_name: None,
            chat_history: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"text": "what is a future", "limit": 5}));
    }

    #[test]
    fn answer_body_carries_history() {
        let turns = vec![
            ChatTurn {
                role: "user".into(),
                content: "hi".into(),
            },
            ChatTurn {
                role: "assistant".into(),
                content: "hello".into(),
            },
        ];
        let body = serde_json::to_value(QueryWire {
            text: "and then?",
            limit: 10,
            project_name: Some("tokio"),
            chat_history: Some(&turns),
        })
        .unwrap();
        assert_eq!(body["project_name"], "tokio");
        assert_eq!(body["chat_history"][1]["role"], "assistant");
    }

    #[test]
    fn push_body_uses_lowercase_flag() {
        let body = serde_json::to_value(PushWire {
            do_reset: flag(true),
            project_name: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"do_reset": 1}));
    }
}
