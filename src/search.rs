use anyhow::Result;
use fehres_core::SearchResult;

use crate::api::nlp::{self, SearchRequest};
use crate::api::{require_limit, require_query};
use crate::app::App;
use crate::error::ApiError;
use crate::library::select_library;

/// Characters of chunk text shown per hit.
const EXCERPT_CHARS: usize = 240;

pub async fn run_search(
    app: &App,
    query: &str,
    limit: Option<i64>,
    library: Option<&str>,
    json: bool,
) -> Result<()> {
    let limit = limit.unwrap_or(app.config.search.default_limit);
    require_query(query).map_err(ApiError::from)?;
    require_limit(limit).map_err(ApiError::from)?;

    let library = select_library(&app.client, library).await?;
    let request = SearchRequest {
        query_text: query.to_string(),
        result_limit: limit,
        library_name: library.map(|l| l.name),
    };

    let results = nlp::search_index(&app.client, &request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    // Backend order is the ranking; never re-sorted here.
    for (i, result) in results.iter().enumerate() {
        println!("{}. [{:.2}]", i + 1, result.score);
        for key in ["title", "source", "url"] {
            if let Some(value) = metadata_str(result, key) {
                println!("    {}: {}", key, value);
            }
        }
        println!("    excerpt: \"{}\"", excerpt(&result.text));
        println!();
    }
    Ok(())
}

fn metadata_str<'a>(result: &'a SearchResult, key: &str) -> Option<&'a str> {
    result.metadata.as_ref()?.get(key)?.as_str()
}

fn excerpt(text: &str) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    match flat.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat.to_string(),
    }
}
