//! Documentation scraping commands.
//!
//! A scrape may outlive the client's long-running deadline while the
//! backend keeps working. The timeout is reported with the exact resume
//! command, which chunks the backend's cached result without refetching.

use anyhow::Result;

use crate::api::data::{self, ScrapeRequest, ScrapeStatus};
use crate::app::App;

pub async fn run_scrape(app: &App, base_url: &str, reset: bool) -> Result<()> {
    let request = ScrapeRequest {
        base_url: base_url.to_string(),
        reset_before_scraping: reset,
    };

    let outcome = match data::scrape_docs(&app.client, &request).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_timeout() => {
            eprintln!("{}", e);
            eprintln!(
                "The backend may still finish. Once it has, run:\n  fehres scrape resume {}",
                base_url.trim()
            );
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    match outcome.status {
        ScrapeStatus::Completed => println!(
            "Scraped {} page(s), processed {}, inserted {} chunk(s).",
            outcome.total_pages_scraped, outcome.processed_page_count, outcome.inserted_chunk_count
        ),
        ScrapeStatus::Cancelled => println!(
            "Scrape cancelled after {} page(s); processed {}, inserted {} chunk(s).",
            outcome.total_pages_scraped, outcome.processed_page_count, outcome.inserted_chunk_count
        ),
    }
    Ok(())
}

pub async fn run_cancel(app: &App) -> Result<()> {
    let ack = data::cancel_scrape(&app.client).await?;
    match ack.message.or(ack.signal) {
        Some(msg) => println!("Cancel requested: {}", msg),
        None => println!("Cancel requested."),
    }
    Ok(())
}

pub async fn run_resume(app: &App, base_url: &str) -> Result<()> {
    let outcome = data::resume_from_cache(&app.client, base_url).await?;
    println!(
        "Processed {} cached page(s), inserted {} chunk(s).",
        outcome.processed_page_count, outcome.inserted_chunk_count
    );
    Ok(())
}
