//! Vector index commands: push chunks, show collection statistics.

use anyhow::Result;

use crate::api::nlp::{self, PushRequest};
use crate::app::App;
use crate::library::select_library;
use crate::progress::format_number;

pub async fn run_push(app: &App, reset: bool, library: Option<&str>) -> Result<()> {
    let library = select_library(&app.client, library).await?;
    let outcome = nlp::push_to_index(
        &app.client,
        &PushRequest {
            reset_before_indexing: reset,
            library_name: library.map(|l| l.name),
        },
    )
    .await?;
    println!(
        "Indexed {} item(s){}.",
        format_number(outcome.inserted_item_count.max(0) as u64),
        outcome.status.map(|s| format!(" ({})", s)).unwrap_or_default()
    );
    Ok(())
}

pub async fn run_info(app: &App, library: Option<&str>, json: bool) -> Result<()> {
    let library = select_library(&app.client, library).await?;
    let name = library.as_ref().map(|l| l.name.as_str());
    let info = nlp::index_info(&app.client, name).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let c = &info.collection;
    let count = |v: Option<i64>| {
        v.map(|n| format_number(n.max(0) as u64))
            .unwrap_or_else(|| "-".to_string())
    };

    println!("--- Index ---");
    println!("library:         {}", name.unwrap_or("(none)"));
    if let Some(status) = &info.status {
        println!("status:          {}", status);
    }
    println!("vectors:         {}", count(c.vector_count()));
    println!("vectors_count:   {}", count(c.vectors_count));
    println!("points_count:    {}", count(c.points_count));
    println!("indexed_vectors: {}", count(c.indexed_vectors_count));
    println!("record_count:    {}", count(c.record_count));

    if let Some(table) = &c.table_info {
        println!();
        println!("--- Table ---");
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        println!("schema:          {}", show(&table.schema_name));
        println!("table:           {}", show(&table.table_name));
        println!("owner:           {}", show(&table.table_owner));
        println!("tablespace:      {}", show(&table.table_space));
        if let Some(has) = table.has_indexes {
            println!("has_indexes:     {}", has);
        }
    }
    Ok(())
}
