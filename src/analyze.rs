//! `fehres prescription`: OCR a prescription image and list the
//! medicines the backend recognised.

use std::path::Path;

use anyhow::{Context, Result};

use crate::api::prescription;
use crate::app::App;
use crate::client::UploadSource;
use crate::progress::{callback_for, ProgressMode};

pub async fn run_prescription(
    app: &App,
    image: &Path,
    json: bool,
    progress: Option<ProgressMode>,
) -> Result<()> {
    let source = UploadSource::from_path(image)
        .await
        .with_context(|| format!("Failed to read image: {}", image.display()))?;
    let reporter = progress.unwrap_or_else(ProgressMode::default_for_tty).reporter();
    let on_progress = callback_for(reporter, &source.file_name);

    let analysis = prescription::analyze_prescription(&app.client, source, Some(on_progress)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("--- OCR text ---");
    println!("{}", analysis.ocr_text.trim());
    println!();

    println!("--- Medicines ({}) ---", analysis.medicines.len());
    for medicine in &analysis.medicines {
        match &medicine.active_ingredient {
            Some(active) => println!("{}  ({})", medicine.name, active),
            None => println!("{}", medicine.name),
        }
        if let Some(url) = &medicine.image_url {
            println!("    image: {}", url);
        }
    }
    Ok(())
}
