//! Backend status and library listing.
//!
//! Used by `fehres health`, `fehres libraries`, and by every command that
//! takes `--library`.

use anyhow::Result;
use fehres_core::selection::resolve_library;
use fehres_core::Library;

use crate::api::{data, system};
use crate::app::App;
use crate::client::ApiClient;

/// Resolve the library a command should run against.
///
/// An explicit name must be listed by the backend. Without one, the first
/// listed library is selected, as the selection control does. `None` when
/// the backend has no libraries at all.
pub async fn select_library(client: &ApiClient, requested: Option<&str>) -> Result<Option<Library>> {
    let libraries = data::list_libraries(client).await?;
    let selected = resolve_library(&libraries, requested)?.cloned();
    match &selected {
        Some(lib) => tracing::debug!(library = %lib.name, id = lib.id, "library selected"),
        None => tracing::debug!("backend lists no libraries"),
    }
    Ok(selected)
}

pub async fn run_health(app: &App) -> Result<()> {
    let base = app.client.base_url();
    match system::health(&app.client).await {
        Ok(status) => {
            println!("online   {} {}  ({})", status.app_name, status.app_version, base);
            Ok(())
        }
        Err(e) => {
            println!("offline  {}  ({})", e.user_message(), base);
            Err(e.into())
        }
    }
}

pub async fn run_libraries(app: &App, json: bool) -> Result<()> {
    let libraries = data::list_libraries(&app.client).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&libraries)?);
        return Ok(());
    }

    if libraries.is_empty() {
        println!("No libraries.");
        return Ok(());
    }

    println!("{:>6}  NAME", "ID");
    for (i, lib) in libraries.iter().enumerate() {
        let marker = if i == 0 { "  (default)" } else { "" };
        println!("{:>6}  {}{}", lib.id, lib.name, marker);
    }
    Ok(())
}
