//! `fehres settings`: inspect and change the persisted settings.

use anyhow::Result;

use crate::app::App;

pub fn run_show(app: &App, json: bool) -> Result<()> {
    let settings = app.store.settings();
    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let effective = app.client.base_url();
    println!("api_url:     {}", settings.api_url);
    if effective != settings.api_url {
        println!("             (overridden for this run: {})", effective);
    }
    println!("theme:       {}", settings.theme.as_str());
    println!("project_id:  {}", settings.project_id);
    println!("history:     {} message(s)", app.store.chat_history().len());
    println!("state file:  {}", app.config.state.path.display());
    Ok(())
}

pub fn run_set_api_url(app: &App, url: &str) -> Result<()> {
    app.store.set_api_url(url)?;
    println!("api_url set to {}", app.store.api_url());
    Ok(())
}

pub fn run_set_project(app: &App, id: &str) -> Result<()> {
    let id = app.store.set_project_id(id)?;
    println!("project_id set to {}", id);
    Ok(())
}

pub fn run_toggle_theme(app: &App) -> Result<()> {
    let theme = app.store.toggle_theme();
    println!("theme set to {}", theme.as_str());
    Ok(())
}
