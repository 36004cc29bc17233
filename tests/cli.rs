mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use common::Fixture;
use tempfile::TempDir;

fn fehres_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("fehres");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[state]
path = "{}/data/state.json"

[timeouts]
request_secs = 10
long_running_secs = 20

[search]
default_limit = 3
"#,
        root.display()
    );

    let config_path = config_dir.join("fehres.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

/// Run the binary on a blocking thread so the in-process fixture keeps
/// serving.
async fn run_fehres(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let config_path = config_path.to_path_buf();
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    tokio::task::spawn_blocking(move || {
        let binary = fehres_binary();
        let output = Command::new(&binary)
            .arg("--config")
            .arg(&config_path)
            .args(&args)
            .env_remove("FEHRES_API_URL")
            .env_remove("RUST_LOG")
            .output()
            .unwrap_or_else(|e| panic!("Failed to run fehres binary at {:?}: {}", binary, e));

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        (stdout, stderr, output.status.success())
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_settings_persist_between_runs() {
    let (_tmp, config) = setup_test_env();

    let (stdout, _, ok) = run_fehres(&config, &["settings", "show"]).await;
    assert!(ok);
    assert!(stdout.contains("/api/v1"));
    assert!(stdout.contains("dark"));

    let (_, _, ok) = run_fehres(&config, &["settings", "set-api-url", "http://rag.lan:8000/api/v1"]).await;
    assert!(ok);
    let (_, _, ok) = run_fehres(&config, &["settings", "toggle-theme"]).await;
    assert!(ok);
    let (_, _, ok) = run_fehres(&config, &["settings", "set-project", "4"]).await;
    assert!(ok);

    let (stdout, _, ok) = run_fehres(&config, &["settings", "show", "--json"]).await;
    assert!(ok);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["apiUrl"], "http://rag.lan:8000/api/v1");
    assert_eq!(json["theme"], "light");
    assert_eq!(json["projectId"], 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_project_id_keeps_previous() {
    let (_tmp, config) = setup_test_env();

    let (_, stderr, ok) = run_fehres(&config, &["settings", "set-project", "abc"]).await;
    assert!(!ok);
    assert!(stderr.contains("positive integer"));

    let (_, _, ok) = run_fehres(&config, &["settings", "set-project", "-3"]).await;
    assert!(!ok);

    let (stdout, _, _) = run_fehres(&config, &["settings", "show", "--json"]).await;
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["projectId"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_prints_backend_order() {
    let fx = Fixture::start().await;
    let (_tmp, config) = setup_test_env();
    run_fehres(&config, &["settings", "set-api-url", &fx.api_url]).await;

    let (stdout, stderr, ok) = run_fehres(&config, &["search", "pooling"]).await;
    assert!(ok, "search failed: {}", stderr);

    // default_limit = 3 from config
    let first = stdout.find("1. [0.90]").expect("first hit");
    let second = stdout.find("2. [0.70]").expect("second hit");
    let third = stdout.find("3. [0.70]").expect("third hit");
    assert!(first < second && second < third);
    assert!(!stdout.contains("4. ["));

    // Without --library the first listed library is selected.
    let body = &fx.recorder.bodies_for("/nlp/index/search")[0];
    assert_eq!(body["project_name"], "langchain");
    assert_eq!(body["limit"], 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_library_is_rejected() {
    let fx = Fixture::start().await;
    let (_tmp, config) = setup_test_env();

    let (_, stderr, ok) = run_fehres(
        &config,
        &["--api-url", &fx.api_url, "search", "pooling", "--library", "django"],
    )
    .await;
    assert!(!ok);
    assert!(stderr.contains("django"));
    assert!(fx.recorder.bodies_for("/nlp/index/search").is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_api_url_flag_does_not_persist() {
    let fx = Fixture::start_named("override").await;
    let (_tmp, config) = setup_test_env();

    let (stdout, _, ok) = run_fehres(&config, &["--api-url", &fx.api_url, "health"]).await;
    assert!(ok);
    assert!(stdout.contains("online"));
    assert!(stdout.contains("override"));

    let (stdout, _, _) = run_fehres(&config, &["settings", "show", "--json"]).await;
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["apiUrl"], "/api/v1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ask_records_history_including_failures() {
    let fx = Fixture::start().await;
    let (_tmp, config) = setup_test_env();
    run_fehres(&config, &["settings", "set-api-url", &fx.api_url]).await;

    let (stdout, _, ok) = run_fehres(&config, &["ask", "what is a runtime?"]).await;
    assert!(ok);
    assert!(stdout.contains("answer to: what is a runtime?"));

    let (_, stderr, ok) = run_fehres(&config, &["ask", "please fail"]).await;
    assert!(!ok);
    assert!(stderr.contains("llm offline"));

    let (stdout, _, ok) = run_fehres(&config, &["history", "--json"]).await;
    assert!(ok);
    let history: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    let contents: Vec<&str> = history
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(
        contents,
        [
            "what is a runtime?",
            "answer to: what is a runtime?",
            "please fail",
            "Error: llm offline"
        ]
    );

    let (_, _, ok) = run_fehres(&config, &["history", "--clear"]).await;
    assert!(ok);
    let (stdout, _, _) = run_fehres(&config, &["history"]).await;
    assert!(stdout.contains("No chat history."));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_upload_and_process() {
    let fx = Fixture::start().await;
    let (tmp, config) = setup_test_env();
    let doc = tmp.path().join("guide.md");
    fs::write(&doc, "# Guide\n\nPool sizes and timeouts.").unwrap();
    let missing = tmp.path().join("missing.pdf");

    let (stdout, stderr, ok) = run_fehres(
        &config,
        &[
            "--api-url",
            &fx.api_url,
            "upload",
            doc.to_str().unwrap(),
            missing.to_str().unwrap(),
            "--process",
            "--reset",
            "--progress",
            "json",
        ],
    )
    .await;

    // One file failed, so the command fails, but the good file went through.
    assert!(!ok);
    assert!(stdout.contains("uploaded"));
    assert!(stdout.contains("guide.md"));
    assert!(stdout.contains("error"));
    assert!(stdout.contains("Processed 2 file(s), inserted 12 chunk(s)."));
    assert!(stderr.contains("\"status\":\"uploaded\""));
    assert!(stderr.contains("1 of 2 uploads failed"));

    let body = &fx.recorder.bodies_for("/data/process")[0];
    assert_eq!(body["Do_reset"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_index_info_and_scrape() {
    let fx = Fixture::start().await;
    let (_tmp, config) = setup_test_env();
    run_fehres(&config, &["settings", "set-api-url", &fx.api_url]).await;

    let (stdout, _, ok) = run_fehres(&config, &["index", "info", "--library", "tokio"]).await;
    assert!(ok);
    assert!(stdout.contains("vectors:         42"));

    let (stdout, _, ok) = run_fehres(&config, &["scrape", "run", "https://docs.rs/tokio"]).await;
    assert!(ok);
    assert!(stdout.contains("inserted 41 chunk(s)"));

    let (_, stderr, ok) = run_fehres(&config, &["scrape", "run", "docs.rs/tokio"]).await;
    assert!(!ok);
    assert!(stderr.contains("not an absolute URL"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reset_requires_confirmation() {
    let fx = Fixture::start().await;
    let (_tmp, config) = setup_test_env();

    let (_, stderr, ok) = run_fehres(&config, &["--api-url", &fx.api_url, "reset"]).await;
    assert!(!ok);
    assert!(stderr.contains("--yes"));

    let (stdout, _, ok) = run_fehres(&config, &["--api-url", &fx.api_url, "reset", "--yes"]).await;
    assert!(ok);
    assert!(stdout.contains("project_reset"));
}

#[test]
fn test_completions_without_config() {
    let output = Command::new(fehres_binary())
        .args(["--config", "/nonexistent/fehres.toml", "completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("fehres"));
}

#[test]
fn test_missing_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let output = Command::new(fehres_binary())
        .args(["--config"])
        .arg(tmp.path().join("absent.toml"))
        .args(["settings", "show", "--json"])
        .env("HOME", tmp.path())
        .env("XDG_DATA_HOME", tmp.path().join("data"))
        .env_remove("FEHRES_API_URL")
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["apiUrl"], "/api/v1");
    assert_eq!(json["projectId"], 1);
}
