use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Runs in an empty directory with no keys in the environment so a developer's
// .env cannot leak into the test.
fn gamkers(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gamkers").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("GOOGLE_API_KEY")
        .env_remove("SERPER_API_KEY")
        .env_remove("GAMKERS_DECISION");
    cmd
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    gamkers(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: gamkers [OPTIONS] <COMMAND>"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("--decision <DECISION>"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_cli_serve_help() {
    let dir = TempDir::new().unwrap();
    gamkers(&dir)
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--port <PORT>"));
}

#[test]
fn test_missing_search_key_halts_before_input() {
    let dir = TempDir::new().unwrap();
    gamkers(&dir)
        .env("GOOGLE_API_KEY", "g-key")
        .arg("chat")
        .write_stdin("Explain recursion\n")
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("SERPER_API_KEY"));
}

#[test]
fn test_missing_model_key_halts() {
    let dir = TempDir::new().unwrap();
    gamkers(&dir)
        .env("SERPER_API_KEY", "s-key")
        .args(["serve", "--port", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("GOOGLE_API_KEY"));
}

#[test]
fn test_invalid_temperature_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    gamkers(&dir)
        .env("GOOGLE_API_KEY", "g-key")
        .env("SERPER_API_KEY", "s-key")
        .args(["--temperature", "3.5", "ask", "hi"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("temperature"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ask_prints_model_reply() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Recursion is self-reference."}]}
            }]
        })))
        .expect(1)
        .mount(&gemini)
        .await;

    let dir = TempDir::new().unwrap();
    gamkers(&dir)
        .env("GOOGLE_API_KEY", "g-key")
        .env("SERPER_API_KEY", "s-key")
        .env("GEMINI_API_BASE", gemini.uri())
        .env_remove("GAMKERS_MODEL")
        .args(["ask", "Explain recursion"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recursion is self-reference."));
}
