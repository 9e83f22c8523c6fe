//! Workspace on disk, real HTTP against a local mock server.

use super::{init_test_env, write_file};
use mockito::{Matcher, Server};
use request_mold::config::load_config_file;
use request_mold::executor::NativeClient;
use request_mold::loader::{FsLoader, MoldLoader};
use request_mold::profile;
use request_mold::runner::{Runner, StepReport};
use tempfile::TempDir;

const LOGIN: &str = r#"name: login
url: "{base}/login"
method: POST
auth:
  basic:
    user: "{user}"
    password: "{password}"
body:
  user: "{user}"
output: login.json
"#;

const ME: &str = r#"-- meta:name: me
-- meta:prev_req: login
-- doc:url: {base}/me
return {
  url = "{base}/me",
  method = "GET",
  headers = { ["X-Token"] = prevResponse.headers["x-token"][1] },
  body = "",
  options = { timeout = 5 },
}
"#;

#[test]
fn test_run_workspace_against_server() {
    init_test_env();
    let mut server = Server::new();
    let login = server
        .mock("POST", "/login")
        .match_header("authorization", "Basic amFuZTpkb2U=")
        .match_body(Matcher::JsonString(r#"{"user":"jane"}"#.to_string()))
        .with_status(200)
        .with_header("x-token", "abc")
        .with_body(r#"{"ok":true}"#)
        .create();
    let me = server
        .mock("GET", "/me")
        .match_header("x-token", "abc")
        .match_header("x-team", "core")
        .with_status(200)
        .with_body(r#"{"name":"jane"}"#)
        .create();

    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "login.yaml", LOGIN);
    write_file(temp.path(), "me.lua", ME);
    write_file(temp.path(), "profiles/default.yaml", "user: jane\npassword: doe\n");
    write_file(
        temp.path(),
        "config/mold.yaml",
        "timeout: 5000\ndefaultHeaders:\n  X-Team: core\n",
    );

    let config = load_config_file(&temp.path().join("config/mold.yaml")).unwrap();
    let loader = FsLoader::new(&config);
    let molds = loader.read_all(temp.path()).unwrap();
    assert_eq!(molds.len(), 2);

    let profiles = loader.read_profiles(temp.path()).unwrap();
    let base = format!("base={}", server.url());
    let resolved = profile::resolve_named("default", &profiles, &[base]).unwrap();

    let target = molds.iter().find(|m| m.name == "me").unwrap();
    let runner = Runner::new(NativeClient::new(&config));
    let mut reports: Vec<StepReport> = Vec::new();
    let responses = runner
        .run_target(target, &molds, Some(&resolved), |r| reports.push(r.clone()))
        .unwrap();

    login.assert();
    me.assert();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[1].body, br#"{"name":"jane"}"#.to_vec());
    assert_eq!(reports[0].output.as_deref(), Some("login.json"));
    assert_eq!(reports[1].output, None);
    assert_eq!(reports[1].status_code, 200);
}

#[test]
fn test_unknown_profile_is_an_error() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "profiles/default.yaml", "a: 1\n");

    let profiles = FsLoader::default().read_profiles(temp.path()).unwrap();
    assert!(profile::resolve_named("staging", &profiles, &[]).is_err());
    assert!(profile::resolve_named("default", &profiles, &[]).is_ok());
}

#[test]
fn test_layered_profiles_from_disk() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "profiles/default.yaml", "host: localhost\nport: 80\n");
    write_file(temp.path(), "profiles/dev.yaml", "host: dev.example.com\n");
    write_file(
        temp.path(),
        "profiles/dev.local.yaml",
        "port: 8080\nurl: http://{host}:{port}\n",
    );

    let profiles = FsLoader::default().read_profiles(temp.path()).unwrap();
    let resolved = profile::resolve_named("dev.local", &profiles, &[]).unwrap();
    assert_eq!(resolved.get("url"), Some(&"http://dev.example.com:8080".to_string()));
}
