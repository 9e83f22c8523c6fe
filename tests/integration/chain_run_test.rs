//! Mixed-format chains run end to end against a recording client.

use super::{init_test_env, json_response, RecordingClient};
use request_mold::chain;
use request_mold::models::{Mold, RequestBody};
use request_mold::profile::{self, Profile};
use request_mold::runner::{Runner, RunnerError, StepError};
use request_mold::BuildError;
use std::collections::BTreeMap;

const LOGIN: &str = r#"
name: login
url: https://{host}/login
method: POST
auth:
  basic:
    user: "{user}"
    password: "{password}"
body:
  username: "{user}"
"#;

const SESSION: &str = r#"# meta:name: session
# meta:prev_req: login
url = "https://" + profile["host"] + "/session"
method = "GET"
headers = {"X-Client": "{client}"}
body = ""
"#;

const ME: &str = r#"-- meta:name: me
-- meta:prev_req: session
local token = prevResponse.headers["x-session"][1]
return {
  url = "https://{host}/me",
  method = "GET",
  auth = { bearer_token = token },
  headers = { ["X-Previous-Status"] = tostring(prevResponse.status_code) },
  body = "",
}
"#;

fn profiles() -> Vec<Profile> {
    let mut default = BTreeMap::new();
    default.insert("host".to_string(), "api.test".to_string());
    default.insert("user".to_string(), "jane".to_string());
    default.insert("password".to_string(), "doe".to_string());
    default.insert("client".to_string(), "cli-{user}".to_string());

    let mut dev = BTreeMap::new();
    dev.insert("host".to_string(), "dev.api.test".to_string());

    vec![
        Profile::with_variables("default", default),
        Profile::with_variables("dev", dev),
    ]
}

fn workspace() -> Vec<Mold> {
    vec![
        Mold::lua(ME),
        Mold::declarative(LOGIN).unwrap(),
        Mold::starlark(SESSION),
    ]
}

#[test]
fn test_mixed_chain_threads_previous_response() {
    init_test_env();
    let molds = workspace();
    let profile = profile::resolve_named("dev", &profiles(), &[]).unwrap();

    let client = RecordingClient::new(vec![
        json_response(200, r#"{"ok":true}"#, &[]),
        json_response(201, "{}", &[("x-session", "sess-9")]),
        json_response(200, r#"{"name":"jane"}"#, &[]),
    ]);
    let runner = Runner::new(&client);

    let mut steps = Vec::new();
    let responses = runner
        .run_target(&molds[0], &molds, Some(&profile), |report| {
            steps.push(report.name.clone())
        })
        .unwrap();

    assert_eq!(steps, ["login", "session", "me"]);
    assert_eq!(responses.len(), 3);

    let requests = client.requests.borrow();
    assert_eq!(requests[0].url, "https://dev.api.test/login");
    assert_eq!(
        requests[0].header("Authorization"),
        Some("Basic amFuZTpkb2U=")
    );
    let body: serde_json::Value =
        serde_json::from_slice(&requests[0].body.to_bytes().unwrap()).unwrap();
    assert_eq!(body, serde_json::json!({"username": "jane"}));

    assert_eq!(requests[1].url, "https://dev.api.test/session");
    assert_eq!(requests[1].headers["X-Client"], vec!["cli-jane"]);
    assert_eq!(requests[1].body, RequestBody::Raw(String::new()));

    assert_eq!(requests[2].url, "https://dev.api.test/me");
    assert_eq!(requests[2].header("Authorization"), Some("Bearer sess-9"));
    assert_eq!(requests[2].headers["X-Previous-Status"], vec!["201"]);
}

#[test]
fn test_chain_order_across_formats() {
    let molds = workspace();
    let names: Vec<String> = chain::resolve(&molds[0], &molds)
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, ["login", "session", "me"]);
}

#[test]
fn test_script_failure_stops_the_chain() {
    init_test_env();
    let broken_session = SESSION.replace("profile[\"host\"]", "profile[\"nope\"]");
    let molds = vec![
        Mold::lua(ME),
        Mold::declarative(LOGIN).unwrap(),
        Mold::starlark(&broken_session),
    ];
    let profile = profile::resolve_named("default", &profiles(), &[]).unwrap();

    let client = RecordingClient::new(vec![
        json_response(200, "{}", &[]),
        json_response(200, "{}", &[]),
        json_response(200, "{}", &[]),
    ]);
    let runner = Runner::new(&client);

    let err = runner
        .run_target(&molds[0], &molds, Some(&profile), |_| {})
        .unwrap_err();

    assert_eq!(client.requests.borrow().len(), 1);
    assert_eq!(err.responses().len(), 1);
    match err {
        RunnerError::Aborted { step, name, source, .. } => {
            assert_eq!(step, 1);
            assert_eq!(name, "session");
            assert!(matches!(
                source,
                StepError::Build(BuildError::ScriptExecution(_))
            ));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_dangling_previous_request_runs_alone() {
    let mold = Mold::lua(
        "-- meta:name: solo\n-- meta:prev_req: missing\nreturn { url = 'https://x', method = 'DELETE', body = '' }",
    );
    let client = RecordingClient::new(vec![json_response(204, "", &[])]);
    let runner = Runner::new(&client);

    let responses = runner
        .run_target(&mold, &[mold.clone()], None, |_| {})
        .unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].status_code, 204);
}
