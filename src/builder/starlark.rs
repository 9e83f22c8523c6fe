//! Builder for Starlark molds.
//!
//! The script runs in a fresh module with a single predeclared global,
//! `profile`, a dict of the profile variables. The request is read from the
//! module's top-level names once the script finishes:
//!
//! ```python
//! # meta:name: create_user
//! url = "https://" + profile["host"] + "/users"
//! method = "POST"
//! headers = {"Accept": "application/json"}
//! body = {"name": "jane", "id": 12345678901234567890}
//! auth = {"bearer_token": profile["token"]}
//! ```

use super::fields::{into_request, REQUEST_FIELDS};
use super::BuildError;
use crate::bridge::starlark::{from_value, to_value};
use crate::models::{Mold, MoldSource, Request, ScriptSource};
use crate::profile::Profile;
use crate::template::apply_variables;
use crate::value::Value;
use starlark::environment::{Globals, Module};
use starlark::eval::Evaluator;
use starlark::syntax::{AstModule, Dialect};
use std::collections::BTreeMap;

/// Name of the global holding the profile variables.
pub const PROFILE_GLOBAL: &str = "profile";

/// Whether this builder handles `mold`.
pub fn accepts(mold: &Mold) -> bool {
    matches!(mold.source, MoldSource::Starlark(_))
}

/// Builds `mold` if it is a Starlark script, `Ok(None)` otherwise.
pub fn build(mold: &Mold, profile: &Profile) -> Result<Option<Request>, BuildError> {
    match &mold.source {
        MoldSource::Starlark(script) => build_script(mold, script, profile).map(Some),
        _ => Ok(None),
    }
}

pub(crate) fn build_script(
    mold: &Mold,
    script: &ScriptSource,
    profile: &Profile,
) -> Result<Request, BuildError> {
    let source = apply_variables(&script.raw, &profile.variables);
    let filename = format!("{}.star", mold.name);

    let ast = AstModule::parse(&filename, source, &Dialect::Extended)
        .map_err(|e| BuildError::Parse(e.to_string()))?;

    let module = Module::new();
    let variables = Value::Map(
        profile
            .variables
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect(),
    );
    module.set(PROFILE_GLOBAL, from_value(&variables, module.heap()));

    {
        let globals = Globals::standard();
        let mut eval = Evaluator::new(&module);
        eval.eval_module(ast, &globals)
            .map_err(|e| BuildError::ScriptExecution(e.to_string()))?;
    }

    let mut fields = BTreeMap::new();
    for field in REQUEST_FIELDS {
        match module.get(field) {
            Some(value) if !value.is_none() => {
                fields.insert(field.to_string(), to_value(value)?);
            }
            _ => {}
        }
    }

    into_request(&fields, mold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HttpMethod, RequestBody};
    use crate::value::ValueError;

    fn profile() -> Profile {
        let mut profile = Profile::new("dev");
        profile.set("host", "api.dev");
        profile.set("token", "s3cret");
        profile
    }

    #[test]
    fn test_build_reads_top_level_names() {
        let mold = Mold::starlark(
            r#"# meta:name: create_user
url = "https://" + profile["host"] + "/users"
method = "POST"
headers = {"Accept": ["application/json", "text/plain"]}
body = {"name": "jane", "id": 12345678901234567890}
auth = {"bearer_token": profile["token"]}
options = {"timeout": 30}
"#,
        );
        let request = build(&mold, &profile()).unwrap().unwrap();

        assert_eq!(request.url, "https://api.dev/users");
        assert_eq!(request.method, HttpMethod::POST);
        assert_eq!(request.headers["Accept"].len(), 2);
        assert_eq!(request.header("Authorization"), Some("Bearer s3cret"));
        assert_eq!(request.option("timeout"), Some(&Value::from(30i64)));

        let body = String::from_utf8(request.body.to_bytes().unwrap()).unwrap();
        assert_eq!(body, r#"{"id":12345678901234567890,"name":"jane"}"#);
    }

    #[test]
    fn test_textual_substitution_before_parse() {
        let mold = Mold::starlark("url = \"https://{host}/ping\"\nmethod = \"GET\"\nbody = \"\"\n");
        let request = build(&mold, &profile()).unwrap().unwrap();
        assert_eq!(request.url, "https://api.dev/ping");
        assert_eq!(request.body, RequestBody::Raw(String::new()));
    }

    #[test]
    fn test_missing_body_is_conversion_error() {
        let mold = Mold::starlark("url = 'https://x'\nmethod = 'GET'\n");
        assert_eq!(
            build(&mold, &profile()).unwrap_err(),
            BuildError::ValueConversion(ValueError::Missing {
                field: "body".to_string()
            })
        );
    }

    #[test]
    fn test_none_counts_as_absent() {
        let mold = Mold::starlark("url = 'https://x'\nmethod = 'GET'\nbody = None\n");
        assert!(matches!(
            build(&mold, &profile()),
            Err(BuildError::ValueConversion(ValueError::Missing { .. }))
        ));
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let mold = Mold::starlark("url = (\n");
        assert!(matches!(build(&mold, &profile()), Err(BuildError::Parse(_))));
    }

    #[test]
    fn test_runtime_error_is_execution_error() {
        let mold = Mold::starlark("url = profile['missing']\nmethod = 'GET'\nbody = ''\n");
        assert!(matches!(
            build(&mold, &profile()),
            Err(BuildError::ScriptExecution(_))
        ));
    }

    #[test]
    fn test_each_build_uses_a_fresh_module() {
        let first = Mold::starlark("url = 'https://x'\nmethod = 'GET'\nbody = ''\noutput = 'a.txt'\n");
        let second = Mold::starlark("url = 'https://y'\nmethod = 'GET'\nbody = ''\n");
        assert_eq!(
            build(&first, &profile()).unwrap().unwrap().output.as_deref(),
            Some("a.txt")
        );
        assert_eq!(build(&second, &profile()).unwrap().unwrap().output, None);
    }

    #[test]
    fn test_rejects_other_sources() {
        let mold = Mold::lua("return {}");
        assert!(!accepts(&mold));
        assert_eq!(build(&mold, &profile()).unwrap(), None);
    }
}
