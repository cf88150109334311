//! Unit tests for `ClientOptions`

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use kernel_build_client::types::options::{
    DEFAULT_SERVER_MODULE, ENV_INTERPRETER, ENV_SCRIPT, ENV_SERVER_MODULE, ENV_TIMEOUT_SECS,
};
use kernel_build_client::{BuildClientError, ClientOptions};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_defaults() {
    let options = ClientOptions::default();
    assert_eq!(options.timeout, Duration::from_secs(20));
    assert_eq!(options.server_module, DEFAULT_SERVER_MODULE);
    assert_eq!(options.script_suffix, ".py");
    assert!(options.script_path.is_none());
    assert!(options.validate().is_ok());
}

#[test]
fn test_builder() {
    let options = ClientOptions::builder()
        .interpreter("/usr/bin/python3.11")
        .server_module("pkg.server")
        .timeout(Duration::from_secs(5))
        .env("ASCEND_HOME", "/opt/ascend")
        .cwd("/tmp")
        .build();

    assert_eq!(options.interpreter, Some(PathBuf::from("/usr/bin/python3.11")));
    assert_eq!(options.server_module, "pkg.server");
    assert_eq!(options.timeout, Duration::from_secs(5));
    assert_eq!(options.env.get("ASCEND_HOME").map(String::as_str), Some("/opt/ascend"));
    assert_eq!(options.cwd, Some(PathBuf::from("/tmp")));
}

#[test]
fn test_env_overrides() {
    let options = ClientOptions::from_lookup(lookup(&[
        (ENV_INTERPRETER, "/opt/py/bin/python"),
        (ENV_SERVER_MODULE, "custom.server"),
        (ENV_SCRIPT, "/srv/server.py"),
        (ENV_TIMEOUT_SECS, " 45 "),
    ]))
    .unwrap();

    assert_eq!(options.interpreter, Some(PathBuf::from("/opt/py/bin/python")));
    assert_eq!(options.server_module, "custom.server");
    assert_eq!(options.script_path, Some(PathBuf::from("/srv/server.py")));
    assert_eq!(options.timeout, Duration::from_secs(45));
}

#[test]
fn test_empty_env_values_are_ignored() {
    let options = ClientOptions::from_lookup(lookup(&[(ENV_INTERPRETER, ""), (ENV_SCRIPT, "")]))
        .unwrap();
    assert!(options.interpreter.is_none());
    assert!(options.script_path.is_none());
}

#[test]
fn test_bad_timeout_env() {
    for raw in ["soon", "0", "-3"] {
        let result = ClientOptions::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, raw)]));
        assert!(
            matches!(result, Err(BuildClientError::InvalidConfig(_))),
            "{raw:?}"
        );
    }
}

#[test]
fn test_validate() {
    let quoted = ClientOptions::builder().server_module("evil\");import os;(\"").build();
    assert!(matches!(
        quoted.validate(),
        Err(BuildClientError::InvalidConfig(_))
    ));

    let no_module = ClientOptions::builder().server_module("  ").build();
    assert!(no_module.validate().is_err());

    let pinned = ClientOptions::builder()
        .server_module("")
        .script_path("/srv/server.py")
        .build();
    assert!(pinned.validate().is_ok());

    let zero_len = ClientOptions::builder().max_line_length(0).build();
    assert!(zero_len.validate().is_err());
}

#[test]
fn test_configured_interpreter_skips_search() {
    let options = ClientOptions::builder().interpreter("/custom/python").build();
    assert_eq!(
        options.resolve_interpreter().unwrap(),
        PathBuf::from("/custom/python")
    );
}
