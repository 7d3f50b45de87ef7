// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn empty_table_uses_defaults() {
    let config: EngineConfig = toml::from_str("").unwrap();
    assert_eq!(config, EngineConfig::default());
}

#[yare::parameterized(
    seconds = { "lock_timeout = \"8s\"", Duration::from_secs(8) },
    minutes = { "lock_timeout = \"2m\"", Duration::from_secs(120) },
    millis = { "lock_timeout = \"250ms\"", Duration::from_millis(250) },
)]
fn lock_timeout_parses_humantime(toml_src: &str, expected: Duration) {
    let config: EngineConfig = toml::from_str(toml_src).unwrap();
    assert_eq!(config.lock_timeout, expected);
    assert_eq!(config.driver_timeout, EngineConfig::default().driver_timeout);
}

#[test]
fn limits_override_defaults() {
    let config: EngineConfig = toml::from_str(
        r#"
        driver_timeout = "5s"
        max_concurrency = 4
        result_buffer = 1
        "#,
    )
    .unwrap();

    assert_eq!(config.driver_timeout, Duration::from_secs(5));
    assert_eq!(config.max_concurrency, 4);
    assert_eq!(config.result_buffer, 1);
}

#[test]
fn bad_duration_is_rejected() {
    let result: Result<EngineConfig, _> = toml::from_str("lock_timeout = \"soon\"");
    assert!(result.is_err());
}
