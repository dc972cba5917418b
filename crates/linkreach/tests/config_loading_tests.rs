//! Table-driven tests for configuration loading and validation.

use std::io::Write;

use linkreach::config::{load_config, load_config_from_str, load_or_default};
use linkreach::driver::Locator;

/// Represents a single config loading test case.
struct ConfigTestCase {
    /// Test case name for identification.
    name: &'static str,
    /// The config JSON content to test.
    config_json: &'static str,
    /// Whether loading should succeed.
    should_succeed: bool,
    /// Expected error substring (if should_succeed is false).
    expected_error: Option<&'static str>,
}

const JSON_CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "valid_minimal",
        config_json: r#"{ "version": "1.0" }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "version": "1.0",
            "data_directory": "/var/lib/outreach",
            "webdriver": { "endpoint": "http://127.0.0.1:4444", "headless": true },
            "directory": {
                "base_url": "https://www.ycombinator.com",
                "listing_path": "/companies",
                "entity_path_prefix": "/companies/",
                "entity_links": { "css": "a._company_link" },
                "denied_identifiers": ["founders", "industry"]
            },
            "harvest": { "max_scrolls": 30, "pause_ms": 2500, "max_stalls": 4 },
            "profile": {
                "connect_markers": {
                    "required": ["artdeco-button"],
                    "any_of": ["artdeco-button--primary"],
                    "excluded": ["artdeco-button--muted"]
                }
            },
            "batch": { "default_count": 25, "pacing_min_ms": 8000, "pacing_max_ms": 12000 },
            "credentials": {
                "email": { "env_var": "OUTREACH_EMAIL" },
                "password": { "file": "/run/secrets/outreach_password" }
            }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "wrong_version",
        config_json: r#"{ "version": "2.0" }"#,
        should_succeed: false,
        expected_error: Some("Unsupported config version"),
    },
    ConfigTestCase {
        name: "malformed_json",
        config_json: r#"{ "version": "1.0", "#,
        should_succeed: false,
        expected_error: Some("parse"),
    },
    ConfigTestCase {
        name: "empty_data_directory",
        config_json: r#"{ "version": "1.0", "data_directory": "  " }"#,
        should_succeed: false,
        expected_error: Some("data_directory"),
    },
    ConfigTestCase {
        name: "base_url_not_a_url",
        config_json: r#"{ "version": "1.0", "directory": { "base_url": "ycombinator" } }"#,
        should_succeed: false,
        expected_error: Some("base_url"),
    },
    ConfigTestCase {
        name: "prefix_without_slashes",
        config_json: r#"{ "version": "1.0", "directory": { "entity_path_prefix": "companies" } }"#,
        should_succeed: false,
        expected_error: Some("entity_path_prefix"),
    },
    ConfigTestCase {
        name: "zero_scroll_budget",
        config_json: r#"{ "version": "1.0", "harvest": { "max_scrolls": 0 } }"#,
        should_succeed: false,
        expected_error: Some("max_scrolls"),
    },
    ConfigTestCase {
        name: "zero_stall_limit",
        config_json: r#"{ "version": "1.0", "harvest": { "max_stalls": 0 } }"#,
        should_succeed: false,
        expected_error: Some("max_stalls"),
    },
    ConfigTestCase {
        name: "inverted_pacing",
        config_json: r#"{ "version": "1.0", "batch": { "pacing_min_ms": 20000, "pacing_max_ms": 1000 } }"#,
        should_succeed: false,
        expected_error: Some("pacing_min_ms"),
    },
    ConfigTestCase {
        name: "zero_default_count",
        config_json: r#"{ "version": "1.0", "batch": { "default_count": 0 } }"#,
        should_succeed: false,
        expected_error: Some("default_count"),
    },
    ConfigTestCase {
        name: "marker_rule_without_required",
        config_json: r#"{
            "version": "1.0",
            "profile": { "pending_markers": { "required": [], "any_of": ["x"] } }
        }"#,
        should_succeed: false,
        expected_error: Some("pending_markers"),
    },
    ConfigTestCase {
        name: "marker_rule_contradiction",
        config_json: r#"{
            "version": "1.0",
            "profile": {
                "connect_markers": {
                    "required": ["artdeco-button"],
                    "excluded": ["artdeco-button"]
                }
            }
        }"#,
        should_succeed: false,
        expected_error: Some("both expected and excluded"),
    },
    ConfigTestCase {
        name: "invitations_zero_scroll_budget",
        config_json: r#"{ "version": "1.0", "invitations": { "max_scrolls": 0 } }"#,
        should_succeed: false,
        expected_error: Some("invitations.max_scrolls"),
    },
    ConfigTestCase {
        name: "invitations_url_not_a_url",
        config_json: r#"{ "version": "1.0", "invitations": { "url": "mynetwork" } }"#,
        should_succeed: false,
        expected_error: Some("invitations.url"),
    },
    ConfigTestCase {
        name: "credential_without_source",
        config_json: r#"{ "version": "1.0", "credentials": { "password": {} } }"#,
        should_succeed: false,
        expected_error: Some("credentials"),
    },
];

#[test]
fn test_json_config_loading() {
    let mut failures = Vec::new();

    for case in JSON_CONFIG_TESTS {
        let result = load_config_from_str(case.config_json);

        match (result, case.should_succeed) {
            (Ok(_), true) => {}
            (Ok(_), false) => failures.push(format!("{}: expected failure, loaded fine", case.name)),
            (Err(e), true) => failures.push(format!("{}: unexpected error: {}", case.name, e)),
            (Err(e), false) => {
                if let Some(expected) = case.expected_error {
                    let message = e.to_string();
                    if !message.contains(expected) {
                        failures.push(format!(
                            "{}: error '{}' does not mention '{}'",
                            case.name, message, expected
                        ));
                    }
                }
            }
        }
    }

    assert!(failures.is_empty(), "Failures:\n{}", failures.join("\n"));
}

#[test]
fn test_partial_config_keeps_defaults() {
    let config = load_config_from_str(
        r#"{ "version": "1.0", "harvest": { "max_scrolls": 40 }, "batch": { "default_count": 3 } }"#,
    )
    .unwrap();

    assert_eq!(config.harvest.max_scrolls, 40);
    assert_eq!(config.harvest.pause_ms, 3000);
    assert_eq!(config.harvest.max_stalls, 3);
    assert_eq!(config.batch.default_count, 3);
    assert_eq!(config.batch.pacing_min_ms, 10_000);
    assert_eq!(config.batch.pacing_max_ms, 15_000);
    assert_eq!(config.data_directory, "Scraper_Data");
    assert_eq!(
        config.credentials.email.env_var.as_deref(),
        Some("LINKEDIN_EMAIL")
    );
}

#[test]
fn test_locators_accept_css_and_xpath() {
    let config = load_config_from_str(
        r#"{
            "version": "1.0",
            "login": { "logged_in_marker": { "xpath": "//main[@id='feed']" } },
            "directory": { "entity_links": { "css": "a.company" } }
        }"#,
    )
    .unwrap();

    assert_eq!(config.login.logged_in_marker, Locator::xpath("//main[@id='feed']"));
    assert_eq!(config.directory.entity_links, Locator::css("a.company"));
}

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "version": "1.0", "data_directory": "out" }}"#).unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.data_directory, "out");

    let explicit = load_or_default(Some(file.path())).unwrap();
    assert_eq!(explicit.data_directory, "out");
}

#[test]
fn test_missing_explicit_config_is_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let result = load_or_default(Some(&dir.path().join("nope.json")));
    assert!(result.is_err());
}
