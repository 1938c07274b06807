use palaver::config::Config;

fn keyed() -> Config {
    Config {
        api_key: Some("test-key".to_string()),
        ..Config::default()
    }
}

#[test]
fn test_config_validation_requires_api_key() {
    let err = Config::default().validate().expect_err("missing key");
    assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    assert!(keyed().validate().is_ok());
}

#[test]
fn test_config_validation_requires_key_for_local_endpoint() {
    let config = Config {
        api_url: "http://localhost:8000/v1/messages".to_string(),
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_rejects_non_http_url() {
    let config = Config {
        api_url: "ftp://api.anthropic.com/v1/messages".to_string(),
        ..keyed()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_config_debug_redacts_api_key() {
    let rendered = format!("{:?}", keyed());
    assert!(!rendered.contains("test-key"));
    assert!(rendered.contains("<redacted>"));
}
