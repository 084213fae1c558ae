use std::time::Duration;
use wield::options::{ModelOptions, SessionConfig, SessionLimits, TransportOptions};
use wield::ServerConfig;

#[test]
fn test_transport_options_builder() {
    let options = TransportOptions::new()
        .with_timeout(Duration::from_secs(30))
        .with_proxy("http://proxy.example.com".to_string())
        .with_header("X-Custom-Header".to_string(), "Value".to_string());

    match options {
        TransportOptions::Http {
            timeout,
            proxy,
            headers,
        } => {
            assert_eq!(timeout, Some(Duration::from_secs(30)));
            assert_eq!(proxy, Some("http://proxy.example.com".to_string()));

            let headers = headers.unwrap();
            assert_eq!(headers.get("X-Custom-Header"), Some(&"Value".to_string()));
        }
    }
}

#[test]
fn test_model_options_new() {
    let options = ModelOptions::new("gpt-4o-mini");

    assert_eq!(options.model, "gpt-4o-mini");
    assert_eq!(options.system, None);
    assert_eq!(options.temperature, None);
    assert_eq!(options.max_tokens, None);
}

#[test]
fn test_model_options_builders() {
    let options = ModelOptions::new("gpt-4o-mini")
        .with_system("be terse")
        .with_temperature(0.7)
        .with_max_tokens(100);

    assert_eq!(options.system.as_deref(), Some("be terse"));
    assert_eq!(options.temperature, Some(0.7));
    assert_eq!(options.max_tokens, Some(100));
}

#[test]
fn test_session_limits_defaults_are_bounded() {
    let limits = SessionLimits::default();

    assert_eq!(limits.connect_timeout, Duration::from_secs(10));
    assert_eq!(limits.call_timeout, Duration::from_secs(30));
    assert_eq!(limits.max_rounds, 10);
}

#[test]
fn test_session_config_carries_custom_limits() {
    let config = SessionConfig::new(vec![ServerConfig::new("a", "http://127.0.0.1:1234/mcp")])
        .with_limits(
            SessionLimits::default()
                .with_connect_timeout(Duration::from_secs(3))
                .with_call_timeout(Duration::from_secs(5))
                .with_max_rounds(4),
        );

    assert_eq!(config.servers.len(), 1);
    assert_eq!(config.limits.connect_timeout, Duration::from_secs(3));
    assert_eq!(config.limits.call_timeout, Duration::from_secs(5));
    assert_eq!(config.limits.max_rounds, 4);
}
