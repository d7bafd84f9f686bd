//! Configuration tests for blaze-router

use blaze_router::{ConfigError, RouterConfig};

const SAMPLE: &str = include_str!("../../../config/blaze.toml");

#[test]
fn test_sample_config_parses() {
    let config = RouterConfig::from_toml_str(SAMPLE).unwrap();
    let routes = config.route_table().unwrap();

    assert_eq!(routes.len(), 4);
    assert_eq!(routes.resolve("chinese"), Some("pages/chinese.html"));
    assert_eq!(config.cache.precache.len(), 3);
    assert_eq!(config.lazy.iframe_margin, 200.0);
}

#[test]
fn test_home_must_be_routable() {
    let toml = r#"
home = "brunch"

[[route]]
key = "menu"
path = "pages/menu.html"
"#;
    assert!(matches!(
        RouterConfig::from_toml_str(toml),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_missing_file_reports_path() {
    let err = RouterConfig::from_file("/nonexistent/blaze.toml").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/blaze.toml"));
}
