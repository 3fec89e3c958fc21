//! Configuration loading tests. Environment variables are process-wide, so
//! these run serially.

use serial_test::serial;
use workshop_service::config::WorkshopConfig;
use workshop_service::WorkshopError;

const VARS: [&str; 4] = [
    "WORKSHOP__DEFAULT_CURRENCY",
    "WORKSHOP__RETRY__MAX_RETRIES",
    "WORKSHOP__DATABASE__URL",
    "WORKSHOP__LOG_LEVEL",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn defaults_apply_without_sources() {
    clear_env();

    let config = WorkshopConfig::load().unwrap();

    assert_eq!(config.service_name, "workshop-service");
    assert_eq!(config.log_level, "info");
    assert_eq!(config.currency().unwrap().as_str(), "ARS");
    assert_eq!(config.retry.max_retries, 8);
    assert_eq!(config.database.max_connections, 10);
    assert!(matches!(config.database_url(), Err(WorkshopError::Config(_))));
}

#[test]
#[serial]
fn environment_overrides_defaults() {
    clear_env();
    std::env::set_var("WORKSHOP__DEFAULT_CURRENCY", "usd");
    std::env::set_var("WORKSHOP__RETRY__MAX_RETRIES", "5");
    std::env::set_var("WORKSHOP__DATABASE__URL", "postgres://localhost/workshop");
    std::env::set_var("WORKSHOP__LOG_LEVEL", "debug");

    let config = WorkshopConfig::load().unwrap();
    clear_env();

    assert_eq!(config.currency().unwrap().as_str(), "USD");
    assert_eq!(config.retry.max_retries, 5);
    assert_eq!(config.retry_config().max_retries, 5);
    assert_eq!(config.database_url().unwrap(), "postgres://localhost/workshop");
    assert_eq!(config.log_level, "debug");
}

#[test]
#[serial]
fn invalid_currency_is_a_config_error() {
    clear_env();
    std::env::set_var("WORKSHOP__DEFAULT_CURRENCY", "pesos");

    let result = WorkshopConfig::load();
    clear_env();

    assert!(matches!(result, Err(WorkshopError::Config(_))));
}
