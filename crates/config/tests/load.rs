use app_config::AppConfig;
use std::time::Duration;

#[test]
fn test_load_default_config() {
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.db_port, 5432);
    assert_eq!(cfg.http_port, 8081);
    assert_eq!(cfg.db_pool_size, 16);
    assert_eq!(cfg.shutdown_timeout, Duration::from_secs(5));
}
