use std::sync::OnceLock;

use falseguard_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "falseguard-tests".to_string(),
            emit_stderr: true,
            format: LogFormat::from_env_or(LogFormat::Text),
            default_filter: "debug".to_string(),
            ..LogConfig::default()
        };

        falseguard_common::observability::init_logging(config).unwrap_or_default()
    });
}
