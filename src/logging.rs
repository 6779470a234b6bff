// src/logging.rs

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Уровень: `RUST_LOG`, иначе флаги `-v`, иначе `logging.level` из конфигурации.
/// Логи идут в stderr, чтобы не смешиваться с таблицами в stdout.
pub fn init_logging(config: &LoggingConfig, verbosity: u8) {
    let level = match verbosity {
        0 => config.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("signdomen={level},ldap3=warn")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // Повторная инициализация (например, в тестах) не ошибка
    let _ = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
