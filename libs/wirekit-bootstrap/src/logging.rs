use crate::config::{LoggingConfig, Section};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, util::SubscriberInitExt, Layer};

// Keep guards for non-blocking writers to avoid being dropped.
static CONSOLE_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();
static FILE_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

// ================= level helpers =================

fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

fn level_filter(s: &str) -> LevelFilter {
    parse_tracing_level(s)
        .map(LevelFilter::from_level)
        .unwrap_or(LevelFilter::OFF)
}

// ================= config extraction =================

struct ConfigData<'a> {
    default_section: Option<&'a Section>,
    crate_sections: Vec<(String, &'a Section)>,
}

fn extract_config_data(cfg: &LoggingConfig) -> ConfigData<'_> {
    let mut crate_sections = cfg
        .iter()
        .filter(|(k, _)| k.as_str() != "default")
        .map(|(k, v)| (k.clone(), v))
        .collect::<Vec<_>>();
    // HashMap order is random; keep filters deterministic.
    crate_sections.sort_by(|a, b| a.0.cmp(&b.0));

    ConfigData {
        default_section: cfg.get("default"),
        crate_sections,
    }
}

fn console_targets(config: &ConfigData) -> Targets {
    let default_level = config
        .default_section
        .map(|s| level_filter(&s.console_level))
        .unwrap_or(LevelFilter::INFO);

    config
        .crate_sections
        .iter()
        .fold(Targets::new().with_default(default_level), |t, (name, s)| {
            t.with_target(name.clone(), level_filter(&s.console_level))
        })
}

fn file_targets(config: &ConfigData) -> Targets {
    let default_level = config
        .default_section
        .filter(|s| !s.file.trim().is_empty())
        .map(|s| level_filter(&s.file_level))
        .unwrap_or(LevelFilter::OFF);

    config
        .crate_sections
        .iter()
        .filter(|(_, s)| !s.file.trim().is_empty())
        .fold(Targets::new().with_default(default_level), |t, (name, s)| {
            t.with_target(name.clone(), level_filter(&s.file_level))
        })
}

/// All file output goes to one JSON file: the "default" section's file, or the
/// first subsystem that declares one.
fn file_path(config: &ConfigData, base_dir: &Path) -> Option<PathBuf> {
    let file = config
        .default_section
        .map(|s| s.file.trim())
        .filter(|f| !f.is_empty())
        .or_else(|| {
            config
                .crate_sections
                .iter()
                .map(|(_, s)| s.file.trim())
                .find(|f| !f.is_empty())
        })?;

    let p = Path::new(file);
    Some(if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    })
}

// ================= public init =================

/// Install the global subscriber: console (human-friendly) plus an optional JSON file sink.
/// `RUST_LOG` acts as an upper bound when present.
pub fn init_logging(cfg: &LoggingConfig, base_dir: &Path) {
    use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

    // Bridge `log` → `tracing` *before* installing the subscriber
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("LogTracer init skipped: {e}");
    }

    let data = extract_config_data(cfg);
    let env: Option<EnvFilter> = EnvFilter::try_from_default_env().ok();

    let (nb_stderr, guard) = tracing_appender::non_blocking(std::io::stderr());
    let _ = CONSOLE_GUARD.set(guard);

    let console_layer = fmt::layer()
        .with_writer(nb_stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true)
        .with_level(true)
        .with_filter(console_targets(&data));

    let file_layer = file_path(&data, base_dir).and_then(|path| {
        let dir = path.parent()?.to_path_buf();
        let name = path.file_name()?.to_owned();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            eprintln!("Failed to create log directory '{}': {e}", dir.display());
            return None;
        }
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
        let _ = FILE_GUARD.set(guard);
        Some(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_writer(writer)
                .with_filter(file_targets(&data)),
        )
    });

    let subscriber = Registry::default()
        .with(env)
        .with(console_layer)
        .with(file_layer);

    let _ = subscriber.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;

    fn section(console: &str, file: &str, file_level: &str) -> Section {
        Section {
            console_level: console.to_string(),
            file: file.to_string(),
            file_level: file_level.to_string(),
        }
    }

    #[test]
    fn parses_levels() {
        assert_eq!(parse_tracing_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_tracing_level("off"), None);
        assert_eq!(parse_tracing_level("bogus"), Some(Level::INFO));
    }

    #[test]
    fn default_config_has_no_file_sink() {
        let cfg = default_logging_config();
        let data = extract_config_data(&cfg);
        assert!(file_path(&data, Path::new("/tmp")).is_none());
    }

    #[test]
    fn relative_file_is_resolved_against_base_dir() {
        let mut cfg = LoggingConfig::new();
        cfg.insert("default".into(), section("info", "logs/app.log", "debug"));
        let data = extract_config_data(&cfg);
        assert_eq!(
            file_path(&data, Path::new("/srv/wk")),
            Some(PathBuf::from("/srv/wk/logs/app.log"))
        );
    }

    #[test]
    fn subsystem_file_is_used_without_default_file() {
        let mut cfg = LoggingConfig::new();
        cfg.insert("default".into(), section("info", "", ""));
        cfg.insert("wirekit".into(), section("debug", "/var/log/wk.log", "trace"));
        let data = extract_config_data(&cfg);
        assert_eq!(
            file_path(&data, Path::new("/ignored")),
            Some(PathBuf::from("/var/log/wk.log"))
        );
    }
}
