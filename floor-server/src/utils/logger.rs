//! Logging Infrastructure
//!
//! - Console output, pretty in development and JSON when `LOG_JSON=true`
//! - Optional daily rotating files under `<log_dir>/app` (deleted after 14 days)
//! - HTTP access lines (target `http_access`) go to `<log_dir>/access`

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, prelude::*};

/// Target used by the HTTP access log middleware
pub const ACCESS_TARGET: &str = "http_access";

const RETENTION_DAYS: i64 = 14;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Delete rotated files in `dir` named `<prefix>.YYYY-MM-DD` older than the retention window
pub fn cleanup_old_logs(dir: &Path, prefix: &str) -> anyhow::Result<usize> {
    let cutoff = chrono::Utc::now().date_naive() - chrono::Duration::days(RETENTION_DAYS);
    let mut removed = 0;

    if !dir.exists() {
        return Ok(0);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(date_part) = name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('.'))
            && let Ok(date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            && date < cutoff
        {
            fs::remove_file(&path)?;
            removed += 1;
            tracing::info!(file = %name, "Deleted old log file");
        }
    }

    Ok(removed)
}

/// Console output; filtering is left to the subscriber-wide filter
fn console_layer(json_format: bool) -> BoxedLayer {
    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    }
}

fn file_layer(dir: PathBuf, prefix: &str, json_format: bool, access: bool) -> BoxedLayer {
    let appender = RollingFileAppender::new(Rotation::DAILY, dir, prefix);
    let filter = tracing_subscriber::filter::filter_fn(move |meta| {
        (meta.target() == ACCESS_TARGET) == access
    });
    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::sync::Mutex::new(appender))
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(appender))
            .with_filter(filter)
            .boxed()
    }
}

/// The one filter for every layer: `RUST_LOG` when set, `level` otherwise
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the logging system
///
/// `RUST_LOG` overrides `level` when set.
///
/// ```no_run
/// // Development setup (console only)
/// floor_server::utils::logger::init_logger_with_file("debug", false, None)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let mut layers: Vec<BoxedLayer> = vec![console_layer(json_format)];

    if let Some(dir) = log_dir {
        let app_dir = dir.join("app");
        let access_dir = dir.join("access");
        fs::create_dir_all(&app_dir)?;
        fs::create_dir_all(&access_dir)?;

        layers.push(file_layer(app_dir, "app", json_format, false));
        layers.push(file_layer(access_dir, "access", json_format, true));

        tokio::spawn(periodic_cleanup(dir.to_path_buf()));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(level_filter(level))
        .try_init()?;

    Ok(())
}

/// Periodic cleanup task, runs hourly
async fn periodic_cleanup(log_dir: PathBuf) {
    use tokio::time::{Duration, sleep};

    loop {
        for (sub, prefix) in [("app", "app"), ("access", "access")] {
            if let Err(e) = cleanup_old_logs(&log_dir.join(sub), prefix) {
                tracing::error!(error = %e, "Failed to cleanup old logs");
            }
        }
        sleep(Duration::from_secs(3600)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_layer_has_no_level_of_its_own() {
        let subscriber = Registry::default().with(console_layer(false));
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(tracing::Level::TRACE));
        });
    }

    #[test]
    fn test_cleanup_removes_only_expired_files() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("app.2020-01-01");
        let today = dir.path().join(format!(
            "app.{}",
            chrono::Utc::now().date_naive().format("%Y-%m-%d")
        ));
        let unrelated = dir.path().join("notes.txt");
        for p in [&old, &today, &unrelated] {
            fs::write(p, "x").unwrap();
        }

        let removed = cleanup_old_logs(dir.path(), "app").unwrap();
        assert_eq!(removed, 1);
        assert!(!old.exists());
        assert!(today.exists());
        assert!(unrelated.exists());
    }
}
