// Logging backend: console plus a daily rolling file
//
// Log calls fire on the hook thread, so both sinks only queue lines; the
// writes happen on tracing-appender worker threads.

use std::io::Write;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_PREFIX: &str = "macroboard.log";

pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("macroboard").join("logs"))
}

/// `debug` in debug builds, `info` in release; `RUST_LOG` overrides
fn default_filter() -> EnvFilter {
    let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Build the subscriber without installing it. Keep the guards alive until
/// exit; dropping them flushes pending lines.
pub fn build_subscriber<W>(
    console: W,
    filter: EnvFilter,
    log_dir: Option<PathBuf>,
) -> (impl tracing::Subscriber + Send + Sync + 'static, Vec<WorkerGuard>)
where
    W: Write + Send + 'static,
{
    let (console_writer, console_guard) = tracing_appender::non_blocking(console);
    let mut guards = vec![console_guard];

    let file = log_dir.map(|dir| {
        let (file_writer, file_guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));
        guards.push(file_guard);
        fmt::layer().with_ansi(false).with_writer(file_writer)
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(console_writer))
        .with(file);
    (subscriber, guards)
}

/// Install the global subscriber; `log` records are bridged into it
pub fn init_logging() -> Vec<WorkerGuard> {
    let (subscriber, guards) = build_subscriber(std::io::stdout(), default_filter(), default_log_dir());
    subscriber.init();
    guards
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    /// Console that stalls on every write, like a console with selected text
    struct StalledConsole;

    impl Write for StalledConsole {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_stalled_console_does_not_block_logging_thread() {
        let (subscriber, guards) = build_subscriber(StalledConsole, EnvFilter::new("debug"), None);

        let start = Instant::now();
        tracing::subscriber::with_default(subscriber, || {
            for _ in 0..5 {
                tracing::debug!("F1 from macro keyboard");
            }
        });

        assert!(start.elapsed() < Duration::from_millis(200));
        drop(guards);
    }

    #[test]
    fn test_lines_reach_daily_file() {
        let temp = TempDir::new().unwrap();
        let (subscriber, guards) = build_subscriber(
            std::io::sink(),
            EnvFilter::new("info"),
            Some(temp.path().to_path_buf()),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Macro keyboard detected: DEV_1");
            tracing::debug!("filtered out");
        });
        drop(guards);

        let contents: String = fs::read_dir(temp.path())
            .unwrap()
            .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap())
            .collect();
        assert!(contents.contains("Macro keyboard detected: DEV_1"));
        assert!(!contents.contains("filtered out"));
    }
}
