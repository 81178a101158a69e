use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::filter_fn, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::models::LoggingConfig;
use crate::modules::renewal::LOG_TARGET as RENEWAL_TARGET;

/// Keeps the background log writers alive; dropping it flushes pending lines
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

pub fn get_log_dir(config: &LoggingConfig) -> Result<PathBuf, String> {
    let log_dir = config.dir.clone();

    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)
            .map_err(|e| format!("Failed to create log directory: {}", e))?;
    }

    Ok(log_dir)
}

/// Initialize logger system.
/// Console output is always on; file output only when `config.enabled`.
pub fn init_logger(config: &LoggingConfig) -> LogGuard {
    let mut guards = Vec::new();

    // 1. Console output layer
    let console_layer = fmt::Layer::new()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    // 2. File layers: renewal events and everything else go to separate files
    let log_dir = if config.enabled {
        match get_log_dir(config) {
            Ok(dir) => Some(dir),
            Err(e) => {
                eprintln!("File logging disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let (proxy_writer, renewal_writer) = match log_dir {
        Some(dir) => (
            open_log_file(&dir, &config.proxy_file),
            open_log_file(&dir, &config.renewal_file),
        ),
        None => (None, None),
    };

    let proxy_layer = proxy_writer.map(|(writer, guard)| {
        guards.push(guard);
        fmt::Layer::new()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_filter(filter_fn(|meta| meta.target() != RENEWAL_TARGET))
    });
    let renewal_layer = renewal_writer.map(|(writer, guard)| {
        guards.push(guard);
        fmt::Layer::new()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .with_level(true)
            .with_filter(filter_fn(|meta| meta.target() == RENEWAL_TARGET))
    });

    // 3. Set filter layer (default to INFO and above)
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // 4. Initialize global subscriber (use try_init to avoid crash on re-initialization).
    // try_init also installs the `log` bridge.
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(proxy_layer)
        .with(renewal_layer)
        .try_init();

    info!(
        "Logger system initialized (Console{})",
        if guards.is_empty() { "" } else { " + File Persistence" }
    );

    LogGuard { _guards: guards }
}

/// Non-blocking appender for one log file, or None with a console warning
fn open_log_file(dir: &Path, file_name: &str) -> Option<(NonBlocking, WorkerGuard)> {
    match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
    {
        Ok(appender) => Some(tracing_appender::non_blocking(appender)),
        Err(e) => {
            eprintln!("File logging to {:?} disabled: {}", dir.join(file_name), e);
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing::subscriber::DefaultGuard;

    /// Shared buffer receiving formatted log lines
    #[derive(Clone, Default)]
    pub struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Route this thread's DEBUG and above events into a buffer
    pub fn capture_logs() -> (Captured, DefaultGuard) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_target(true)
            .with_writer(move || writer.clone())
            .finish();
        (captured, tracing::subscriber::set_default(subscriber))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_log_dir_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            enabled: true,
            dir: dir.path().join("nested").join("logs"),
            ..LoggingConfig::default()
        };
        let log_dir = get_log_dir(&config).unwrap();
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_unopenable_log_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("proxy.log")).unwrap();
        let config = LoggingConfig {
            enabled: true,
            dir: dir.path().to_path_buf(),
            ..LoggingConfig::default()
        };

        assert!(open_log_file(dir.path(), "proxy.log").is_none());

        // The renewal file still opens
        let guard = init_logger(&config);
        assert_eq!(guard._guards.len(), 1);
        assert!(dir.path().join("renew-token.log").is_file());
    }
}
