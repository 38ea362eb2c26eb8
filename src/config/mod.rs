use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one JSON collection per entity kind.
    pub data_dir: PathBuf,
    /// Upper bound on any lock wait before an operation reports
    /// `ResourceBusy`.
    pub lock_timeout: Duration,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn from_env() -> Self {
        let data_dir =
            env::var("BOXOFFICE_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());

        Self::new(data_dir).with_lock_timeout(lock_timeout_from_env())
    }
}

fn lock_timeout_from_env() -> Duration {
    let millis = match env::var("BOXOFFICE_LOCK_TIMEOUT_MS") {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => ms,
            _ => {
                tracing::warn!(
                    "Config: Invalid BOXOFFICE_LOCK_TIMEOUT_MS '{}', using {}ms",
                    raw,
                    DEFAULT_LOCK_TIMEOUT_MS
                );
                DEFAULT_LOCK_TIMEOUT_MS
            }
        },
        Err(_) => DEFAULT_LOCK_TIMEOUT_MS,
    };

    Duration::from_millis(millis)
}
