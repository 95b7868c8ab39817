use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only record of user interactions, one timestamped line each.
///
/// Nothing reads the file back. Write failures are logged and dropped.
pub struct InteractionLog {
    path: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl InteractionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            path: None,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn record(&self, message: &str) {
        let Some(path) = &self.path else {
            return;
        };

        let line = format_line(&Local::now().format(TIMESTAMP_FORMAT).to_string(), message);

        let _guard = self.write_lock.lock().await;
        let result: std::io::Result<()> = async {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            log::warn!("Could not write interaction log {}: {}", path.display(), e);
        }
    }
}

/// One log line; embedded newlines are flattened so each record stays on one line.
fn format_line(timestamp: &str, message: &str) -> String {
    let flat: String = message
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!("{timestamp} - {flat}\n")
}
