use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Mutex;
use toolgate_core::ToolGateError;

use crate::backend::AuditBackend;
use crate::record::AuditRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FsyncPolicy {
    #[default]
    PerWrite,
    Never,
}

/// Newline-delimited JSON, opened `O_APPEND | O_CREATE` (spec.md §4.6). A
/// writer mutex serializes concurrent appends; fsync runs per write unless
/// disabled.
pub struct FileAuditBackend {
    path: PathBuf,
    file: Arc<Mutex<File>>,
    fsync: FsyncPolicy,
}

#[derive(Deserialize)]
struct TailRecord {
    id: u64,
    hash: String,
}

impl FileAuditBackend {
    pub fn open(path: impl AsRef<Path>, fsync: FsyncPolicy) -> Result<Self, ToolGateError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ToolGateError::BackendUnavailable(format!("audit file open: {e}")))?;
        Ok(Self { path, file: Arc::new(Mutex::new(file)), fsync })
    }

    fn read_last_line(path: &Path) -> Result<Option<String>, ToolGateError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ToolGateError::BackendUnavailable(format!("audit file read: {e}"))),
        };
        let reader = BufReader::new(file);
        let mut last = None;
        for line in reader.lines() {
            let line = line.map_err(|e| ToolGateError::BackendUnavailable(format!("audit file read: {e}")))?;
            if !line.trim().is_empty() {
                last = Some(line);
            }
        }
        Ok(last)
    }
}

#[async_trait::async_trait]
impl AuditBackend for FileAuditBackend {
    async fn append(&self, record: &AuditRecord) -> Result<(), ToolGateError> {
        let line = serde_json::to_string(record)?;
        let file = self.file.clone();
        let fsync = self.fsync;
        tokio::task::spawn_blocking(move || -> Result<(), ToolGateError> {
            let mut guard = file.blocking_lock();
            writeln!(guard, "{line}").map_err(|e| ToolGateError::BackendUnavailable(format!("audit write: {e}")))?;
            guard.flush().map_err(|e| ToolGateError::BackendUnavailable(format!("audit flush: {e}")))?;
            if fsync == FsyncPolicy::PerWrite {
                guard.sync_data().map_err(|e| ToolGateError::BackendUnavailable(format!("audit fsync: {e}")))?;
            }
            Ok(())
        })
        .await
        .map_err(|e| ToolGateError::Internal(format!("audit write task panicked: {e}")))?
    }

    async fn last_state(&self) -> Result<(u64, String), ToolGateError> {
        let path = self.path.clone();
        let last_line = tokio::task::spawn_blocking(move || Self::read_last_line(&path))
            .await
            .map_err(|e| ToolGateError::Internal(format!("audit tail read task panicked: {e}")))??;

        match last_line {
            None => Ok((0, String::new())),
            Some(line) => {
                let tail: TailRecord = serde_json::from_str(&line)?;
                Ok((tail.id, tail.hash))
            }
        }
    }
}
