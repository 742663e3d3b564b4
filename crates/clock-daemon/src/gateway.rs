//! File and in-process gateways around the tick loop.
//!
//! Publishers receive every snapshot the loop produces. [`MailboxDir`]
//! reads one-shot command files dropped by external tools, consuming and
//! deleting each file before the next tick.

use clock_common::error::ClockResult;
use clock_common::snapshot::{ClockSnapshot, Command, CommandKind};
use clock_web::StateUpdater;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Destination for published snapshots.
pub trait SnapshotPublisher: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Publish one snapshot.
    fn publish(&mut self, snapshot: &ClockSnapshot) -> ClockResult<()>;

    /// Observe a completed tick.
    fn record_tick(&self) {}

    /// Observe the outcome of applying a command.
    fn record_command(&self, _kind: CommandKind, _applied: bool) {}
}

impl SnapshotPublisher for StateUpdater {
    fn name(&self) -> &'static str {
        "web"
    }

    fn publish(&mut self, snapshot: &ClockSnapshot) -> ClockResult<()> {
        StateUpdater::publish(self, *snapshot);
        Ok(())
    }

    fn record_tick(&self) {
        StateUpdater::record_tick(self);
    }

    fn record_command(&self, kind: CommandKind, applied: bool) {
        StateUpdater::record_command(self, kind, applied);
    }
}

/// Writes each snapshot as a JSON file for renderers that poll the filesystem.
///
/// The file is replaced atomically so readers never see a partial write.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
    tmp_path: PathBuf,
}

impl SnapshotFile {
    /// Publish to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "clock_data.json".to_string());
        let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));
        Self { path, tmp_path }
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotPublisher for SnapshotFile {
    fn name(&self) -> &'static str {
        "file"
    }

    fn publish(&mut self, snapshot: &ClockSnapshot) -> ClockResult<()> {
        fs::write(&self.tmp_path, snapshot.to_json()?)?;
        fs::rename(&self.tmp_path, &self.path)?;
        Ok(())
    }
}

/// Directory of one-shot command files.
///
/// | File               | Body                              |
/// |--------------------|-----------------------------------|
/// | `set_alarm.json`   | `{"hour": 7, "minute": 30}`       |
/// | `set_time.json`    | `{"hour": 15, "minute": 4, "second": 0}` |
/// | `sync_time.json`   | `{"sync": true}`                  |
/// | `clear_alarm.json` | ignored, need not be JSON          |
#[derive(Debug, Clone)]
pub struct MailboxDir {
    dir: PathBuf,
}

impl MailboxDir {
    /// Poll `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File name used for `kind`.
    pub fn file_name(kind: CommandKind) -> &'static str {
        match kind {
            CommandKind::SetAlarm => "set_alarm.json",
            CommandKind::SetTime => "set_time.json",
            CommandKind::Resync => "sync_time.json",
            CommandKind::ClearAlarm => "clear_alarm.json",
        }
    }

    /// Path of the mailbox file for `kind`.
    pub fn path_for(&self, kind: CommandKind) -> PathBuf {
        self.dir.join(Self::file_name(kind))
    }

    /// Consume every present mailbox file, returning the valid commands.
    ///
    /// Files are deleted once read, whether or not they held a valid command.
    pub fn poll(&self) -> Vec<Command> {
        CommandKind::ALL
            .iter()
            .filter_map(|&kind| self.take(kind))
            .collect()
    }

    fn take(&self, kind: CommandKind) -> Option<Command> {
        let path = self.path_for(kind);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read mailbox file");
                return None;
            }
        };

        if let Err(e) = fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "Failed to remove mailbox file");
        }

        if kind == CommandKind::ClearAlarm {
            debug!(path = %path.display(), "Read clear_alarm mailbox file");
            return Some(Command::ClearAlarm);
        }

        let body: Value = match serde_json::from_str(&content) {
            Ok(body) => body,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding malformed mailbox file");
                return None;
            }
        };

        if kind == CommandKind::Resync && body.get("sync").and_then(Value::as_bool) != Some(true)
        {
            debug!(path = %path.display(), "Resync file without sync flag, ignoring");
            return None;
        }

        match Command::from_payload(kind, &body) {
            Ok(command) => {
                debug!(%command, "Read command from mailbox file");
                Some(command)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding invalid mailbox command");
                None
            }
        }
    }
}
