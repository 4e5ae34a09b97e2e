use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCheckpoint {
    pub status: EventStatus,
    pub matches: usize,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `.{adapter}_checkpoint.json` (spec.md §6): `{event_id -> {status,
/// matches, timestamp, error?}}`. Rewritten after each event so a rerun can
/// skip completed work and a crash loses at most the in-flight event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(flatten)]
    events: HashMap<String, EventCheckpoint>,
}

impl Checkpoint {
    pub fn path_for_adapter(checkpoint_dir: &str, adapter_id: &str) -> PathBuf {
        Path::new(checkpoint_dir).join(format!(".{adapter_id}_checkpoint.json"))
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents).unwrap_or_default()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err),
        }
    }

    pub fn is_done(&self, event_id: &str) -> bool {
        matches!(
            self.events.get(event_id),
            Some(EventCheckpoint { status: EventStatus::Ok, .. })
        )
    }

    pub fn record(&mut self, event_id: impl Into<String>, result: EventCheckpoint) {
        self.events.insert(event_id.into(), result);
    }

    /// Write via a temp file + rename so a process killed mid-write never
    /// leaves a half-written, unparseable checkpoint behind.
    pub fn flush(&self, path: &Path) -> io::Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        let serialized = serde_json::to_vec_pretty(self)?;
        std::fs::write(&tmp_path, serialized)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}
