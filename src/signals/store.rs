use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::types::{Outcome, Signal};
use crate::errors::SignalIoError;
use crate::gates::{AgentRole, Gate};

/// File-backed checkpoint store.
///
/// Each record lives at `<dir>/<story>-<gate>-<outcome>.json`, so the address
/// is a pure function of its three key components. Rewriting the same
/// outcome replaces the previous record.
#[derive(Debug, Clone)]
pub struct SignalStore {
    dir: PathBuf,
}

impl SignalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn signal_path(&self, story_id: &str, gate: Gate, outcome: Outcome) -> PathBuf {
        self.dir
            .join(format!("{}-{}-{}.json", file_safe(story_id), gate.id(), outcome))
    }

    /// Whether a passed checkpoint exists. Never writes.
    pub fn has_passed(&self, story_id: &str, gate: Gate) -> Result<bool, SignalIoError> {
        let path = self.signal_path(story_id, gate, Outcome::Passed);
        path.try_exists()
            .map_err(|source| SignalIoError::Read { path, source })
    }

    /// Persist the outcome of one gate attempt.
    pub fn record(
        &self,
        story_id: &str,
        gate: Gate,
        outcome: Outcome,
        agent: AgentRole,
    ) -> Result<Signal, SignalIoError> {
        fs::create_dir_all(&self.dir).map_err(|source| SignalIoError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let signal = Signal::new(story_id, gate, outcome, agent);
        let path = self.signal_path(story_id, gate, outcome);
        let json = serde_json::to_string_pretty(&signal).map_err(|source| {
            SignalIoError::Serialize {
                path: path.clone(),
                source,
            }
        })?;

        // Write then rename so a reader never sees a partial record.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| SignalIoError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| SignalIoError::Write {
            path: path.clone(),
            source,
        })?;

        debug!(story_id, gate = %gate, outcome = %outcome, path = %path.display(), "Recorded signal");
        Ok(signal)
    }

    /// Every signal recorded for `story_id`, ordered by gate then outcome.
    pub fn history(&self, story_id: &str) -> Result<Vec<Signal>, SignalIoError> {
        let mut signals = Vec::new();
        for gate in Gate::ALL {
            for outcome in [Outcome::Passed, Outcome::Failed] {
                let path = self.signal_path(story_id, gate, outcome);
                if let Some(signal) = self.read(&path)? {
                    signals.push(signal);
                }
            }
        }
        Ok(signals)
    }

    fn read(&self, path: &Path) -> Result<Option<Signal>, SignalIoError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SignalIoError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| SignalIoError::Serialize {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Map characters that are unsafe in file names to `_`.
fn file_safe(story_id: &str) -> String {
    story_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_store() -> (SignalStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = SignalStore::new(dir.path().join("signals"));
        (store, dir)
    }

    #[test]
    fn test_has_passed_on_empty_store() {
        let (store, _dir) = make_store();
        assert!(!store.has_passed("AUTH-001", Gate::Gate0).unwrap());
        // Checking must not create the directory
        assert!(!store.dir().exists());
    }

    #[test]
    fn test_record_creates_directory_and_file() {
        let (store, _dir) = make_store();
        let signal = store
            .record("AUTH-001", Gate::Gate1, Outcome::Passed, AgentRole::Research)
            .unwrap();
        assert!(signal.is_passed());
        assert!(store.dir().is_dir());
        assert!(
            store
                .signal_path("AUTH-001", Gate::Gate1, Outcome::Passed)
                .ends_with("AUTH-001-gate1-passed.json")
        );
        assert!(store.has_passed("AUTH-001", Gate::Gate1).unwrap());
        assert!(!store.has_passed("AUTH-001", Gate::Gate2).unwrap());
    }

    #[test]
    fn test_failed_signal_does_not_count_as_passed() {
        let (store, _dir) = make_store();
        store
            .record("AUTH-001", Gate::Gate3, Outcome::Failed, AgentRole::Qa)
            .unwrap();
        assert!(!store.has_passed("AUTH-001", Gate::Gate3).unwrap());
    }

    #[test]
    fn test_repeated_record_overwrites() {
        let (store, _dir) = make_store();
        let first = store
            .record("AUTH-001", Gate::Gate3, Outcome::Failed, AgentRole::Qa)
            .unwrap();
        let second = store
            .record("AUTH-001", Gate::Gate3, Outcome::Failed, AgentRole::Qa)
            .unwrap();
        let history = store.history("AUTH-001").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].timestamp, second.timestamp);
        assert!(history[0].timestamp >= first.timestamp);
    }

    #[test]
    fn test_history_is_ordered_and_scoped_to_story() {
        let (store, _dir) = make_store();
        store
            .record("AUTH-001", Gate::Gate2, Outcome::Passed, AgentRole::BackendDev)
            .unwrap();
        store
            .record("AUTH-001", Gate::Gate0, Outcome::Passed, AgentRole::Research)
            .unwrap();
        store
            .record("AUTH-001", Gate::Gate2, Outcome::Failed, AgentRole::BackendDev)
            .unwrap();
        store
            .record("AUTH-002", Gate::Gate0, Outcome::Passed, AgentRole::Research)
            .unwrap();

        let history = store.history("AUTH-001").unwrap();
        let keys: Vec<(Gate, Outcome)> = history.iter().map(|s| (s.gate, s.outcome)).collect();
        assert_eq!(
            keys,
            vec![
                (Gate::Gate0, Outcome::Passed),
                (Gate::Gate2, Outcome::Passed),
                (Gate::Gate2, Outcome::Failed),
            ]
        );
    }

    #[test]
    fn test_signals_survive_new_store_instance() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("signals");
        {
            let store = SignalStore::new(path.clone());
            store
                .record("AUTH-001", Gate::Gate0, Outcome::Passed, AgentRole::Research)
                .unwrap();
        }
        let store = SignalStore::new(path);
        assert!(store.has_passed("AUTH-001", Gate::Gate0).unwrap());
    }

    #[test]
    fn test_unwritable_directory_is_signal_error() {
        let dir = tempdir().unwrap();
        // A regular file where the signal directory should be
        let blocker = dir.path().join("signals");
        fs::write(&blocker, "not a directory").unwrap();
        let store = SignalStore::new(blocker);
        let err = store
            .record("AUTH-001", Gate::Gate0, Outcome::Passed, AgentRole::Research)
            .unwrap_err();
        assert!(matches!(err, SignalIoError::CreateDir { .. }));
    }

    #[test]
    fn test_file_safe_story_ids() {
        assert_eq!(file_safe("AUTH-001"), "AUTH-001");
        assert_eq!(file_safe("a/b c"), "a_b_c");
    }
}
