//! Deduplication guard — time-windowed suppression of repeated audit writes.
//!
//! Redundant triggers (a generic update hook and a specific business-event
//! hook firing for the same logical change) would otherwise write the same
//! record twice in quick succession. The guard keys each write by subject,
//! kind, and canonical properties; an identical key seen within the trailing
//! window is suppressed and the prior record returned instead.
//!
//! This is a process-local, best-effort mechanism. Two workers in separate
//! processes can each pass their own guard within the window and write twice;
//! callers needing cross-process suppression must move the key map into a
//! shared expiring store.

use std::{collections::HashMap, sync::Mutex};

use chrono::{DateTime, Duration, Utc};
use chronicle_core::{activity::ActivityKind, subject::SubjectRef};
use sha2::{Digest, Sha256};

/// Trailing window, in seconds, within which an identical write is
/// suppressed. One global knob; per-kind windows are deliberately not a
/// thing.
pub const DEFAULT_DEDUP_WINDOW_SECS: i64 = 5;

/// SHA-256 over the write's identity-defining parts.
pub type DedupKey = [u8; 32];

/// Derive the guard key for a prospective write.
///
/// `properties` is hashed via its `serde_json` string form; `serde_json`
/// maps serialise with sorted keys, so equal payloads hash equal regardless
/// of construction order. Different diffs for the same subject and kind
/// produce different keys and are never suppressed against each other.
pub fn dedup_key(
  subject: SubjectRef,
  kind: ActivityKind,
  properties: &serde_json::Value,
) -> DedupKey {
  let mut hasher = Sha256::new();
  hasher.update(subject.kind.tag().as_bytes());
  hasher.update(subject.id.as_bytes());
  hasher.update(kind.tag().as_bytes());
  hasher.update(properties.to_string().as_bytes());
  hasher.finalize().into()
}

// ─── Guard ───────────────────────────────────────────────────────────────────

/// Entries beyond this count trigger a purge of expired keys on the next
/// mark, bounding growth in a long-lived process.
const PURGE_THRESHOLD: usize = 1024;

/// Process-local map from dedup key to the instant of its last write.
pub struct DedupGuard {
  window:  Duration,
  entries: Mutex<HashMap<DedupKey, DateTime<Utc>>>,
}

impl DedupGuard {
  pub fn new(window: Duration) -> Self {
    Self {
      window,
      entries: Mutex::new(HashMap::new()),
    }
  }

  pub fn with_default_window() -> Self {
    Self::new(Duration::seconds(DEFAULT_DEDUP_WINDOW_SECS))
  }

  pub fn window(&self) -> Duration { self.window }

  /// True if `key` was marked within the trailing window ending at `now`.
  pub fn recently_marked(&self, key: &DedupKey, now: DateTime<Utc>) -> bool {
    self
      .entries
      .lock()
      .expect("dedup guard poisoned")
      .get(key)
      .is_some_and(|last| now.signed_duration_since(*last) < self.window)
  }

  /// Record a write for `key` at `now`.
  pub fn mark(&self, key: DedupKey, now: DateTime<Utc>) {
    let mut entries = self.entries.lock().expect("dedup guard poisoned");
    if entries.len() >= PURGE_THRESHOLD {
      entries.retain(|_, last| now.signed_duration_since(*last) < self.window);
    }
    entries.insert(key, now);
  }

  #[cfg(test)]
  fn len(&self) -> usize {
    self.entries.lock().expect("dedup guard poisoned").len()
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
