use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::debug;

use crate::core::corpus::{sort_canonical, Corpus, CorpusEntry};
use crate::core::error::{Result, SketchError};
use crate::core::segment::Segment;

/// Snapshot cell holding the current corpus of every series kind.
///
/// Readers clone an `Arc<Corpus>` and rank against it for as long as they
/// like; writers build a complete replacement and swap the pointer. A query
/// never observes a partially updated matrix.
///
/// Writers are serialized by `writer`. The snapshot map itself is only
/// write-locked for the pointer swap, never while a replacement is built.
#[derive(Debug, Default)]
pub struct CorpusStore {
    snapshots: RwLock<HashMap<String, Arc<Corpus>>>,
    writer: Mutex<()>,
}

impl CorpusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot for `kind`.
    pub fn snapshot(&self, kind: &str) -> Option<Arc<Corpus>> {
        let guard = self.snapshots.read().unwrap_or_else(|e| e.into_inner());
        guard.get(kind).cloned()
    }

    /// Replace the whole corpus of `corpus.kind()`, returning the previous snapshot.
    pub fn replace(&self, corpus: Corpus) -> Option<Arc<Corpus>> {
        let kind = corpus.kind().to_string();
        debug!(kind = %kind, rows = corpus.len(), "swapping corpus snapshot");
        let _writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        self.swap(kind, Arc::new(corpus))
    }

    /// Replace every row of one series within `kind` by `segments`.
    ///
    /// Previously stored rows of `series_id` are dropped before the new ones
    /// are added, so rebuilding a series twice leaves the same corpus. Segments
    /// of another kind or series are ignored.
    ///
    /// # Errors
    /// `LengthMismatch` if the new vectors do not match the corpus width.
    pub fn replace_series(
        &self,
        kind: &str,
        series_id: &str,
        segments: impl IntoIterator<Item = Segment>,
    ) -> Result<Arc<Corpus>> {
        let _writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());

        let mut entries: Vec<CorpusEntry> = match self.snapshot(kind) {
            Some(current) => current.entries().filter(|e| e.id != series_id).collect(),
            None => Vec::new(),
        };
        let kept = entries.len();
        entries.extend(
            segments
                .into_iter()
                .filter(|s| s.kind == kind && s.series_id == series_id)
                .map(CorpusEntry::from),
        );
        let added = entries.len() - kept;

        if kept > 0 {
            let width = entries[0].vector.len();
            if let Some(bad) = entries[kept..].iter().find(|e| e.vector.len() != width) {
                return Err(SketchError::LengthMismatch {
                    context: "replacement segment width",
                    expected: width,
                    got: bad.vector.len(),
                });
            }
        }

        sort_canonical(&mut entries);
        let corpus = Arc::new(Corpus::from_entries(kind.to_string(), entries)?);
        debug!(kind, series_id, kept, added, "replaced series rows");
        self.swap(kind.to_string(), Arc::clone(&corpus));
        Ok(corpus)
    }

    /// Drop the corpus of `kind`.
    pub fn remove(&self, kind: &str) -> Option<Arc<Corpus>> {
        let _writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let mut guard = self.snapshots.write().unwrap_or_else(|e| e.into_inner());
        guard.remove(kind)
    }

    fn swap(&self, kind: String, corpus: Arc<Corpus>) -> Option<Arc<Corpus>> {
        let mut guard = self.snapshots.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(kind, corpus)
    }

    /// Kinds currently held, sorted.
    pub fn kinds(&self) -> Vec<String> {
        let guard = self.snapshots.read().unwrap_or_else(|e| e.into_inner());
        let mut kinds: Vec<String> = guard.keys().cloned().collect();
        kinds.sort();
        kinds
    }
}
