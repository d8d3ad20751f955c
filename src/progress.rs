//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn MemoProgressCallback>`] via
//! [`crate::config::MemoConfigBuilder::progress_callback`] to learn when each
//! stage starts and finishes, and when the pitch deck had to be skipped.
//!
//! # Example
//!
//! ```rust
//! use ic_memo::{MemoConfig, MemoProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     finished: AtomicUsize,
//! }
//!
//! impl MemoProgressCallback for CountingCallback {
//!     fn on_stage_complete(&self, _stage: Stage, _elapsed_ms: u64) {
//!         self.finished.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { finished: AtomicUsize::new(0) });
//! let config = MemoConfig::builder()
//!     .progress_callback(cb as Arc<dyn MemoProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::DeckWarning;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One step of the generation pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    ReadDeck,
    BuildPrompt,
    Complete,
    Clean,
    RenderPdf,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::ReadDeck => "Reading pitch deck",
            Stage::BuildPrompt => "Building prompt",
            Stage::Complete => "Writing IC memo",
            Stage::Clean => "Cleaning memo text",
            Stage::RenderPdf => "Rendering PDF",
        };
        f.write_str(label)
    }
}

/// Called by the pipeline as it moves through each [`Stage`].
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait MemoProgressCallback: Send + Sync {
    /// Called just before a stage runs.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finished successfully.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when the deck was skipped; the memo relies on written inputs.
    fn on_deck_degraded(&self, warning: &DeckWarning) {
        let _ = warning;
    }

    /// Called once after the memo and both artifacts are ready.
    ///
    /// * `word_count` — words in the cleaned memo
    fn on_memo_complete(&self, word_count: usize) {
        let _ = word_count;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl MemoProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::MemoConfig`].
pub type ProgressCallback = Arc<dyn MemoProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCallback {
        events: Mutex<Vec<String>>,
    }

    impl MemoProgressCallback for RecordingCallback {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage:?}"));
        }

        fn on_deck_degraded(&self, _warning: &DeckWarning) {
            self.events.lock().unwrap().push("degraded".into());
        }

        fn on_memo_complete(&self, word_count: usize) {
            self.events.lock().unwrap().push(format!("done {word_count}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::ReadDeck);
        cb.on_stage_complete(Stage::ReadDeck, 3);
        cb.on_deck_degraded(&DeckWarning::NoText { name: "deck.pdf".into() });
        cb.on_memo_complete(120);
    }

    #[test]
    fn recording_callback_receives_events_in_order() {
        let cb = RecordingCallback::default();
        cb.on_stage_start(Stage::ReadDeck);
        cb.on_deck_degraded(&DeckWarning::TooLarge {
            size_bytes: 11,
            limit_bytes: 10,
        });
        cb.on_stage_complete(Stage::ReadDeck, 1);
        cb.on_memo_complete(42);

        let events = cb.events.lock().unwrap();
        assert_eq!(*events, vec!["start ReadDeck", "degraded", "done 42"]);
    }

    #[test]
    fn stage_labels_are_human_readable() {
        assert_eq!(Stage::Complete.to_string(), "Writing IC memo");
    }
}
