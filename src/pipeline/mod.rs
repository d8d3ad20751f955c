//! Pipeline stages for memo generation.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! deck ──▶ extract ──▶ (prompt) ──▶ llm ──▶ postprocess ──▶ render
//! (upload/path/URL) (pdf-extract)  (provider) (cleanup)    (PDF bytes)
//! ```
//!
//! 1. [`deck`]    — resolve the pitch deck to bytes, enforcing the size bound
//! 2. [`extract`] — pull and truncate page text; runs in `spawn_blocking`
//!    because `pdf-extract` is CPU-bound and may panic
//! 3. [`llm`]     — the single completion call; the only stage with provider
//!    network I/O
//! 4. [`postprocess`] — deterministic, idempotent text cleanup
//! 5. [`render`]  — punctuation normalisation and PDF layout

pub mod deck;
pub mod extract;
pub mod llm;
pub mod postprocess;
pub mod render;
