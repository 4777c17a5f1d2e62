// This module defines error types for the target engine using the thiserror crate for
// idiomatic Rust error handling. DecodeError covers every way a persisted target list
// can fail to decode: truncation, a feature-word width that does not match the running
// process's configured width (a hard failure with no partial interpretation), invalid
// name bytes, a base index that does not precede its entry, and trailing garbage.
// Rejection is the matcher's concrete no-match diagnostic naming the first disqualified
// candidate and the feature it needs; it surfaces as a user-facing incompatibility
// message rather than a bare boolean. SessionError wraps both for the image entry
// points. Contract violations (double initialization, matching before initialization)
// are not represented here; those abort the process.

//! Error types for target-list decoding and matching.

use thiserror::Error;

/// Failure decoding a persisted target list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("target list truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("target list was built for {found} feature words, this process uses {expected}")]
    WidthMismatch { expected: u32, found: u32 },

    #[error("target name at entry {index} is not valid UTF-8")]
    InvalidName { index: usize },

    #[error("entry {index} has base {base}, which does not precede it")]
    InvalidBase { index: usize, base: u32 },

    #[error("{len} trailing bytes after target list")]
    TrailingBytes { len: usize },
}

/// Concrete reason the matcher rejected every candidate.
///
/// Carries the first disqualified candidate and a feature it requires that
/// the requesting target does not enable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("target `{candidate}` requires feature `{missing}`, which is not available on this processor")]
pub struct Rejection {
    pub candidate: String,
    pub missing: String,
}

/// Failure initializing from or matching against a persisted image.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("no compatible target in image: {0}")]
    Incompatible(Rejection),
}
