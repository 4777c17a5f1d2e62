//! Target-list matching: pick the best compatible precompiled variant.
//!
//! A candidate qualifies when its enabled set is a subset of the requesting
//! target's enabled set; running it can then never hit an instruction the
//! host did not agree to. Among qualifying candidates the one with the most
//! enabled bits wins, earliest list position breaking ties, which makes the
//! choice deterministic even for incomparable feature sets.

use crate::core::error::Rejection;
use crate::core::registry::ArchTables;
use crate::core::target::{TargetData, TargetFlags};

/// Outcome of matching a candidate list against one requesting target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    /// Index of the best qualifying candidate, or `None` when nothing
    /// qualifies.
    pub best: Option<usize>,
    /// Vector width in bytes implied by the matched entry's feature set.
    /// Minimum width when nothing matched.
    pub vector_width: u32,
    /// Why the first disqualified candidate was rejected; present only when
    /// nothing qualifies.
    pub rejection: Option<Rejection>,
}

/// Match `candidates` (a persisted image's target list) against the resolved
/// `request` (the running target).
pub fn match_targets<const N: usize>(
    tables: &ArchTables<'_, N>,
    candidates: &[TargetData<N>],
    request: &TargetData<N>,
) -> MatchResult {
    let mut best: Option<usize> = None;
    let mut best_count = 0u32;
    let mut rejection = None;
    for (i, candidate) in candidates.iter().enumerate() {
        if let Some(bit) = candidate.enabled.first_missing_in(&request.enabled) {
            log::trace!("candidate {i} `{}` disqualified", candidate.name);
            if rejection.is_none() {
                let missing = tables
                    .feature_name(bit)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("bit {bit}"));
                rejection = Some(Rejection {
                    candidate: candidate.name.clone(),
                    missing,
                });
            }
            continue;
        }
        // Most specific qualifying candidate wins; strict comparison keeps
        // the earliest entry on equal popcount.
        let count = candidate.enabled.count();
        if best.is_none() || count > best_count {
            best = Some(i);
            best_count = count;
        }
    }
    match best {
        Some(i) => {
            log::debug!(
                "matched candidate {i} `{}` ({best_count} features)",
                candidates[i].name
            );
            MatchResult {
                best: Some(i),
                vector_width: tables.vector_width(&candidates[i].enabled),
                rejection: None,
            }
        }
        None => MatchResult {
            best: None,
            vector_width: tables.min_vector_width,
            rejection,
        },
    }
}

/// Reconcile the running target's vector width with the matched entry.
///
/// When the matched entry was compiled with vector registers at call
/// boundaries and implies a narrower width than the requester's own feature
/// set, the requester's live set is narrowed, widest group first, so the
/// call-boundary ABI stays consistent with what was actually compiled.
pub fn reconcile_width<const N: usize>(
    tables: &ArchTables<'_, N>,
    matched: &TargetData<N>,
    matched_width: u32,
    request: &mut TargetData<N>,
) {
    if matched_width == tables.vector_width(&request.enabled) {
        return;
    }
    if !matched.flags.contains(TargetFlags::VEC_CALL) {
        return;
    }
    if matched_width < 64 {
        request.enabled = request.enabled.difference(tables.width64_group);
    }
    if matched_width < 32 {
        request.enabled = request.enabled.difference(tables.width32_group);
    }
    log::debug!(
        "narrowed running target `{}` to {matched_width}-byte vectors",
        request.name
    );
}
