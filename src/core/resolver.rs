//! Per-target resolution: requested record to finalized feature sets.
//!
//! Resolution is a fixed sequence of steps whose order matters; each step
//! feeds the next. There is no failure outcome: an unrecognized name is
//! carried as a soft flag and an empty baseline, and the caller decides
//! policy.

use crate::core::bitset::{disable_depends, enable_depends};
use crate::core::registry::{ArchTables, HostInfo};
use crate::core::target::{TargetData, TargetFlags};

/// Resolve one requested target into finalized enabled/disabled sets.
///
/// Steps, in order:
/// 1. Bind the name to a baseline: `"native"` binds to the host vector and
///    detected name, a registry hit binds to that spec's baseline, a miss
///    keeps the literal name with an empty baseline and the unknown flag.
/// 2. Union the explicit enables over the baseline, then close prerequisites
///    forward.
/// 3. Clear the global deny list.
/// 4. Subtract the explicit disables.
/// 5. When `clamp_to_host` is set, intersect with the host vector.
/// 6. Close prerequisites backward; steps 3-5 may have broken a chain.
/// 7. For known names, recompute the disabled set as the complement of the
///    enabled set within the recognized bits.
pub fn resolve_target<const N: usize>(
    tables: &ArchTables<'_, N>,
    host: &HostInfo<N>,
    request: &TargetData<N>,
    clamp_to_host: bool,
) -> TargetData<N> {
    let mut res = request.clone();
    let mut baseline = None;
    if res.name == "native" {
        res.name = host.name.clone();
        baseline = Some(host.features);
    } else if let Some(spec) = tables.find_cpu(&res.name) {
        baseline = Some(spec.features);
    } else {
        res.flags |= TargetFlags::UNKNOWN_NAME;
    }

    if let Some(base) = baseline {
        res.enabled |= base;
    }
    enable_depends(&mut res.enabled, tables.deps);
    res.enabled = res.enabled.difference(tables.deny);
    res.enabled = res.enabled.difference(res.disabled);
    if clamp_to_host {
        res.enabled &= host.features;
    }
    disable_depends(&mut res.enabled, tables.deps);

    if baseline.is_some() {
        res.disabled = tables.known.difference(res.enabled);
    }

    log::debug!(
        "resolved target `{}`: {} features enabled{}{}",
        res.name,
        res.enabled.count(),
        if clamp_to_host { " (clamped to host)" } else { "" },
        if res.has_unknown_name() {
            " (unknown name)"
        } else {
            ""
        },
    );
    res
}
