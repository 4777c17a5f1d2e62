// This module implements the clone-flag decision engine that drives multiversioning.
// Given an ordered list of resolved targets whose entry 0 is the shared baseline, it
// annotates every later entry with the sensitivity classes that force functions to be
// compiled once per target. Two flags are unconditional for every specialized entry:
// clone-on-cpu-check (any feature-guarded code path may need a runtime dispatch) and
// clone-loops (loop bodies are the highest-value vectorization-sensitive unit). A pair
// of outlier microarchitectures is different enough that partial specialization is not
// modeled at all; layering one of them over a non-outlier base forces clone-everything.
// Otherwise four disjoint feature families (multiply-add, wide SIMD, half-precision
// float, brain float16) are tested independently against the entry's base target and
// accumulate their own clone flags. This exact procedure is shared between building
// the live process's target list and building a precompiled image's embedded list;
// the two images must agree on what got cloned, so both call sites funnel here.

//! Clone-flag decisions over a resolved target list.

use crate::core::registry::ArchTables;
use crate::core::target::{TargetData, TargetFlags};

/// Annotate every non-baseline entry with its clone flags.
///
/// Entry 0 is the baseline and is never annotated. Panics when the list
/// violates the forest invariant (an entry's base must precede it).
pub fn annotate_clone_flags<const N: usize>(
    tables: &ArchTables<'_, N>,
    targets: &mut [TargetData<N>],
) {
    for i in 1..targets.len() {
        assert!(
            targets[i].base < i,
            "target {i} has base {} out of order",
            targets[i].base
        );
        if targets[i].flags.contains(TargetFlags::CLONE_ALL) {
            continue;
        }
        // Always clone when code checks CPU features, and clone the loops;
        // those two pay for themselves on every specialization.
        let mut flags = targets[i].flags | TargetFlags::CLONE_CPU | TargetFlags::CLONE_LOOP;

        let base = targets[i].base;
        let base_name_is_outlier = is_outlier(tables, &targets[base].name);
        if is_outlier(tables, &targets[i].name) && !base_name_is_outlier {
            targets[i].flags = flags | TargetFlags::CLONE_ALL;
            continue;
        }

        let fresh = targets[i].enabled.difference(targets[base].enabled);
        for (group, flag) in [
            (tables.clone_math, TargetFlags::CLONE_MATH),
            (tables.clone_simd, TargetFlags::CLONE_SIMD),
            (tables.clone_fp16, TargetFlags::CLONE_FLOAT16),
            (tables.clone_bf16, TargetFlags::CLONE_BFLOAT16),
        ] {
            if !(fresh & group).is_empty() {
                flags |= flag;
            }
        }
        targets[i].flags = flags;
        log::debug!(
            "target {i} `{}` over `{}`: clone flags {:?}",
            targets[i].name,
            targets[base].name,
            targets[i].flags
        );
    }
}

fn is_outlier<const N: usize>(tables: &ArchTables<'_, N>, name: &str) -> bool {
    tables.clone_all_names.contains(&name)
}
