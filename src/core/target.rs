//! Target descriptions and per-target flags.

use bitflags::bitflags;

use crate::core::bitset::FeatureVector;

bitflags! {
    /// Per-target flag word.
    ///
    /// The clone flags mark sensitivity classes that force a function to be
    /// compiled once per target; the remaining flags carry calling-convention
    /// and soft-failure state. The numeric values are part of the serialized
    /// target-list format.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TargetFlags: u32 {
        /// Functions may pass vectors by register at call boundaries, so the
        /// running vector width must match what was compiled.
        const VEC_CALL = 1 << 0;
        /// Clone every function for this target.
        const CLONE_ALL = 1 << 1;
        /// Clone functions containing loops.
        const CLONE_LOOP = 1 << 2;
        /// Clone functions touching the wide-SIMD feature family.
        const CLONE_SIMD = 1 << 3;
        /// Clone functions touching the multiply-add family.
        const CLONE_MATH = 1 << 4;
        /// Clone functions that check CPU features at runtime.
        const CLONE_CPU = 1 << 5;
        /// Clone functions touching the half-precision-float family.
        const CLONE_FLOAT16 = 1 << 6;
        /// Clone functions touching the brain-float16 family.
        const CLONE_BFLOAT16 = 1 << 7;
        /// The requested name did not resolve in the registry. Soft flag;
        /// callers decide whether to treat it as fatal.
        const UNKNOWN_NAME = 1 << 8;
    }
}

/// One instruction-set configuration a code generator may compile against.
///
/// Built by [`resolve_target`](crate::core::resolver::resolve_target) from a
/// requested record, or decoded from a persisted image's target list. Within
/// a list, `base` points at an earlier entry (entry 0 points at itself), so
/// a list forms a forest rooted at the baseline entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetData<const N: usize> {
    /// Microarchitecture name, or a literal unknown spelling.
    pub name: String,
    /// Enabled feature set.
    pub enabled: FeatureVector<N>,
    /// Disabled feature set. For targets resolved from a known name this is
    /// exactly the complement of `enabled` within the recognized bits; for
    /// requests it carries the explicit disables.
    pub disabled: FeatureVector<N>,
    /// Feature tokens the registry does not model, passed to the backend
    /// verbatim, comma separated.
    pub ext_features: String,
    /// Flag word.
    pub flags: TargetFlags,
    /// Index of the target this one is layered over, within its list.
    pub base: usize,
}

impl<const N: usize> TargetData<N> {
    /// A tokenized request record: name plus explicit enable/disable bits.
    pub fn request(name: &str, enable: &[u32], disable: &[u32], ext_features: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: FeatureVector::with_bits(enable),
            disabled: FeatureVector::with_bits(disable),
            ext_features: ext_features.to_string(),
            flags: TargetFlags::empty(),
            base: 0,
        }
    }

    /// True when the resolved name was not found in the registry.
    pub fn has_unknown_name(&self) -> bool {
        self.flags.contains(TargetFlags::UNKNOWN_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_sets_bits() {
        let t: TargetData<2> = TargetData::request("haswell", &[1, 40], &[2], "+custom");
        assert_eq!(t.name, "haswell");
        assert!(t.enabled.test(1) && t.enabled.test(40));
        assert!(t.disabled.test(2));
        assert_eq!(t.ext_features, "+custom");
        assert_eq!(t.flags, TargetFlags::empty());
        assert_eq!(t.base, 0);
    }

    #[test]
    fn test_flag_bits_are_stable() {
        // Serialized images depend on these values.
        assert_eq!(TargetFlags::VEC_CALL.bits(), 1);
        assert_eq!(TargetFlags::CLONE_ALL.bits(), 2);
        assert_eq!(TargetFlags::CLONE_LOOP.bits(), 4);
        assert_eq!(TargetFlags::CLONE_SIMD.bits(), 8);
        assert_eq!(TargetFlags::CLONE_MATH.bits(), 16);
        assert_eq!(TargetFlags::CLONE_CPU.bits(), 32);
        assert_eq!(TargetFlags::CLONE_FLOAT16.bits(), 64);
        assert_eq!(TargetFlags::CLONE_BFLOAT16.bits(), 128);
        assert_eq!(TargetFlags::UNKNOWN_NAME.bits(), 256);
    }
}
