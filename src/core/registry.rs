// This module holds the static-table side of the engine: the feature registry (name,
// flat bit index, minimum toolchain version that recognizes the bit), the
// microarchitecture spec registry (canonical name, numeric id, fallback id, minimum
// toolchain version, baseline feature vector) and the ArchTables bundle that packages
// every architecture-supplied table behind one immutable reference. ArchTables is the
// seam between the architecture-agnostic engine and the per-architecture data: the
// resolver, clone-decision engine, matcher and backend handoff all consume it and
// nothing else, so every algorithm in core/ can be exercised against a toy table set.
// Lookup is exact-match only; a small alias table rewrites legacy spellings to
// canonical names before lookup, and the toolchain fallback walk renames a spec down
// its fallback chain until the active toolchain recognizes it.

//! Feature and microarchitecture registries.

use crate::core::bitset::{FeatureDep, FeatureVector};

/// One named feature bit.
#[derive(Clone, Copy, Debug)]
pub struct FeatureName {
    /// Canonical feature name as the backend spells it.
    pub name: &'static str,
    /// Flat bit index into the feature vector.
    pub bit: u32,
    /// Minimum toolchain version that recognizes this bit; 0 means always.
    pub min_toolchain: u32,
}

impl FeatureName {
    pub const fn new(name: &'static str, bit: u32, min_toolchain: u32) -> Self {
        Self {
            name,
            bit,
            min_toolchain,
        }
    }
}

/// One named microarchitecture.
#[derive(Clone, Copy, Debug)]
pub struct CpuSpec<const N: usize> {
    /// Canonical microarchitecture name.
    pub name: &'static str,
    /// Numeric id, unique within the table.
    pub id: u32,
    /// Id to fall back to when `min_toolchain` exceeds the active toolchain.
    /// Fallback chains are finite and end at a spec with version 0.
    pub fallback: u32,
    /// Minimum toolchain version that knows this microarchitecture by name.
    pub min_toolchain: u32,
    /// Features the microarchitecture is assumed to support.
    pub features: FeatureVector<N>,
}

impl<const N: usize> CpuSpec<N> {
    pub const fn new(
        name: &'static str,
        id: u32,
        fallback: u32,
        min_toolchain: u32,
        features: FeatureVector<N>,
    ) -> Self {
        Self {
            name,
            id,
            fallback,
            min_toolchain,
            features,
        }
    }
}

/// Host identity as the engine sees it: the detected microarchitecture name
/// and the gated host feature vector.
#[derive(Clone, Debug)]
pub struct HostInfo<const N: usize> {
    pub name: String,
    pub features: FeatureVector<N>,
}

/// Everything an architecture supplies to the engine.
///
/// All tables are static data, loaded once and never mutated.
pub struct ArchTables<'a, const N: usize> {
    /// Feature name/bit/version table. Bit indices and names are unique.
    pub features: &'a [FeatureName],
    /// Dependency pairs; the graph is acyclic.
    pub deps: &'a [FeatureDep],
    /// Microarchitecture table; ids and names are unique.
    pub cpus: &'a [CpuSpec<N>],
    /// Legacy/alternate spelling rewrites applied before name lookup.
    pub aliases: &'a [(&'a str, &'a str)],
    /// Mask of every bit the feature table recognizes.
    pub known: FeatureVector<N>,
    /// Globally-excluded bits the backend never benefits from.
    pub deny: FeatureVector<N>,
    /// Multiply-add family for the clone decision.
    pub clone_math: FeatureVector<N>,
    /// Wide-SIMD family for the clone decision.
    pub clone_simd: FeatureVector<N>,
    /// Half-precision-float family for the clone decision.
    pub clone_fp16: FeatureVector<N>,
    /// Brain-float16 family for the clone decision.
    pub clone_bf16: FeatureVector<N>,
    /// Outlier microarchitectures that always clone everything when layered
    /// over a non-outlier base.
    pub clone_all_names: &'a [&'a str],
    /// Feature group cleared when narrowing below 64-byte vectors.
    pub width64_group: FeatureVector<N>,
    /// Feature group cleared when narrowing below 32-byte vectors.
    pub width32_group: FeatureVector<N>,
    /// Witness bit implying 64-byte vector registers.
    pub vec64_bit: u32,
    /// Witness bit implying 32-byte vector registers.
    pub vec32_bit: u32,
    /// Minimum guaranteed vector width in bytes.
    pub min_vector_width: u32,
    /// Portability-floor bit every image is assumed to require unless an
    /// image entry explicitly goes without it.
    pub floor_bit: Option<u32>,
    /// Name of the featureless baseline target.
    pub generic_name: &'a str,
    /// What the backend calls the featureless baseline target.
    pub backend_generic_name: &'a str,
    /// Baseline feature tokens always appended to backend strings.
    pub base_tokens: &'a [&'a str],
    /// Version of the toolchain this process drives.
    pub toolchain_version: u32,
}

impl<'a, const N: usize> ArchTables<'a, N> {
    /// Canonical name for a legacy spelling; `None` when not aliased.
    pub fn normalize_name(&self, name: &str) -> Option<&'a str> {
        self.aliases
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, canonical)| *canonical)
    }

    /// Exact-match spec lookup by canonical name.
    pub fn find_cpu(&self, name: &str) -> Option<&'a CpuSpec<N>> {
        self.cpus.iter().find(|spec| spec.name == name)
    }

    /// Spec lookup by numeric id.
    pub fn find_cpu_by_id(&self, id: u32) -> Option<&'a CpuSpec<N>> {
        self.cpus.iter().find(|spec| spec.id == id)
    }

    /// Canonical name of a microarchitecture id, or the generic name for an
    /// id the table does not carry.
    pub fn cpu_name(&self, id: u32) -> &'a str {
        self.find_cpu_by_id(id)
            .map(|spec| spec.name)
            .unwrap_or(self.generic_name)
    }

    /// Bit index of a feature name, exact match.
    pub fn find_feature_bit(&self, name: &str) -> Option<u32> {
        self.features
            .iter()
            .find(|feature| feature.name == name)
            .map(|feature| feature.bit)
    }

    /// Name of a feature bit, if the registry carries it.
    pub fn feature_name(&self, bit: u32) -> Option<&'static str> {
        self.features
            .iter()
            .find(|feature| feature.bit == bit)
            .map(|feature| feature.name)
    }

    /// Walk the fallback chain until the spec is known to `toolchain`.
    ///
    /// This affects only the name handed to the backend, never the feature
    /// computation. `None` means the name is not a table entry and the
    /// literal spelling travels as-is.
    pub fn compatible_cpu_name(&self, name: &str, toolchain: u32) -> Option<&'a str> {
        let mut spec = self.find_cpu(name)?;
        while spec.min_toolchain > toolchain {
            match self.find_cpu_by_id(spec.fallback) {
                Some(fallback) => spec = fallback,
                None => break,
            }
        }
        Some(spec.name)
    }

    /// Vector width in bytes implied by a feature set.
    pub fn vector_width(&self, features: &FeatureVector<N>) -> u32 {
        if features.test(self.vec64_bit) {
            64
        } else if features.test(self.vec32_bit) {
            32
        } else {
            self.min_vector_width
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Tiny two-word architecture used by engine unit tests.
    ///
    /// Bits: 0 base, 1 simd32 (implies 0), 2 simd64 (implies 1), 3 muladd
    /// (implies 1), 4 denied, 5 gated-new feature, 33 fp16 (implies 2).
    pub const TOY_FEATURES: &[FeatureName] = &[
        FeatureName::new("base", 0, 0),
        FeatureName::new("simd32", 1, 0),
        FeatureName::new("simd64", 2, 0),
        FeatureName::new("muladd", 3, 0),
        FeatureName::new("denied", 4, 0),
        FeatureName::new("newfeat", 5, 90),
        FeatureName::new("fp16", 33, 0),
    ];

    pub const TOY_DEPS: &[FeatureDep] = &[
        FeatureDep::new(1, 0),
        FeatureDep::new(2, 1),
        FeatureDep::new(3, 1),
        FeatureDep::new(33, 2),
    ];

    pub const TOY_CPUS: &[CpuSpec<2>] = &[
        CpuSpec::new("toy-generic", 0, 0, 0, FeatureVector::with_bits(&[0])),
        CpuSpec::new("toy-simd", 1, 0, 0, FeatureVector::with_bits(&[0, 1])),
        CpuSpec::new(
            "toy-wide",
            2,
            1,
            50,
            FeatureVector::with_bits(&[0, 1, 2, 3]),
        ),
        CpuSpec::new(
            "toy-fp16",
            3,
            2,
            80,
            FeatureVector::with_bits(&[0, 1, 2, 3, 33]),
        ),
        CpuSpec::new("toy-odd", 4, 0, 0, FeatureVector::with_bits(&[0, 1, 3])),
    ];

    pub fn toy_tables() -> ArchTables<'static, 2> {
        ArchTables {
            features: TOY_FEATURES,
            deps: TOY_DEPS,
            cpus: TOY_CPUS,
            aliases: &[("toy", "toy-generic"), ("wide", "toy-wide")],
            known: FeatureVector::with_bits(&[0, 1, 2, 3, 4, 5, 33]),
            deny: FeatureVector::with_bits(&[4]),
            clone_math: FeatureVector::with_bits(&[3]),
            clone_simd: FeatureVector::with_bits(&[1, 2]),
            clone_fp16: FeatureVector::with_bits(&[33]),
            clone_bf16: FeatureVector::new(),
            clone_all_names: &["toy-odd"],
            width64_group: FeatureVector::with_bits(&[2, 33]),
            width32_group: FeatureVector::with_bits(&[1]),
            vec64_bit: 2,
            vec32_bit: 1,
            min_vector_width: 16,
            floor_bit: Some(0),
            generic_name: "toy-generic",
            backend_generic_name: "toy-base",
            base_tokens: &["+always"],
            toolchain_version: 60,
        }
    }

    #[test]
    fn test_alias_rewrite_before_lookup() {
        let tables = toy_tables();
        assert_eq!(tables.normalize_name("toy"), Some("toy-generic"));
        assert_eq!(tables.normalize_name("toy-simd"), None);
        assert!(tables.find_cpu("toy").is_none(), "lookup is exact match");
        assert!(tables.find_cpu("toy-generic").is_some());
    }

    #[test]
    fn test_fallback_walk_stops_at_known_version() {
        let tables = toy_tables();
        // toy-fp16 needs 80, toy-wide needs 50; at toolchain 60 the walk
        // lands on toy-wide, at 40 it continues to toy-simd.
        assert_eq!(
            tables.compatible_cpu_name("toy-fp16", 100),
            Some("toy-fp16")
        );
        assert_eq!(tables.compatible_cpu_name("toy-fp16", 60), Some("toy-wide"));
        assert_eq!(tables.compatible_cpu_name("toy-fp16", 40), Some("toy-simd"));
        assert_eq!(tables.compatible_cpu_name("toy-simd", 0), Some("toy-simd"));
        assert_eq!(tables.compatible_cpu_name("nonesuch", 0), None);
    }

    #[test]
    fn test_vector_width_witness_bits() {
        let tables = toy_tables();
        assert_eq!(tables.vector_width(&FeatureVector::with_bits(&[0])), 16);
        assert_eq!(tables.vector_width(&FeatureVector::with_bits(&[0, 1])), 32);
        assert_eq!(
            tables.vector_width(&FeatureVector::with_bits(&[0, 1, 2])),
            64
        );
    }

    #[test]
    fn test_feature_bit_lookup_roundtrip() {
        let tables = toy_tables();
        assert_eq!(tables.find_feature_bit("fp16"), Some(33));
        assert_eq!(tables.feature_name(33), Some("fp16"));
        assert_eq!(tables.find_feature_bit("FP16"), None);
    }
}
