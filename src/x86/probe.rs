// This module adapts raw hardware capability probes into the engine's host feature
// vector. A CapabilityProbe supplies the two external collaborators: the (leaf,
// subleaf) register query and the narrow extended-state-component mask query. From
// those the adapter derives vendor/family/model (applying the vendor-defined
// family/model widening rule before any lookup), fills the twelve feature words from a
// fixed leaf sequence (absent leaves leave their word zero - that mapping is the
// stable contract with the feature registry and the serialized format), applies the
// three all-or-nothing extended-state gates (AVX requires the save-enabled bit plus
// the SSE+YMM components; AVX-512 additionally the opmask/ZMM components, waived on
// Darwin which saves that state lazily on first use; AMX its own two tile components),
// masks away bits the registry does not recognize, and classifies the result into a
// named microarchitecture. Detection never fails: unknown hardware degrades to the
// generic id. The process-wide result is computed once behind a synchronized
// initializer and immutable afterwards.

//! Host capability probing and the memoized process-wide result.

use std::sync::OnceLock;

use crate::x86::classify::{classify, Vendor};
use crate::x86::cpus::Cpu;
use crate::x86::features::{bits, Features, AMX_GROUP, AVX512_GROUP, AVX_GROUP, KNOWN};

/// External collaborators of host detection.
///
/// Implemented with privileged architecture instructions in production and
/// with synthetic tables in tests.
pub trait CapabilityProbe {
    /// Raw register query: `(leaf, subleaf)` to `(eax, ebx, ecx, edx)`.
    fn cpuid(&self, leaf: u32, subleaf: u32) -> (u32, u32, u32, u32);

    /// Mask of extended-state components the operating environment saves.
    /// Only called after the save-enabled bit was reported present.
    fn xcr0(&self) -> u64;
}

/// Detected host: microarchitecture id plus gated feature vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostCapability {
    pub cpu: Cpu,
    pub features: Features,
}

// Extended-state component masks.
const XCR0_SSE_YMM: u64 = 0x6;
const XCR0_OPMASK_ZMM: u64 = 0xe0;
const XCR0_AMX_TILE: u64 = (1 << 17) | (1 << 18);

/// Probe and gate the running hardware.
pub fn detect_host(probe: &dyn CapabilityProbe) -> HostCapability {
    // Darwin saves the AVX-512 context lazily on first use, so the
    // component mask cannot be trusted to advertise it there.
    detect_host_gated(probe, cfg!(target_os = "macos"))
}

pub(crate) fn detect_host_gated(
    probe: &dyn CapabilityProbe,
    lazy_avx512_save: bool,
) -> HostCapability {
    let mut features = Features::new();
    let (max_leaf, vendor_sig, _, _) = probe.cpuid(0, 0);
    if max_leaf < 1 {
        return HostCapability {
            cpu: Cpu::Generic,
            features,
        };
    }
    let (version, brand, base_ecx, base_edx) = probe.cpuid(1, 0);
    let vendor = Vendor::from_signature(vendor_sig);
    let brand_id = brand & 0xff;

    let mut family = (version >> 8) & 0xf;
    let mut model = (version >> 4) & 0xf;
    if family == 6 || family == 0xf {
        if family == 0xf {
            // Examine the extended family id when the base field saturates.
            family += (version >> 20) & 0xff;
        }
        // The extended model id widens the model for these families.
        model += ((version >> 16) & 0xf) << 4;
    }

    // Fixed leaf-to-word mapping; this is the stable contract with the
    // feature registry. Absent leaves leave their word zero.
    *features.word_mut(0) = base_ecx;
    *features.word_mut(1) = base_edx;
    if max_leaf >= 7 {
        let (_, ebx, ecx, edx) = probe.cpuid(7, 0);
        *features.word_mut(2) = ebx;
        *features.word_mut(3) = ecx;
        *features.word_mut(4) = edx;
    }
    let (max_ext_leaf, _, _, _) = probe.cpuid(0x8000_0000, 0);
    if max_ext_leaf >= 0x8000_0001 {
        let (_, _, ecx, edx) = probe.cpuid(0x8000_0001, 0);
        *features.word_mut(5) = ecx;
        *features.word_mut(6) = edx;
    }
    if max_leaf >= 0xd {
        let (eax, _, _, _) = probe.cpuid(0xd, 1);
        *features.word_mut(7) = eax;
    }
    if max_ext_leaf >= 0x8000_0008 {
        let (_, ebx, _, _) = probe.cpuid(0x8000_0008, 0);
        *features.word_mut(8) = ebx;
    }
    if max_leaf >= 7 {
        let (eax, _, _, edx) = probe.cpuid(7, 1);
        *features.word_mut(9) = eax;
        *features.word_mut(10) = edx;
    }
    if max_leaf >= 0x14 {
        let (_, ebx, _, _) = probe.cpuid(0x14, 0);
        *features.word_mut(11) = ebx;
    }

    // Extended-state gates. Each one is all-or-nothing: a missing component
    // mask clears the whole group even when the raw bit was present.
    let mut xcr0 = 0u64;
    let mut has_save = features.test(bits::OSXSAVE);
    if has_save {
        xcr0 = probe.xcr0();
        has_save = xcr0 & XCR0_SSE_YMM == XCR0_SSE_YMM;
    }
    let has_avx = has_save && features.test(bits::AVX);
    features.unset(bits::OSXSAVE);
    if !has_avx {
        features = features.difference(AVX_GROUP);
    }
    let has_avx512_save = if lazy_avx512_save {
        has_avx
    } else {
        has_avx && xcr0 & XCR0_OPMASK_ZMM == XCR0_OPMASK_ZMM
    };
    if !has_avx512_save {
        features = features.difference(AVX512_GROUP);
    }
    let has_amx_save = has_save && xcr0 & XCR0_AMX_TILE == XCR0_AMX_TILE;
    if !has_amx_save {
        features = features.difference(AMX_GROUP);
    }

    // Reserved and unrecognized bits are dropped, never surfaced; hardware
    // newer than the registry still probes cleanly.
    features.mask(&KNOWN);

    let cpu = classify(vendor, family, model, brand_id, &features);
    HostCapability { cpu, features }
}

/// The memoized process-wide host capability.
///
/// The first caller computes it; every later caller, from any thread,
/// observes the same immutable result.
pub fn host() -> &'static HostCapability {
    static HOST: OnceLock<HostCapability> = OnceLock::new();
    HOST.get_or_init(|| {
        let detected = detect_host(&HardwareProbe);
        log::debug!(
            "detected host cpu {:?} with {} features",
            detected.cpu,
            detected.features.count()
        );
        detected
    })
}

/// Bounds-checked single-bit query against the memoized host vector.
pub fn host_has_feature(bit: u32) -> bool {
    host().features.test(bit)
}

/// Probe backed by the hardware instructions of the running processor.
pub struct HardwareProbe;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl CapabilityProbe for HardwareProbe {
    fn cpuid(&self, leaf: u32, subleaf: u32) -> (u32, u32, u32, u32) {
        #[cfg(target_arch = "x86")]
        use std::arch::x86::__cpuid_count;
        #[cfg(target_arch = "x86_64")]
        use std::arch::x86_64::__cpuid_count;

        // Safe on every processor this code can execute on; cpuid predates
        // all tracked features.
        let result = unsafe { __cpuid_count(leaf, subleaf) };
        (result.eax, result.ebx, result.ecx, result.edx)
    }

    fn xcr0(&self) -> u64 {
        let eax: u32;
        let edx: u32;
        // The caller verified the save-enabled bit, so xgetbv is available.
        unsafe {
            std::arch::asm!(
                "xgetbv",
                in("ecx") 0u32,
                out("eax") eax,
                out("edx") edx,
                options(nomem, nostack, preserves_flags),
            );
        }
        (u64::from(edx) << 32) | u64::from(eax)
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
impl CapabilityProbe for HardwareProbe {
    fn cpuid(&self, _leaf: u32, _subleaf: u32) -> (u32, u32, u32, u32) {
        (0, 0, 0, 0)
    }

    fn xcr0(&self) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeProbe {
        leaves: HashMap<(u32, u32), (u32, u32, u32, u32)>,
        xcr0: u64,
    }

    impl CapabilityProbe for FakeProbe {
        fn cpuid(&self, leaf: u32, subleaf: u32) -> (u32, u32, u32, u32) {
            self.leaves.get(&(leaf, subleaf)).copied().unwrap_or((0, 0, 0, 0))
        }

        fn xcr0(&self) -> u64 {
            self.xcr0
        }
    }

    const SIG_INTEL: u32 = 0x756e_6547;

    fn word_bits(bits: &[u32]) -> u32 {
        bits.iter().fold(0, |acc, b| acc | (1 << b))
    }

    /// A Skylake desktop part: family 6, model 0x5e, AVX2 but no AVX-512.
    fn skylake_probe() -> FakeProbe {
        let mut leaves = HashMap::new();
        // eax: family 6, model 0x5e via the extended model field.
        let version = (6 << 8) | (0xe << 4) | (0x5 << 16);
        leaves.insert((0, 0), (0x16, SIG_INTEL, 0, 0));
        leaves.insert(
            (1, 0),
            (
                version,
                0,
                word_bits(&[0, 1, 9, 12, 13, 19, 20, 22, 23, 25, 26, 27, 28, 29, 30]),
                0,
            ),
        );
        leaves.insert((7, 0), (0, word_bits(&[0, 3, 5, 8, 18, 19, 23]), 0, 0));
        leaves.insert((0xd, 1), (word_bits(&[0, 1, 3]), 0, 0, 0));
        leaves.insert((0x8000_0000, 0), (0x8000_0008, 0, 0, 0));
        leaves.insert((0x8000_0001, 0), (0, 0, word_bits(&[0, 5, 8]), 0));
        FakeProbe {
            leaves,
            xcr0: 0x7,
        }
    }

    #[test]
    fn test_skylake_classification_and_features() {
        let host = detect_host_gated(&skylake_probe(), false);
        assert_eq!(host.cpu, Cpu::IntelSkylake);
        assert!(host.features.test(bits::AVX2));
        assert!(host.features.test(bits::FMA));
        assert!(host.features.test(bits::XSAVEC));
        assert!(!host.features.test(bits::AVX512F));
        // The save-enabled bit itself never survives into the vector.
        assert!(!host.features.test(bits::OSXSAVE));
    }

    #[test]
    fn test_max_leaf_below_one_is_generic() {
        let mut leaves = HashMap::new();
        leaves.insert((0, 0), (0, SIG_INTEL, 0, 0));
        let host = detect_host_gated(&FakeProbe { leaves, xcr0: 0 }, false);
        assert_eq!(host.cpu, Cpu::Generic);
        assert!(host.features.is_empty());
    }

    #[test]
    fn test_avx_gate_requires_save_enabled_bit() {
        let mut probe = skylake_probe();
        // Same hardware, but the environment never enabled extended save:
        // clear the save-enabled bit from leaf 1 ecx.
        let entry = probe.leaves.get_mut(&(1, 0)).unwrap();
        entry.2 &= !(1 << 27);
        let host = detect_host_gated(&probe, false);
        assert!(!host.features.test(bits::AVX));
        assert!(!host.features.test(bits::AVX2));
        assert!(!host.features.test(bits::FMA));
        assert!(!host.features.test(bits::F16C));
        assert!(!host.features.test(bits::XSAVE));
        // Non-AVX SIMD is untouched.
        assert!(host.features.test(bits::SSE42));
        assert!(host.features.test(bits::POPCNT));
    }

    #[test]
    fn test_avx_gate_requires_component_mask() {
        let mut probe = skylake_probe();
        probe.xcr0 = 0x1; // x87 only
        let host = detect_host_gated(&probe, false);
        assert!(!host.features.test(bits::AVX));
        assert!(host.features.test(bits::SSE42));
    }

    /// An AVX-512 capable server part (model 0x55 with VNNI).
    fn cascadelake_probe(xcr0: u64) -> FakeProbe {
        let mut probe = skylake_probe();
        let version = (6 << 8) | (0x5 << 4) | (0x5 << 16);
        probe.leaves.get_mut(&(1, 0)).unwrap().0 = version;
        probe.leaves.insert(
            (7, 0),
            (
                0,
                word_bits(&[0, 3, 5, 8, 16, 17, 18, 19, 23, 24, 28, 30, 31]),
                word_bits(&[11]),
                0,
            ),
        );
        probe.xcr0 = xcr0;
        probe
    }

    #[test]
    fn test_avx512_gate_requires_wider_components() {
        // Without the opmask/ZMM components the whole AVX-512 group drops
        // while AVX survives, and classification loses the VNNI tiebreak.
        let host = detect_host_gated(&cascadelake_probe(0x7), false);
        assert!(host.features.test(bits::AVX2));
        assert!(!host.features.test(bits::AVX512F));
        assert!(!host.features.test(bits::AVX512VNNI));
        assert_eq!(host.cpu, Cpu::IntelSkylakeAvx512);

        let host = detect_host_gated(&cascadelake_probe(0xe7), false);
        assert!(host.features.test(bits::AVX512F));
        assert!(host.features.test(bits::AVX512VNNI));
        assert_eq!(host.cpu, Cpu::IntelCascadelake);
    }

    #[test]
    fn test_avx512_gate_waived_for_lazy_save() {
        let host = detect_host_gated(&cascadelake_probe(0x7), true);
        assert!(host.features.test(bits::AVX512F));
    }

    #[test]
    fn test_amx_gate_uses_own_components() {
        let mut probe = skylake_probe();
        // Report the AMX tile bits on leaf 7 edx.
        probe.leaves.get_mut(&(7, 0)).unwrap().3 = word_bits(&[22, 24, 25]);
        let gated = detect_host_gated(&probe, false);
        assert!(!gated.features.test(bits::AMX_TILE));

        let mut probe = skylake_probe();
        probe.leaves.get_mut(&(7, 0)).unwrap().3 = word_bits(&[22, 24, 25]);
        probe.xcr0 = 0x7 | XCR0_AMX_TILE;
        let saved = detect_host_gated(&probe, false);
        assert!(saved.features.test(bits::AMX_TILE));
        assert!(saved.features.test(bits::AMX_BF16));
    }

    #[test]
    fn test_unrecognized_bits_masked_silently() {
        let mut probe = skylake_probe();
        // Reserved bits nothing in the registry names.
        probe.leaves.get_mut(&(1, 0)).unwrap().2 |= 1 << 31;
        probe.leaves.get_mut(&(1, 0)).unwrap().3 = u32::MAX;
        let host = detect_host_gated(&probe, false);
        assert!(host.features.is_subset(&KNOWN));
        assert_eq!(host.cpu, Cpu::IntelSkylake);
    }

    #[test]
    fn test_absent_leaves_leave_words_zero() {
        let mut probe = skylake_probe();
        probe.leaves.insert((0, 0), (1, SIG_INTEL, 0, 0)); // max leaf 1
        probe.leaves.insert((0x8000_0000, 0), (0, 0, 0, 0));
        let host = detect_host_gated(&probe, false);
        assert!(!host.features.test(bits::AVX2), "leaf 7 word must be zero");
        assert!(!host.features.test(bits::SAHF));
        assert!(host.features.test(bits::SSE42));
    }

    #[test]
    fn test_host_is_memoized() {
        assert!(std::ptr::eq(host(), host()));
    }
}
