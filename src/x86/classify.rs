// This module classifies a probed (vendor, family, model) triple into a named
// microarchitecture. The decision data is deliberately declarative - exact-model tables
// for Intel's family 6 and model ranges for AMD's families - so the mapping can be
// audited against vendor documentation and tested in isolation from the probe. Two
// places need more than a table row: Intel's Skylake-derived server model 0x55 shipped
// three generations apart only by feature bits (cooperlake when avx512bf16 is present,
// cascadelake when avx512vnni is, skylake-avx512 otherwise; the rarest feature is
// checked first), and AMD family 15h distinguishes K8 revisions by whether sse3 made
// it into the part. Anything unrecognized, including a nonzero Intel brand id or an
// unknown vendor signature, falls back to the generic id; classification never fails.

//! Vendor/family/model to microarchitecture classification.

use crate::x86::cpus::Cpu;
use crate::x86::features::{bits, Features};

/// Vendor signature from cpuid leaf 0 ebx.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vendor {
    Intel,
    Amd,
    Unknown,
}

const SIG_INTEL: u32 = 0x756e_6547; // "Genu"
const SIG_AMD: u32 = 0x6874_7541; // "Auth"

impl Vendor {
    pub fn from_signature(signature: u32) -> Self {
        match signature {
            SIG_INTEL => Vendor::Intel,
            SIG_AMD => Vendor::Amd,
            _ => Vendor::Unknown,
        }
    }
}

/// Classify a probed processor. `features` breaks ties where one model
/// number spans several generations.
pub fn classify(
    vendor: Vendor,
    family: u32,
    model: u32,
    brand_id: u32,
    features: &Features,
) -> Cpu {
    match vendor {
        Vendor::Intel => classify_intel(family, model, brand_id, features),
        Vendor::Amd => classify_amd(family, model, features),
        Vendor::Unknown => Cpu::Generic,
    }
}

/// Exact model numbers for Intel family 6. Pre-SSE3 models are left out and
/// fall through to generic.
const INTEL_FAMILY6_MODELS: &[(u32, Cpu)] = &[
    // Core and Core 2
    (0x0e, Cpu::IntelYonah),
    (0x0f, Cpu::IntelCore2),
    (0x16, Cpu::IntelCore2),
    (0x17, Cpu::IntelCore2Penryn),
    (0x1d, Cpu::IntelCore2Penryn),
    // Nehalem and Westmere
    (0x1a, Cpu::IntelNehalem),
    (0x1e, Cpu::IntelNehalem),
    (0x1f, Cpu::IntelNehalem),
    (0x2e, Cpu::IntelNehalem),
    (0x25, Cpu::IntelWestmere),
    (0x2c, Cpu::IntelWestmere),
    (0x2f, Cpu::IntelWestmere),
    // Sandy Bridge and Ivy Bridge
    (0x2a, Cpu::IntelSandybridge),
    (0x2d, Cpu::IntelSandybridge),
    (0x3a, Cpu::IntelIvybridge),
    (0x3e, Cpu::IntelIvybridge),
    // Haswell
    (0x3c, Cpu::IntelHaswell),
    (0x3f, Cpu::IntelHaswell),
    (0x45, Cpu::IntelHaswell),
    (0x46, Cpu::IntelHaswell),
    // Broadwell
    (0x3d, Cpu::IntelBroadwell),
    (0x47, Cpu::IntelBroadwell),
    (0x4f, Cpu::IntelBroadwell),
    (0x56, Cpu::IntelBroadwell),
    // Skylake client, Kaby Lake, Comet Lake
    (0x4e, Cpu::IntelSkylake),
    (0x5e, Cpu::IntelSkylake),
    (0x8e, Cpu::IntelSkylake),
    (0x9e, Cpu::IntelSkylake),
    (0xa5, Cpu::IntelSkylake),
    (0xa6, Cpu::IntelSkylake),
    // Cannon Lake
    (0x66, Cpu::IntelCannonlake),
    // Ice Lake
    (0x7d, Cpu::IntelIcelakeClient),
    (0x7e, Cpu::IntelIcelakeClient),
    (0x9d, Cpu::IntelIcelakeClient),
    (0x6a, Cpu::IntelIcelakeServer),
    (0x6c, Cpu::IntelIcelakeServer),
    // Tiger Lake
    (0x8c, Cpu::IntelTigerlake),
    (0x8d, Cpu::IntelTigerlake),
    // Alder Lake
    (0x97, Cpu::IntelAlderlake),
    (0x9a, Cpu::IntelAlderlake),
    // Sapphire Rapids
    (0x8f, Cpu::IntelSapphireRapids),
    // Atom lines
    (0x1c, Cpu::IntelAtomBonnell),
    (0x26, Cpu::IntelAtomBonnell),
    (0x27, Cpu::IntelAtomBonnell),
    (0x35, Cpu::IntelAtomBonnell),
    (0x36, Cpu::IntelAtomBonnell),
    (0x37, Cpu::IntelAtomSilvermont),
    (0x4a, Cpu::IntelAtomSilvermont),
    (0x4d, Cpu::IntelAtomSilvermont),
    (0x5d, Cpu::IntelAtomSilvermont),
    (0x4c, Cpu::IntelAtomSilvermont),
    (0x5a, Cpu::IntelAtomSilvermont),
    (0x75, Cpu::IntelAtomSilvermont),
    (0x5c, Cpu::IntelAtomGoldmont),
    (0x5f, Cpu::IntelAtomGoldmont),
    (0x7a, Cpu::IntelAtomGoldmontPlus),
    (0x86, Cpu::IntelAtomTremont),
    (0x96, Cpu::IntelAtomTremont),
    (0x9c, Cpu::IntelAtomTremont),
    // Knights Landing / Knights Mill
    (0x57, Cpu::IntelKnightsLanding),
    (0x85, Cpu::IntelKnightsMill),
];

fn classify_intel(family: u32, model: u32, brand_id: u32, features: &Features) -> Cpu {
    if brand_id != 0 {
        return Cpu::Generic;
    }
    match family {
        6 => {
            // Skylake-derived Xeons share model 0x55; the generations only
            // differ by feature bits. Check the rarest first.
            if model == 0x55 {
                if features.test(bits::AVX512BF16) {
                    return Cpu::IntelCooperlake;
                }
                if features.test(bits::AVX512VNNI) {
                    return Cpu::IntelCascadelake;
                }
                return Cpu::IntelSkylakeAvx512;
            }
            INTEL_FAMILY6_MODELS
                .iter()
                .find(|(m, _)| *m == model)
                .map(|(_, cpu)| *cpu)
                .unwrap_or(Cpu::Generic)
        }
        15 => match model {
            // 90 nm and 65 nm Pentium 4 parts are the first with SSE3.
            3 | 4 | 6 => {
                if cfg!(target_pointer_width = "64") {
                    Cpu::IntelNocona
                } else {
                    Cpu::IntelPrescott
                }
            }
            _ => Cpu::Generic,
        },
        _ => Cpu::Generic,
    }
}

/// Inclusive model ranges within one AMD family.
struct ModelRange {
    lo: u32,
    hi: u32,
    cpu: Cpu,
}

const fn range(lo: u32, hi: u32, cpu: Cpu) -> ModelRange {
    ModelRange { lo, hi, cpu }
}

const AMD_FAMILY21_MODELS: &[ModelRange] = &[
    range(0x00, 0x0f, Cpu::AmdBdver1),
    range(0x10, 0x1f, Cpu::AmdBdver2),
    range(0x30, 0x3f, Cpu::AmdBdver3),
    range(0x50, 0x6f, Cpu::AmdBdver4),
];

const AMD_FAMILY25_MODELS: &[ModelRange] = &[
    range(0x00, 0x0f, Cpu::AmdZnver3),
    range(0x20, 0x5f, Cpu::AmdZnver3),
    range(0x10, 0x1f, Cpu::AmdZnver4),
    range(0x60, 0x74, Cpu::AmdZnver4),
    range(0x78, 0x7b, Cpu::AmdZnver4),
    range(0xa0, 0xaf, Cpu::AmdZnver4),
];

fn in_ranges(ranges: &[ModelRange], model: u32) -> Option<Cpu> {
    ranges
        .iter()
        .find(|r| r.lo <= model && model <= r.hi)
        .map(|r| r.cpu)
}

fn classify_amd(family: u32, model: u32, features: &Features) -> Cpu {
    match family {
        15 => {
            if features.test(bits::SSE3) {
                return Cpu::AmdK8Sse3;
            }
            match model {
                1 => Cpu::AmdOpteron,
                5 => Cpu::AmdAthlonFx,
                _ => Cpu::AmdAthlon64,
            }
        }
        16 => match model {
            2 => Cpu::AmdBarcelona,
            _ => Cpu::AmdFam10h,
        },
        20 => Cpu::AmdBtver1,
        21 => in_ranges(AMD_FAMILY21_MODELS, model).unwrap_or(Cpu::AmdBtver1),
        22 => Cpu::AmdBtver2,
        23 => {
            // Zen and Zen+ stay below model 0x30, Zen 2 starts there.
            if model >= 0x30 {
                Cpu::AmdZnver2
            } else {
                Cpu::AmdZnver1
            }
        }
        25 => in_ranges(AMD_FAMILY25_MODELS, model).unwrap_or(Cpu::AmdZnver3),
        26 => Cpu::AmdZnver5,
        _ => Cpu::Generic,
    }
}
