//! x86 microarchitecture registry: ids, baseline feature sets, aliases.
//!
//! Baselines layer on each other the way the silicon generations did;
//! deriving one from its predecessor keeps the table auditable against
//! vendor documentation.

use crate::core::registry::CpuSpec;
use crate::x86::features::bits::*;
use crate::x86::features::Features;

/// Known microarchitectures. Discriminants are the registry ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Cpu {
    Generic = 0,
    IntelNocona,
    IntelPrescott,
    IntelAtomBonnell,
    IntelAtomSilvermont,
    IntelAtomGoldmont,
    IntelAtomGoldmontPlus,
    IntelAtomTremont,
    IntelCore2,
    IntelCore2Penryn,
    IntelYonah,
    IntelNehalem,
    IntelWestmere,
    IntelSandybridge,
    IntelIvybridge,
    IntelHaswell,
    IntelBroadwell,
    IntelSkylake,
    IntelSkylakeAvx512,
    IntelCascadelake,
    IntelCooperlake,
    IntelCannonlake,
    IntelIcelakeClient,
    IntelIcelakeServer,
    IntelTigerlake,
    IntelAlderlake,
    IntelSapphireRapids,
    IntelKnightsLanding,
    IntelKnightsMill,

    AmdFam10h,
    AmdAthlonFx,
    AmdAthlon64,
    AmdAthlon64Sse3,
    AmdBdver1,
    AmdBdver2,
    AmdBdver3,
    AmdBdver4,
    AmdBtver1,
    AmdBtver2,
    AmdK8,
    AmdK8Sse3,
    AmdOpteron,
    AmdOpteronSse3,
    AmdBarcelona,
    AmdZnver1,
    AmdZnver2,
    AmdZnver3,
    AmdZnver4,
    AmdZnver5,
}

impl Cpu {
    /// Registry id of this microarchitecture.
    pub const fn id(self) -> u32 {
        self as u32
    }
}

// Baseline feature sets. cx16 is required on 64-bit by default and can be
// overridden with an explicit `-cx16`.
const GENERIC: Features = Features::with_bits(&[CX16]);
const BONNELL: Features = Features::with_bits(&[SSE3, SSSE3, CX16, MOVBE, SAHF]);
const SILVERMONT: Features =
    BONNELL.or(Features::with_bits(&[SSE41, SSE42, POPCNT, PCLMUL, PRFCHW, RDRND]));
const GOLDMONT: Features = SILVERMONT.or(Features::with_bits(&[
    AES, SHA, RDSEED, XSAVE, XSAVEOPT, XSAVEC, XSAVES, CLFLUSHOPT, FSGSBASE,
]));
const GOLDMONT_PLUS: Features = GOLDMONT.or(Features::with_bits(&[PTWRITE, RDPID]));
const TREMONT: Features = GOLDMONT_PLUS.or(Features::with_bits(&[CLWB, GFNI]));
const KNL: Features = Features::with_bits(&[
    SSE3, SSSE3, SSE41, SSE42, CX16, SAHF, POPCNT, AES, PCLMUL, AVX, XSAVE, XSAVEOPT, RDRND, F16C,
    FSGSBASE, AVX2, BMI, BMI2, FMA, LZCNT, MOVBE, ADX, RDSEED, PRFCHW, AVX512F, AVX512CD,
]);
const KNM: Features = KNL.or(Features::with_bits(&[AVX512VPOPCNTDQ]));
const YONAH: Features = Features::with_bits(&[SSE3]);
const PRESCOTT: Features = YONAH;
const CORE2: Features = Features::with_bits(&[SSE3, SSSE3, CX16, SAHF]);
const NOCONA: Features = Features::with_bits(&[SSE3, CX16]);
const PENRYN: Features = NOCONA.or(Features::with_bits(&[SSSE3, SSE41, SAHF]));
const NEHALEM: Features = PENRYN.or(Features::with_bits(&[SSE42, POPCNT]));
const WESTMERE: Features = NEHALEM.or(Features::with_bits(&[PCLMUL]));
const SANDYBRIDGE: Features = WESTMERE.or(Features::with_bits(&[AVX, XSAVE, XSAVEOPT]));
const IVYBRIDGE: Features = SANDYBRIDGE.or(Features::with_bits(&[RDRND, F16C, FSGSBASE]));
const HASWELL: Features = IVYBRIDGE.or(Features::with_bits(&[AVX2, BMI, BMI2, FMA, LZCNT, MOVBE]));
const BROADWELL: Features = HASWELL.or(Features::with_bits(&[ADX, RDSEED, PRFCHW]));
const SKYLAKE: Features = BROADWELL.or(Features::with_bits(&[AES, XSAVEC, XSAVES, CLFLUSHOPT]));
const SKX: Features = SKYLAKE.or(Features::with_bits(&[
    AVX512F, AVX512CD, AVX512DQ, AVX512BW, AVX512VL, PKU, CLWB,
]));
const CASCADELAKE: Features = SKX.or(Features::with_bits(&[AVX512VNNI]));
const COOPERLAKE: Features = CASCADELAKE.or(Features::with_bits(&[AVX512BF16]));
const CANNONLAKE: Features = SKYLAKE.or(Features::with_bits(&[
    AVX512F, AVX512CD, AVX512DQ, AVX512BW, AVX512VL, PKU, AVX512VBMI, AVX512IFMA, SHA,
]));
const ICELAKE: Features = CANNONLAKE.or(Features::with_bits(&[
    AVX512BITALG, VAES, AVX512VBMI2, VPCLMULQDQ, AVX512VPOPCNTDQ, GFNI, CLWB, RDPID,
]));
const ICELAKE_SERVER: Features = ICELAKE.or(Features::with_bits(&[PCONFIG, WBNOINVD]));
const TIGERLAKE: Features =
    ICELAKE.or(Features::with_bits(&[AVX512VP2INTERSECT, MOVDIRI, MOVDIR64B, SHSTK]));
const ALDERLAKE: Features = SKYLAKE.or(Features::with_bits(&[
    CLWB, SHA, WAITPKG, SHSTK, GFNI, VAES, VPCLMULQDQ, PCONFIG, RDPID, MOVDIRI, PKU, MOVDIR64B,
    SERIALIZE, PTWRITE, AVXVNNI,
]));
const SAPPHIRERAPIDS: Features = ICELAKE_SERVER.or(Features::with_bits(&[
    AMX_TILE,
    AMX_INT8,
    AMX_BF16,
    AVX512BF16,
    AVX512FP16,
    SERIALIZE,
    CLDEMOTE,
    WAITPKG,
    AVXVNNI,
    UINTR,
    PTWRITE,
    TSXLDTRK,
    ENQCMD,
    SHSTK,
    AVX512VP2INTERSECT,
    MOVDIRI,
    MOVDIR64B,
]));

const K8_SSE3: Features = Features::with_bits(&[SSE3, CX16]);
const AMDFAM10: Features = K8_SSE3.or(Features::with_bits(&[SSE4A, LZCNT, POPCNT, SAHF]));
const BTVER1: Features = AMDFAM10.or(Features::with_bits(&[SSSE3, PRFCHW]));
const BTVER2: Features = BTVER1.or(Features::with_bits(&[
    SSE41, SSE42, AVX, AES, PCLMUL, BMI, F16C, MOVBE, XSAVE, XSAVEOPT,
]));
const BDVER1: Features = AMDFAM10.or(Features::with_bits(&[
    XOP, FMA4, AVX, SSSE3, SSE41, SSE42, AES, PRFCHW, PCLMUL, XSAVE,
]));
const BDVER2: Features = BDVER1.or(Features::with_bits(&[F16C, BMI, TBM, FMA]));
const BDVER3: Features = BDVER2.or(Features::with_bits(&[XSAVEOPT, FSGSBASE]));
const BDVER4: Features = BDVER3.or(Features::with_bits(&[AVX2, BMI2, MWAITX, MOVBE, RDRND]));

// xsaves is technically part of the first three Zen generations but stays
// off: erratum 1386 makes its state save unreliable there.
const ZNVER1: Features = HASWELL.or(Features::with_bits(&[
    ADX, AES, CLFLUSHOPT, CLZERO, MWAITX, PRFCHW, RDSEED, SHA, SSE4A, XSAVEC,
]));
const ZNVER2: Features = ZNVER1.or(Features::with_bits(&[CLWB, RDPID, WBNOINVD]));
const ZNVER3: Features = ZNVER2.or(Features::with_bits(&[SHSTK, PKU, VAES, VPCLMULQDQ]));
const ZNVER4: Features = ZNVER3.or(Features::with_bits(&[
    AVX512F,
    AVX512CD,
    AVX512DQ,
    AVX512BW,
    AVX512VL,
    AVX512IFMA,
    AVX512VBMI,
    AVX512VBMI2,
    AVX512VNNI,
    AVX512BITALG,
    AVX512VPOPCNTDQ,
    AVX512BF16,
    GFNI,
    SHSTK,
    XSAVES,
]));
const ZNVER5: Features = ZNVER4.or(Features::with_bits(&[
    AVXVNNI,
    MOVDIRI,
    MOVDIR64B,
    AVX512VP2INTERSECT,
    PREFETCHI,
]));

/// The microarchitecture spec table.
pub const CPU_SPECS: &[CpuSpec<12>] = &[
    CpuSpec::new("generic", Cpu::Generic.id(), Cpu::Generic.id(), 0, GENERIC),
    CpuSpec::new("bonnell", Cpu::IntelAtomBonnell.id(), Cpu::Generic.id(), 0, BONNELL),
    CpuSpec::new("silvermont", Cpu::IntelAtomSilvermont.id(), Cpu::Generic.id(), 0, SILVERMONT),
    CpuSpec::new("goldmont", Cpu::IntelAtomGoldmont.id(), Cpu::Generic.id(), 0, GOLDMONT),
    CpuSpec::new("goldmont-plus", Cpu::IntelAtomGoldmontPlus.id(), Cpu::Generic.id(), 0, GOLDMONT_PLUS),
    CpuSpec::new("tremont", Cpu::IntelAtomTremont.id(), Cpu::Generic.id(), 0, TREMONT),
    CpuSpec::new("core2", Cpu::IntelCore2.id(), Cpu::Generic.id(), 0, CORE2),
    CpuSpec::new("yonah", Cpu::IntelYonah.id(), Cpu::Generic.id(), 0, YONAH),
    CpuSpec::new("prescott", Cpu::IntelPrescott.id(), Cpu::Generic.id(), 0, PRESCOTT),
    CpuSpec::new("nocona", Cpu::IntelNocona.id(), Cpu::Generic.id(), 0, NOCONA),
    CpuSpec::new("penryn", Cpu::IntelCore2Penryn.id(), Cpu::Generic.id(), 0, PENRYN),
    CpuSpec::new("nehalem", Cpu::IntelNehalem.id(), Cpu::Generic.id(), 0, NEHALEM),
    CpuSpec::new("westmere", Cpu::IntelWestmere.id(), Cpu::Generic.id(), 0, WESTMERE),
    CpuSpec::new("sandybridge", Cpu::IntelSandybridge.id(), Cpu::Generic.id(), 0, SANDYBRIDGE),
    CpuSpec::new("ivybridge", Cpu::IntelIvybridge.id(), Cpu::Generic.id(), 0, IVYBRIDGE),
    CpuSpec::new("haswell", Cpu::IntelHaswell.id(), Cpu::Generic.id(), 0, HASWELL),
    CpuSpec::new("broadwell", Cpu::IntelBroadwell.id(), Cpu::Generic.id(), 0, BROADWELL),
    CpuSpec::new("skylake", Cpu::IntelSkylake.id(), Cpu::Generic.id(), 0, SKYLAKE),
    CpuSpec::new("knl", Cpu::IntelKnightsLanding.id(), Cpu::Generic.id(), 0, KNL),
    CpuSpec::new("knm", Cpu::IntelKnightsMill.id(), Cpu::Generic.id(), 0, KNM),
    CpuSpec::new("skylake-avx512", Cpu::IntelSkylakeAvx512.id(), Cpu::Generic.id(), 0, SKX),
    CpuSpec::new("cascadelake", Cpu::IntelCascadelake.id(), Cpu::Generic.id(), 0, CASCADELAKE),
    CpuSpec::new("cooperlake", Cpu::IntelCooperlake.id(), Cpu::Generic.id(), 0, COOPERLAKE),
    CpuSpec::new("cannonlake", Cpu::IntelCannonlake.id(), Cpu::Generic.id(), 0, CANNONLAKE),
    CpuSpec::new("icelake-client", Cpu::IntelIcelakeClient.id(), Cpu::Generic.id(), 0, ICELAKE),
    CpuSpec::new("icelake-server", Cpu::IntelIcelakeServer.id(), Cpu::Generic.id(), 0, ICELAKE_SERVER),
    CpuSpec::new("tigerlake", Cpu::IntelTigerlake.id(), Cpu::IntelIcelakeClient.id(), 100000, TIGERLAKE),
    CpuSpec::new("alderlake", Cpu::IntelAlderlake.id(), Cpu::IntelSkylake.id(), 120000, ALDERLAKE),
    CpuSpec::new("sapphirerapids", Cpu::IntelSapphireRapids.id(), Cpu::IntelIcelakeServer.id(), 120000, SAPPHIRERAPIDS),

    CpuSpec::new("athlon64", Cpu::AmdAthlon64.id(), Cpu::Generic.id(), 0, GENERIC),
    CpuSpec::new("athlon-fx", Cpu::AmdAthlonFx.id(), Cpu::Generic.id(), 0, GENERIC),
    CpuSpec::new("k8", Cpu::AmdK8.id(), Cpu::Generic.id(), 0, GENERIC),
    CpuSpec::new("opteron", Cpu::AmdOpteron.id(), Cpu::Generic.id(), 0, GENERIC),

    CpuSpec::new("athlon64-sse3", Cpu::AmdAthlon64Sse3.id(), Cpu::Generic.id(), 0, K8_SSE3),
    CpuSpec::new("k8-sse3", Cpu::AmdK8Sse3.id(), Cpu::Generic.id(), 0, K8_SSE3),
    CpuSpec::new("opteron-sse3", Cpu::AmdOpteronSse3.id(), Cpu::Generic.id(), 0, K8_SSE3),

    CpuSpec::new("amdfam10", Cpu::AmdFam10h.id(), Cpu::Generic.id(), 0, AMDFAM10),
    CpuSpec::new("barcelona", Cpu::AmdBarcelona.id(), Cpu::Generic.id(), 0, AMDFAM10),

    CpuSpec::new("btver1", Cpu::AmdBtver1.id(), Cpu::Generic.id(), 0, BTVER1),
    CpuSpec::new("btver2", Cpu::AmdBtver2.id(), Cpu::Generic.id(), 0, BTVER2),

    CpuSpec::new("bdver1", Cpu::AmdBdver1.id(), Cpu::Generic.id(), 0, BDVER1),
    CpuSpec::new("bdver2", Cpu::AmdBdver2.id(), Cpu::Generic.id(), 0, BDVER2),
    CpuSpec::new("bdver3", Cpu::AmdBdver3.id(), Cpu::Generic.id(), 0, BDVER3),
    CpuSpec::new("bdver4", Cpu::AmdBdver4.id(), Cpu::Generic.id(), 0, BDVER4),

    CpuSpec::new("znver1", Cpu::AmdZnver1.id(), Cpu::Generic.id(), 0, ZNVER1),
    CpuSpec::new("znver2", Cpu::AmdZnver2.id(), Cpu::Generic.id(), 0, ZNVER2),
    CpuSpec::new("znver3", Cpu::AmdZnver3.id(), Cpu::AmdZnver2.id(), 120000, ZNVER3),
    CpuSpec::new("znver4", Cpu::AmdZnver4.id(), Cpu::AmdZnver3.id(), 160000, ZNVER4),
    CpuSpec::new("znver5", Cpu::AmdZnver5.id(), Cpu::AmdZnver4.id(), 190000, ZNVER5),
];

/// Legacy and vendor-neutral spellings rewritten before lookup.
#[cfg(target_pointer_width = "64")]
pub const ALIASES: &[(&str, &str)] = &[
    ("atom", "bonnell"),
    ("slm", "silvermont"),
    ("glm", "goldmont"),
    ("corei7", "nehalem"),
    ("corei7-avx", "sandybridge"),
    ("core-avx-i", "ivybridge"),
    ("core-avx2", "haswell"),
    ("skx", "skylake-avx512"),
    ("x86-64", "generic"),
    ("x86_64", "generic"),
];

/// Legacy and vendor-neutral spellings rewritten before lookup. i686 is not
/// a real target here but a common default spelling of the baseline.
#[cfg(target_pointer_width = "32")]
pub const ALIASES: &[(&str, &str)] = &[
    ("atom", "bonnell"),
    ("slm", "silvermont"),
    ("glm", "goldmont"),
    ("corei7", "nehalem"),
    ("corei7-avx", "sandybridge"),
    ("core-avx-i", "ivybridge"),
    ("core-avx2", "haswell"),
    ("skx", "skylake-avx512"),
    ("pentium4", "generic"),
    ("i686", "generic"),
];
