//! x86 feature registry: bit assignments, dependency pairs, feature groups.
//!
//! Bit indices follow the probe word mapping documented in [`probe`]
//! (crate::x86::probe): twelve 32-bit words, each filled from one fixed
//! cpuid leaf/subleaf register. Changing an assignment re-versions the
//! serialized target-list format.

use crate::core::bitset::{FeatureDep, FeatureVector};
use crate::core::registry::FeatureName;

/// Feature-vector words on x86.
pub const FEATURE_WORDS: usize = 12;

/// The x86 feature vector.
pub type Features = FeatureVector<FEATURE_WORDS>;

/// Version of the toolchain this build drives, in the backend's
/// major*10000 scheme.
pub const TOOLCHAIN_VERSION: u32 = 160000;

/// Flat bit indices. Word boundaries every 32 bits.
pub mod bits {
    // Word 0: leaf 1 ecx
    pub const SSE3: u32 = 0;
    pub const PCLMUL: u32 = 1;
    pub const SSSE3: u32 = 9;
    pub const FMA: u32 = 12;
    pub const CX16: u32 = 13;
    pub const SSE41: u32 = 19;
    pub const SSE42: u32 = 20;
    pub const MOVBE: u32 = 22;
    pub const POPCNT: u32 = 23;
    pub const AES: u32 = 25;
    pub const XSAVE: u32 = 26;
    pub const OSXSAVE: u32 = 27;
    pub const AVX: u32 = 28;
    pub const F16C: u32 = 29;
    pub const RDRND: u32 = 30;

    // Word 1: leaf 1 edx (baseline only, nothing tracked)

    // Word 2: leaf 7 subleaf 0 ebx
    pub const FSGSBASE: u32 = 64;
    pub const BMI: u32 = 64 + 3;
    pub const AVX2: u32 = 64 + 5;
    pub const BMI2: u32 = 64 + 8;
    pub const RTM: u32 = 64 + 11;
    pub const AVX512F: u32 = 64 + 16;
    pub const AVX512DQ: u32 = 64 + 17;
    pub const RDSEED: u32 = 64 + 18;
    pub const ADX: u32 = 64 + 19;
    pub const AVX512IFMA: u32 = 64 + 21;
    pub const CLFLUSHOPT: u32 = 64 + 23;
    pub const CLWB: u32 = 64 + 24;
    pub const AVX512CD: u32 = 64 + 28;
    pub const SHA: u32 = 64 + 29;
    pub const AVX512BW: u32 = 64 + 30;
    pub const AVX512VL: u32 = 64 + 31;

    // Word 3: leaf 7 subleaf 0 ecx
    pub const AVX512VBMI: u32 = 96 + 1;
    pub const PKU: u32 = 96 + 4;
    pub const WAITPKG: u32 = 96 + 5;
    pub const AVX512VBMI2: u32 = 96 + 6;
    pub const SHSTK: u32 = 96 + 7;
    pub const GFNI: u32 = 96 + 8;
    pub const VAES: u32 = 96 + 9;
    pub const VPCLMULQDQ: u32 = 96 + 10;
    pub const AVX512VNNI: u32 = 96 + 11;
    pub const AVX512BITALG: u32 = 96 + 12;
    pub const AVX512VPOPCNTDQ: u32 = 96 + 14;
    pub const RDPID: u32 = 96 + 22;
    pub const CLDEMOTE: u32 = 96 + 25;
    pub const MOVDIRI: u32 = 96 + 27;
    pub const MOVDIR64B: u32 = 96 + 28;
    pub const ENQCMD: u32 = 96 + 29;

    // Word 4: leaf 7 subleaf 0 edx
    pub const UINTR: u32 = 128 + 5;
    pub const AVX512VP2INTERSECT: u32 = 128 + 8;
    pub const SERIALIZE: u32 = 128 + 14;
    pub const TSXLDTRK: u32 = 128 + 16;
    pub const PCONFIG: u32 = 128 + 18;
    pub const AMX_BF16: u32 = 128 + 22;
    pub const AVX512FP16: u32 = 128 + 23;
    pub const AMX_TILE: u32 = 128 + 24;
    pub const AMX_INT8: u32 = 128 + 25;

    // Word 5: leaf 0x80000001 ecx
    pub const SAHF: u32 = 160;
    pub const LZCNT: u32 = 160 + 5;
    pub const SSE4A: u32 = 160 + 6;
    pub const PRFCHW: u32 = 160 + 8;
    pub const XOP: u32 = 160 + 11;
    pub const FMA4: u32 = 160 + 16;
    pub const TBM: u32 = 160 + 21;
    pub const MWAITX: u32 = 160 + 29;

    // Word 6: leaf 0x80000001 edx (baseline only, nothing tracked)

    // Word 7: leaf 0xd subleaf 1 eax
    pub const XSAVEOPT: u32 = 224;
    pub const XSAVEC: u32 = 224 + 1;
    pub const XSAVES: u32 = 224 + 3;

    // Word 8: leaf 0x80000008 ebx
    pub const CLZERO: u32 = 256;
    pub const WBNOINVD: u32 = 256 + 9;

    // Word 9: leaf 7 subleaf 1 eax
    pub const SHA512: u32 = 288;
    pub const SM3: u32 = 288 + 1;
    pub const SM4: u32 = 288 + 2;
    pub const AVXVNNI: u32 = 288 + 4;
    pub const AVX512BF16: u32 = 288 + 5;
    pub const CMPCCXADD: u32 = 288 + 7;
    pub const AMX_FP16: u32 = 288 + 21;
    pub const AVXIFMA: u32 = 288 + 23;

    // Word 10: leaf 7 subleaf 1 edx
    pub const AVXVNNIINT8: u32 = 320 + 4;
    pub const AVXNECONVERT: u32 = 320 + 5;
    pub const AMX_COMPLEX: u32 = 320 + 8;
    pub const AVXVNNIINT16: u32 = 320 + 10;
    pub const PREFETCHI: u32 = 320 + 14;

    // Word 11: leaf 0x14 subleaf 0 ebx
    pub const PTWRITE: u32 = 352 + 4;
}

use self::bits::*;

/// Name/bit/minimum-toolchain table for every recognized feature.
pub const FEATURE_NAMES: &[FeatureName] = &[
    FeatureName::new("sse3", SSE3, 0),
    FeatureName::new("pclmul", PCLMUL, 0),
    FeatureName::new("ssse3", SSSE3, 0),
    FeatureName::new("fma", FMA, 0),
    FeatureName::new("cx16", CX16, 0),
    FeatureName::new("sse4.1", SSE41, 0),
    FeatureName::new("sse4.2", SSE42, 0),
    FeatureName::new("movbe", MOVBE, 0),
    FeatureName::new("popcnt", POPCNT, 0),
    FeatureName::new("aes", AES, 0),
    FeatureName::new("xsave", XSAVE, 0),
    FeatureName::new("avx", AVX, 0),
    FeatureName::new("f16c", F16C, 0),
    FeatureName::new("rdrnd", RDRND, 0),
    FeatureName::new("fsgsbase", FSGSBASE, 0),
    FeatureName::new("bmi", BMI, 0),
    FeatureName::new("avx2", AVX2, 0),
    FeatureName::new("bmi2", BMI2, 0),
    FeatureName::new("rtm", RTM, 0),
    FeatureName::new("avx512f", AVX512F, 0),
    FeatureName::new("avx512dq", AVX512DQ, 0),
    FeatureName::new("rdseed", RDSEED, 0),
    FeatureName::new("adx", ADX, 0),
    FeatureName::new("avx512ifma", AVX512IFMA, 0),
    FeatureName::new("clflushopt", CLFLUSHOPT, 0),
    FeatureName::new("clwb", CLWB, 0),
    FeatureName::new("avx512cd", AVX512CD, 0),
    FeatureName::new("sha", SHA, 0),
    FeatureName::new("avx512bw", AVX512BW, 0),
    FeatureName::new("avx512vl", AVX512VL, 0),
    FeatureName::new("avx512vbmi", AVX512VBMI, 0),
    FeatureName::new("pku", PKU, 0),
    FeatureName::new("waitpkg", WAITPKG, 0),
    FeatureName::new("avx512vbmi2", AVX512VBMI2, 0),
    FeatureName::new("shstk", SHSTK, 0),
    FeatureName::new("gfni", GFNI, 0),
    FeatureName::new("vaes", VAES, 0),
    FeatureName::new("vpclmulqdq", VPCLMULQDQ, 0),
    FeatureName::new("avx512vnni", AVX512VNNI, 0),
    FeatureName::new("avx512bitalg", AVX512BITALG, 0),
    FeatureName::new("avx512vpopcntdq", AVX512VPOPCNTDQ, 0),
    FeatureName::new("rdpid", RDPID, 0),
    FeatureName::new("cldemote", CLDEMOTE, 0),
    FeatureName::new("movdiri", MOVDIRI, 0),
    FeatureName::new("movdir64b", MOVDIR64B, 0),
    FeatureName::new("enqcmd", ENQCMD, 0),
    FeatureName::new("uintr", UINTR, 140000),
    FeatureName::new("avx512vp2intersect", AVX512VP2INTERSECT, 0),
    FeatureName::new("serialize", SERIALIZE, 110000),
    FeatureName::new("tsxldtrk", TSXLDTRK, 110000),
    FeatureName::new("pconfig", PCONFIG, 0),
    FeatureName::new("amx-bf16", AMX_BF16, 110000),
    FeatureName::new("avx512fp16", AVX512FP16, 140000),
    FeatureName::new("amx-tile", AMX_TILE, 110000),
    FeatureName::new("amx-int8", AMX_INT8, 110000),
    FeatureName::new("sahf", SAHF, 0),
    FeatureName::new("lzcnt", LZCNT, 0),
    FeatureName::new("sse4a", SSE4A, 0),
    FeatureName::new("prfchw", PRFCHW, 0),
    FeatureName::new("xop", XOP, 0),
    FeatureName::new("fma4", FMA4, 0),
    FeatureName::new("tbm", TBM, 0),
    FeatureName::new("mwaitx", MWAITX, 0),
    FeatureName::new("xsaveopt", XSAVEOPT, 0),
    FeatureName::new("xsavec", XSAVEC, 0),
    FeatureName::new("xsaves", XSAVES, 0),
    FeatureName::new("clzero", CLZERO, 0),
    FeatureName::new("wbnoinvd", WBNOINVD, 0),
    FeatureName::new("sha512", SHA512, 170000),
    FeatureName::new("sm3", SM3, 170000),
    FeatureName::new("sm4", SM4, 170000),
    FeatureName::new("avxvnni", AVXVNNI, 120000),
    FeatureName::new("avx512bf16", AVX512BF16, 0),
    FeatureName::new("cmpccxadd", CMPCCXADD, 160000),
    FeatureName::new("amx-fp16", AMX_FP16, 160000),
    FeatureName::new("avxifma", AVXIFMA, 160000),
    FeatureName::new("avxvnniint8", AVXVNNIINT8, 160000),
    FeatureName::new("avxneconvert", AVXNECONVERT, 160000),
    FeatureName::new("amx-complex", AMX_COMPLEX, 170000),
    FeatureName::new("avxvnniint16", AVXVNNIINT16, 170000),
    FeatureName::new("prefetchi", PREFETCHI, 160000),
    FeatureName::new("ptwrite", PTWRITE, 0),
];

/// Dependency pairs. The graph is acyclic; closures iterate to a fixed
/// point so the order here carries no meaning.
pub const DEPS: &[FeatureDep] = &[
    FeatureDep::new(SSSE3, SSE3),
    FeatureDep::new(FMA, AVX),
    FeatureDep::new(SSE41, SSSE3),
    FeatureDep::new(SSE42, SSE41),
    FeatureDep::new(AVX, SSE42),
    FeatureDep::new(F16C, AVX),
    FeatureDep::new(AVX2, AVX),
    FeatureDep::new(VAES, AVX),
    FeatureDep::new(VAES, AES),
    FeatureDep::new(VPCLMULQDQ, AVX),
    FeatureDep::new(VPCLMULQDQ, PCLMUL),
    FeatureDep::new(AVXVNNI, AVX2),
    FeatureDep::new(AVXVNNIINT8, AVX2),
    FeatureDep::new(AVXVNNIINT16, AVX2),
    FeatureDep::new(AVXIFMA, AVX2),
    FeatureDep::new(AVXNECONVERT, AVX2),
    FeatureDep::new(AVX512F, AVX2),
    FeatureDep::new(AVX512DQ, AVX512F),
    FeatureDep::new(AVX512IFMA, AVX512F),
    FeatureDep::new(AVX512CD, AVX512F),
    FeatureDep::new(AVX512BW, AVX512F),
    FeatureDep::new(AVX512BF16, AVX512BW),
    FeatureDep::new(AVX512BITALG, AVX512BW),
    FeatureDep::new(AVX512VL, AVX512F),
    FeatureDep::new(AVX512VBMI, AVX512BW),
    FeatureDep::new(AVX512VBMI2, AVX512BW),
    FeatureDep::new(AVX512VNNI, AVX512F),
    FeatureDep::new(AVX512VP2INTERSECT, AVX512F),
    FeatureDep::new(AVX512VPOPCNTDQ, AVX512F),
    FeatureDep::new(AVX512FP16, AVX512BW),
    FeatureDep::new(AVX512FP16, AVX512DQ),
    FeatureDep::new(AVX512FP16, AVX512VL),
    FeatureDep::new(AMX_INT8, AMX_TILE),
    FeatureDep::new(AMX_BF16, AMX_TILE),
    FeatureDep::new(AMX_FP16, AMX_TILE),
    FeatureDep::new(AMX_COMPLEX, AMX_TILE),
    FeatureDep::new(SSE4A, SSE3),
    FeatureDep::new(XOP, FMA4),
    FeatureDep::new(FMA4, AVX),
    FeatureDep::new(FMA4, SSE4A),
    FeatureDep::new(XSAVEOPT, XSAVE),
    FeatureDep::new(XSAVEC, XSAVE),
    FeatureDep::new(XSAVES, XSAVE),
    FeatureDep::new(SHA512, AVX2),
    FeatureDep::new(SM3, AVX),
    FeatureDep::new(SM4, AVX2),
];

/// Mask of every bit the registry recognizes.
pub const KNOWN: Features = known_mask();

const fn known_mask() -> Features {
    let mut mask = Features::new();
    let mut i = 0;
    while i < FEATURE_NAMES.len() {
        mask = mask.with_bit(FEATURE_NAMES[i].bit);
        i += 1;
    }
    mask
}

/// Bits the backend never benefits from, cleared from every resolved
/// target independent of the host (record replay also refuses them).
pub const DENY: Features = Features::with_bits(&[RDRND, RDSEED, RTM, XSAVEOPT]);

/// The AVX-512 register file group, cleared as a whole when the operating
/// environment does not save the wider state or when narrowing to 32-byte
/// vectors at call boundaries.
pub const AVX512_GROUP: Features = Features::with_bits(&[
    AVX512F,
    AVX512DQ,
    AVX512IFMA,
    AVX512CD,
    AVX512BW,
    AVX512VL,
    AVX512VBMI,
    AVX512VPOPCNTDQ,
    AVX512VBMI2,
    AVX512VNNI,
    AVX512BITALG,
    AVX512VP2INTERSECT,
    AVX512BF16,
]);

/// The AVX register file group, including every extension that only exists
/// on top of the 32-byte registers and the xsave family that carries them.
pub const AVX_GROUP: Features = Features::with_bits(&[
    AVX, FMA, F16C, XSAVE, AVX2, XOP, FMA4, XSAVEOPT, XSAVEC, XSAVES, VAES, VPCLMULQDQ,
]);

/// The AMX tile group, gated on its own extended-state components.
pub const AMX_GROUP: Features = Features::with_bits(&[AMX_BF16, AMX_TILE, AMX_INT8]);

/// Multiply-add family for the clone decision.
pub const CLONE_MATH: Features = Features::with_bits(&[FMA, FMA4]);

/// Wide-SIMD family for the clone decision. Disjoint from the float16 and
/// bfloat16 families; those carry their own clone flags.
pub const CLONE_SIMD: Features = Features::with_bits(&[
    SSE3,
    SSSE3,
    SSE41,
    SSE42,
    AVX,
    AVX2,
    VAES,
    VPCLMULQDQ,
    SSE4A,
    AVX512F,
    AVX512DQ,
    AVX512IFMA,
    AVX512CD,
    AVX512BW,
    AVX512VL,
    AVX512VBMI,
    AVX512VPOPCNTDQ,
    AVXVNNI,
    AVX512VBMI2,
    AVX512VNNI,
    AVX512BITALG,
    AVX512VP2INTERSECT,
]);

/// Half-precision-float family for the clone decision.
pub const CLONE_FP16: Features = Features::with_bits(&[AVX512FP16]);

/// Brain-float16 family for the clone decision.
pub const CLONE_BF16: Features = Features::with_bits(&[AVX512BF16]);
