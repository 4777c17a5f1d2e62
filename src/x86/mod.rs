//! x86 architecture data and host probing.
//!
//! This module contains all x86 specific pieces:
//! - Feature bit assignments, dependency pairs and feature groups
//! - The microarchitecture table with baselines, aliases and fallbacks
//! - Vendor/family/model classification tables
//! - The cpuid-backed capability probe and the memoized host
//!
//! [`TABLES`] bundles the static data for the architecture-agnostic engine;
//! everything in [`crate::core`] consumes it and nothing else from here.

pub mod classify;
pub mod cpus;
pub mod features;
pub mod probe;

pub use classify::{classify, Vendor};
pub use cpus::{Cpu, ALIASES, CPU_SPECS};
pub use features::{bits, Features, DEPS, FEATURE_NAMES, FEATURE_WORDS, KNOWN, TOOLCHAIN_VERSION};
pub use probe::{detect_host, host, host_has_feature, CapabilityProbe, HardwareProbe, HostCapability};

use crate::core::registry::{ArchTables, HostInfo};

#[cfg(target_pointer_width = "64")]
const BACKEND_GENERIC_NAME: &str = "x86-64";
#[cfg(target_pointer_width = "32")]
const BACKEND_GENERIC_NAME: &str = "pentium4";

/// Minimum required extensions for the target pointer width, always handed
/// to the backend. The 64bit token guards against feature-based
/// architecture guesses under virtualization.
#[cfg(target_pointer_width = "64")]
const BASE_TOKENS: &[&str] = &["+sse2", "+mmx", "+fxsr", "+64bit", "+cx8"];
#[cfg(target_pointer_width = "32")]
const BASE_TOKENS: &[&str] = &["+sse2", "+mmx", "+fxsr", "+cx8"];

// cx16 is the portability floor on 64-bit; 32-bit images never require it.
#[cfg(target_pointer_width = "64")]
const FLOOR_BIT: Option<u32> = Some(bits::CX16);
#[cfg(target_pointer_width = "32")]
const FLOOR_BIT: Option<u32> = None;

/// The x86 table bundle consumed by the engine.
pub static TABLES: ArchTables<'static, FEATURE_WORDS> = ArchTables {
    features: FEATURE_NAMES,
    deps: DEPS,
    cpus: CPU_SPECS,
    aliases: ALIASES,
    known: KNOWN,
    deny: features::DENY,
    clone_math: features::CLONE_MATH,
    clone_simd: features::CLONE_SIMD,
    clone_fp16: features::CLONE_FP16,
    clone_bf16: features::CLONE_BF16,
    clone_all_names: &["knl", "knm"],
    width64_group: features::AVX512_GROUP,
    width32_group: features::AVX_GROUP,
    vec64_bit: bits::AVX512F,
    vec32_bit: bits::AVX,
    min_vector_width: 16,
    floor_bit: FLOOR_BIT,
    generic_name: "generic",
    backend_generic_name: BACKEND_GENERIC_NAME,
    base_tokens: BASE_TOKENS,
    toolchain_version: TOOLCHAIN_VERSION,
};

/// The x86 table bundle.
pub fn tables() -> &'static ArchTables<'static, FEATURE_WORDS> {
    &TABLES
}

/// Host identity for the engine, from the memoized probe result.
pub fn host_info() -> HostInfo<FEATURE_WORDS> {
    let detected = host();
    HostInfo {
        name: TABLES.cpu_name(detected.cpu.id()).to_string(),
        features: detected.features,
    }
}

/// Host identity from an explicit capability, for callers that probed
/// through their own [`CapabilityProbe`].
pub fn host_info_from(capability: &HostCapability) -> HostInfo<FEATURE_WORDS> {
    HostInfo {
        name: TABLES.cpu_name(capability.cpu.id()).to_string(),
        features: capability.features,
    }
}
