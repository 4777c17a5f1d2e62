//! cpu-targets - CPU feature resolution for function multiversioning.
//!
//! This crate decides, for one running machine and one set of requested
//! targets, which instruction-set capabilities a code generator may use and
//! how many specialized clones of performance-sensitive code have to be
//! produced so that a single compiled image runs correctly and fast across
//! heterogeneous hardware.
//!
//! # Primary Usage
//!
//! ```ignore
//! use cpu_targets::{TargetData, TargetSession};
//! use cpu_targets::x86;
//!
//! // Resolve the requested targets against the running host.
//! let mut session = TargetSession::new(x86::tables(), x86::host_info());
//! session.ensure_targets(&[TargetData::request("native", &[], &[], "")]);
//!
//! // Pick the compatible entry of a precompiled image's target list.
//! let best = session.init_from_image(&requests, image_bytes)?;
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Architecture-agnostic engine (bitsets, dependency closures,
//!   target resolution, clone decisions, list matching, serialization)
//! - [`x86`] - x86 feature/microarchitecture tables and the cpuid-backed
//!   host capability probe
//!
//! The engine is purely data-driven: every core operation consumes an
//! [`core::ArchTables`] bundle, so the resolution and matching logic carries
//! no x86 knowledge and can be unit-tested with toy tables.

pub mod core;
pub mod x86;

// Re-export common types from organized modules
pub use crate::core::{
    // Bitset engine
    FeatureDep, FeatureVector,
    // Static tables and registries
    ArchTables, CpuSpec, FeatureName, HostInfo,
    // Targets
    TargetData, TargetFlags,
    // Resolution pipeline
    annotate_clone_flags, resolve_target,
    // Matching
    match_targets, MatchResult, Rejection,
    // Serialization
    deserialize_targets, serialize_targets, DecodeError,
    // Session management
    SessionError, TargetSession,
    // Backend handoff
    backend_target, disasm_target, BackendTarget,
};
