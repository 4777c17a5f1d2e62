// This module serves as the central hub for the architecture-agnostic half of the
// engine. It organizes the subsystems every architecture shares: the fixed-width
// feature bit vector with its dependency-closure algorithms (bitset), the static
// feature/microarchitecture registries and the ArchTables seam (registry), target
// descriptions and flag words (target), the ordered per-target resolution procedure
// (resolver), the clone-flag decision engine driving multiversioning (clone), the
// best-compatible-variant matcher with vector-width reconciliation (matcher), the
// self-describing binary target-list format (serialize), the build-once session owning
// the process's resolved list (session), and the backend target-string handoff
// (backend). Everything here is pure, bounded computation over fixed-size data; the
// only process-wide state is whatever session value the caller chooses to keep.

//! Architecture-agnostic target resolution engine.
//!
//! # Key Components
//!
//! ## Bitset Engine (`bitset`)
//! - Fixed-width [`FeatureVector`] value type
//! - Forward/backward dependency closures iterated to a fixed point
//!
//! ## Registries (`registry`)
//! - Feature and microarchitecture tables behind the [`ArchTables`] seam
//! - Alias normalization and the toolchain fallback walk
//!
//! ## Resolution (`resolver`, `clone`)
//! - Requested record to finalized enabled/disabled sets
//! - Clone-flag annotation shared by live and image-build paths
//!
//! ## Matching (`matcher`)
//! - Subset-qualification, most-specific-wins selection
//! - Vector-width reconciliation at call boundaries
//!
//! ## Persistence (`serialize`, `session`)
//! - Width-checked binary target lists
//! - Build-once [`TargetSession`] with the image entry points

pub mod backend;
pub mod bitset;
pub mod clone;
pub mod error;
pub mod matcher;
pub mod registry;
pub mod resolver;
pub mod serialize;
pub mod session;
pub mod target;

pub use backend::{backend_target, disasm_target, BackendTarget};
pub use bitset::{disable_depends, enable_depends, FeatureDep, FeatureVector};
pub use clone::annotate_clone_flags;
pub use error::{DecodeError, Rejection, SessionError};
pub use matcher::{match_targets, reconcile_width, MatchResult};
pub use registry::{ArchTables, CpuSpec, FeatureName, HostInfo};
pub use resolver::resolve_target;
pub use serialize::{deserialize_targets, serialize_targets};
pub use session::TargetSession;
pub use target::{TargetData, TargetFlags};
