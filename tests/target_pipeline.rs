//! End-to-end tests of the target resolution pipeline.
//!
//! These drive the real x86 tables through a synthetic capability probe, so
//! the behavior is identical on every build machine: probe -> resolve ->
//! clone decisions -> serialization -> image matching.

use std::collections::HashMap;

use cpu_targets::core::{
    match_targets, serialize_targets, SessionError, TargetData, TargetFlags, TargetSession,
};
use cpu_targets::x86::{self, bits, CapabilityProbe, Features};

const SIG_INTEL: u32 = 0x756e_6547;

struct FakeProbe {
    leaves: HashMap<(u32, u32), (u32, u32, u32, u32)>,
    xcr0: u64,
}

impl CapabilityProbe for FakeProbe {
    fn cpuid(&self, leaf: u32, subleaf: u32) -> (u32, u32, u32, u32) {
        self.leaves
            .get(&(leaf, subleaf))
            .copied()
            .unwrap_or((0, 0, 0, 0))
    }

    fn xcr0(&self) -> u64 {
        self.xcr0
    }
}

fn word_bits(bits: &[u32]) -> u32 {
    bits.iter().fold(0, |acc, b| acc | (1 << b))
}

/// A Haswell desktop machine with AVX enabled by the OS.
fn haswell_machine() -> FakeProbe {
    let mut leaves = HashMap::new();
    let version = (6 << 8) | (0xc << 4) | (0x3 << 16); // family 6, model 0x3c
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
    leaves.insert((7, 0), (0, word_bits(&[0, 3, 5, 8]), 0, 0));
    leaves.insert((0xd, 1), (word_bits(&[0]), 0, 0, 0));
    leaves.insert((0x8000_0000, 0), (0x8000_0008, 0, 0, 0));
    leaves.insert((0x8000_0001, 0), (0, 0, word_bits(&[0, 5]), 0));
    FakeProbe {
        leaves,
        xcr0: 0x7,
    }
}

/// A Cascade Lake server with the full AVX-512 state saved by the OS.
fn cascadelake_machine() -> FakeProbe {
    let mut probe = haswell_machine();
    let version = (6 << 8) | (0x5 << 4) | (0x5 << 16); // family 6, model 0x55
    probe.leaves.get_mut(&(1, 0)).unwrap().0 = version;
    probe.leaves.insert(
        (7, 0),
        (
            0,
            word_bits(&[0, 3, 5, 8, 16, 17, 18, 19, 23, 24, 28, 30, 31]),
            word_bits(&[4, 11]),
            0,
        ),
    );
    probe.leaves.insert((0xd, 1), (word_bits(&[0, 1, 3]), 0, 0, 0));
    probe.xcr0 = 0xe7;
    probe
}

fn haswell_session() -> TargetSession<'static, { x86::FEATURE_WORDS }> {
    let capability = x86::detect_host(&haswell_machine());
    TargetSession::new(x86::tables(), x86::host_info_from(&capability))
}

fn cascadelake_session() -> TargetSession<'static, { x86::FEATURE_WORDS }> {
    let capability = x86::detect_host(&cascadelake_machine());
    TargetSession::new(x86::tables(), x86::host_info_from(&capability))
}

fn request(name: &str) -> TargetData<{ x86::FEATURE_WORDS }> {
    TargetData::request(name, &[], &[], "")
}

#[test]
fn test_detection_names_the_microarchitecture() {
    let capability = x86::detect_host(&haswell_machine());
    let host = x86::host_info_from(&capability);
    assert_eq!(host.name, "haswell");
    assert!(host.features.test(bits::AVX2));
    assert!(host.features.test(bits::FMA));
    assert!(!host.features.test(bits::AVX512F));
}

#[test]
fn test_clone_flags_for_haswell_over_generic() {
    let mut session = haswell_session();
    session.ensure_targets(&[request("generic"), request("haswell")]);
    let targets = session.targets();
    assert_eq!(targets[0].flags & TargetFlags::CLONE_ALL, TargetFlags::empty());
    let flags = targets[1].flags;
    assert!(flags.contains(TargetFlags::CLONE_CPU));
    assert!(flags.contains(TargetFlags::CLONE_LOOP));
    // fma is new over generic, and so is plenty of SIMD.
    assert!(flags.contains(TargetFlags::CLONE_MATH));
    assert!(flags.contains(TargetFlags::CLONE_SIMD));
    assert!(!flags.contains(TargetFlags::CLONE_FLOAT16));
    assert!(!flags.contains(TargetFlags::CLONE_BFLOAT16));
}

#[test]
fn test_knights_landing_outlier_clones_everything() {
    let mut session = haswell_session();
    session.ensure_targets(&[request("generic"), request("knl")]);
    assert!(session.targets()[1].flags.contains(TargetFlags::CLONE_ALL));
}

#[test]
fn test_resolved_targets_honor_complement_invariant() {
    let mut session = haswell_session();
    session.ensure_targets(&[request("generic"), request("skylake"), request("znver4")]);
    for target in session.targets() {
        assert!((target.enabled & target.disabled).is_empty());
        assert_eq!(target.enabled | target.disabled, x86::KNOWN);
    }
}

#[test]
fn test_image_roundtrip_and_startup_match() {
    // Build an image offline, then start a process against it.
    let build_session = haswell_session();
    let image_targets =
        build_session.image_targets(&[request("generic"), request("sandybridge"), request("haswell")]);
    let image = serialize_targets(&image_targets);

    let mut session = haswell_session();
    let best = session.init_from_image(&[request("native")], &image).unwrap();
    // The haswell entry is the most specific one this host can run.
    assert_eq!(best, 2);
    assert_eq!(session.running().name, "haswell");

    // An incrementally loaded image matches against the running target.
    let pkg_targets = build_session.image_targets(&[request("generic"), request("skylake-avx512")]);
    let pkg = serialize_targets(&pkg_targets);
    assert_eq!(session.match_package_image(&pkg).unwrap(), 0);
}

#[test]
fn test_startup_rejection_names_the_blocking_feature() {
    // Built on an AVX-512 machine, started on one without it.
    let build_session = cascadelake_session();
    let image_targets = build_session.image_targets(&[request("skylake-avx512")]);
    let image = serialize_targets(&image_targets);

    let mut session = haswell_session();
    let err = session
        .init_from_image(&[request("native")], &image)
        .unwrap_err();
    match err {
        SessionError::Incompatible(rejection) => {
            assert_eq!(rejection.candidate, "skylake-avx512");
            assert!(rejection.missing.starts_with("avx512"));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_vector_width_matches_spec_precedence() {
    // A baseline-only candidate against a requester with avx2: the match
    // succeeds, its width is that of the matched entry, and without a
    // vector calling convention the requester keeps its own width.
    let tables = x86::tables();
    let candidates = vec![
        request("generic"),
        TargetData::request("skylake-avx512", &[bits::AVX512F], &[], ""),
    ];
    let requester = TargetData::request(
        "haswell",
        &[bits::SSE3, bits::SSE42, bits::AVX, bits::AVX2],
        &[],
        "",
    );
    let result = match_targets(tables, &candidates, &requester);
    assert_eq!(result.best, Some(0));
    assert_eq!(result.vector_width, 16);
    assert_eq!(tables.vector_width(&requester.enabled), 32);
}

#[test]
fn test_vec_call_narrows_running_target() {
    let build_session = haswell_session();
    let mut image_targets = build_session.image_targets(&[request("generic")]);
    image_targets[0].flags |= TargetFlags::VEC_CALL;
    let image = serialize_targets(&image_targets);

    let mut session = haswell_session();
    session.init_from_image(&[request("native")], &image).unwrap();
    // The image was compiled for 16-byte vectors at call boundaries; the
    // running target gives up its AVX group to agree with it.
    let running = session.running();
    assert!(!running.enabled.test(bits::AVX));
    assert!(!running.enabled.test(bits::AVX2));
    assert!(!running.enabled.test(bits::FMA));
    assert!(running.enabled.test(bits::SSE42));
}

#[test]
fn test_backend_strings_walk_fallbacks_and_filter_gates() {
    let session = haswell_session();
    // znver5 needs a newer toolchain than this build drives; the name walks
    // down to znver4. An explicitly requested feature above the gate is
    // dropped from the image and the string.
    let targets = session.image_targets(&[request("generic"), {
        TargetData::request("znver5", &[bits::SM3], &[], "")
    }]);
    let backend = session.backend_target(&targets[1]);
    assert_eq!(backend.cpu, "znver4");
    let features = backend.features_str();
    assert!(features.contains("+avx512bf16"));
    assert!(!features.contains("sm3"));
    assert!(features.contains("+sse2"));
    assert!(features.contains("+cx8"));
    assert!(!targets[1].enabled.test(bits::SM3));
}

#[test]
fn test_generic_translates_and_ext_features_survive() {
    let mut session = haswell_session();
    session.ensure_targets(&[TargetData::request("generic", &[], &[], "+fancyext")]);
    let backend = session.backend_target(session.running());
    assert_ne!(backend.cpu, "generic");
    assert!(backend.features_str().ends_with("+fancyext"));
}

#[test]
fn test_alias_names_resolve_like_canonical() {
    let mut session = haswell_session();
    session.ensure_targets(&[request("core-avx2")]);
    assert_eq!(session.running().name, "haswell");
    assert!(!session.running().has_unknown_name());
}

#[test]
fn test_unknown_name_is_soft() {
    let mut session = haswell_session();
    session.ensure_targets(&[request("sufficiently-new-cpu")]);
    let running = session.running();
    assert!(running.has_unknown_name());
    assert_eq!(running.name, "sufficiently-new-cpu");
}

#[test]
fn test_width_mismatched_image_is_rejected() {
    // A payload claiming a different word count must fail outright, not be
    // partially interpreted.
    let mut bytes = serialize_targets(&[request("generic")]);
    bytes[0] = (x86::FEATURE_WORDS as u8) + 1;
    let mut session = haswell_session();
    let err = session.init_from_image(&[request("native")], &bytes).unwrap_err();
    assert!(matches!(err, SessionError::Decode(_)));
}

#[test]
fn test_host_feature_query_is_bounded() {
    // Out-of-range bits answer false instead of reading out of bounds.
    assert!(!x86::host_has_feature(u32::MAX));
    let _ = x86::host_has_feature(bits::SSE3);
}

#[test]
fn test_scenario_native_only_is_plain() {
    let mut session = haswell_session();
    session.ensure_targets(&[request("native")]);
    let running = session.running();
    assert_eq!(running.name, "haswell");
    // Denied bits never survive resolution even when the hardware has them.
    assert!(!running.enabled.test(bits::RDRND));
    assert!(!running.enabled.test(bits::XSAVEOPT));
    // Single-target lists clone nothing.
    assert_eq!(running.flags & TargetFlags::CLONE_LOOP, TargetFlags::empty());
    let empty = Features::new();
    assert_ne!(running.enabled, empty);
}
