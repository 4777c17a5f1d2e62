// This module provides the build-once owner of the process's resolved target list.
// TargetSession is created from an ArchTables bundle plus the detected host and is the
// single entry point for the three ways a target list comes to exist: bootstrapping
// from requested records alone (no precompiled image), initializing against a primary
// image's embedded target list (picking the compatible variant and reconciling the
// vector width with what was actually compiled), and building the target list for a
// new image. Incrementally loaded secondary images are then matched against the one
// running target. The list is built exactly once and read-only afterwards; building it
// twice, matching a secondary image before initialization, or matching one while more
// than one running target exists are programming-contract violations and abort the
// process with a clear diagnostic rather than returning an error. Only genuinely
// recoverable conditions (malformed payloads, no compatible variant) surface as
// Results. Keeping the state in an explicit value threaded by the caller, rather than
// in ambient process-wide globals, is deliberate.

//! Build-once ownership of the resolved target list.

use crate::core::backend::{backend_target, BackendTarget};
use crate::core::bitset::disable_depends;
use crate::core::clone::annotate_clone_flags;
use crate::core::error::SessionError;
use crate::core::matcher::{match_targets, reconcile_width};
use crate::core::registry::{ArchTables, HostInfo};
use crate::core::resolver::resolve_target;
use crate::core::serialize::deserialize_targets;
use crate::core::target::TargetData;

/// Owner of the running process's resolved targets.
pub struct TargetSession<'a, const N: usize> {
    tables: &'a ArchTables<'a, N>,
    host: HostInfo<N>,
    targets: Vec<TargetData<N>>,
}

impl<'a, const N: usize> TargetSession<'a, N> {
    pub fn new(tables: &'a ArchTables<'a, N>, host: HostInfo<N>) -> Self {
        Self {
            tables,
            host,
            targets: Vec::new(),
        }
    }

    /// The detected host this session resolves against.
    pub fn host(&self) -> &HostInfo<N> {
        &self.host
    }

    pub fn is_initialized(&self) -> bool {
        !self.targets.is_empty()
    }

    /// The resolved target list. Empty until initialized.
    pub fn targets(&self) -> &[TargetData<N>] {
        &self.targets
    }

    /// The target the process is running as.
    ///
    /// Panics when the list has not been built yet.
    pub fn running(&self) -> &TargetData<N> {
        self.targets
            .first()
            .expect("target list not initialized")
    }

    /// Bootstrap the target list from requests alone, with no precompiled
    /// image to match. Does nothing when the list already exists.
    pub fn ensure_targets(&mut self, requests: &[TargetData<N>]) {
        if self.is_initialized() {
            return;
        }
        let mut targets = self.resolve_requests(requests);
        annotate_clone_flags(self.tables, &mut targets);
        self.targets = targets;
    }

    /// Initialize against a primary image's embedded target list: resolve
    /// the first requested target clamped to the host, pick the compatible
    /// image entry, reconcile the vector width and freeze the running
    /// target. Returns the matched entry index.
    ///
    /// Panics when the target list was already built, when the image carries
    /// no entries, or when the host lacks the portability-floor feature that
    /// every image entry requires.
    pub fn init_from_image(
        &mut self,
        requests: &[TargetData<N>],
        image: &[u8],
    ) -> Result<usize, SessionError> {
        assert!(
            !self.is_initialized(),
            "target list already initialized"
        );
        let mut requested = self.resolve_requests(requests);
        let mut target = requested.swap_remove(0);

        let candidates = self.decode_image(image)?;
        self.check_portability_floor(&candidates, &target);

        let result = match_targets(self.tables, &candidates, &target);
        let Some(best) = result.best else {
            return Err(SessionError::Incompatible(
                result.rejection.expect("rejection diagnostic"),
            ));
        };
        reconcile_width(
            self.tables,
            &candidates[best],
            result.vector_width,
            &mut target,
        );
        self.targets.push(target);
        Ok(best)
    }

    /// Match an incrementally loaded image's target list against the one
    /// already-fixed running target. Returns the matched entry index.
    ///
    /// Panics when the running list has not been built yet or holds more
    /// than one target; exactly one running target is this mode's contract.
    pub fn match_package_image(&self, image: &[u8]) -> Result<usize, SessionError> {
        assert!(self.is_initialized(), "target list not initialized");
        assert!(
            self.targets.len() == 1,
            "expected exactly one running target, have {}",
            self.targets.len()
        );
        let candidates = self.decode_image(image)?;
        let result = match_targets(self.tables, &candidates, &self.targets[0]);
        result.best.ok_or_else(|| {
            SessionError::Incompatible(result.rejection.expect("rejection diagnostic"))
        })
    }

    /// Build the target list for a new precompiled image.
    ///
    /// Shares the resolution and clone-flag procedure with the live paths
    /// above, then drops feature bits the active toolchain does not know
    /// and re-closes prerequisites, so the serialized list and the emitted
    /// code agree on what got cloned.
    pub fn image_targets(&self, requests: &[TargetData<N>]) -> Vec<TargetData<N>> {
        let mut targets = self.resolve_requests(requests);
        annotate_clone_flags(self.tables, &mut targets);
        for target in &mut targets {
            for feature in self.tables.features {
                if feature.min_toolchain > self.tables.toolchain_version {
                    target.enabled.unset(feature.bit);
                    target.disabled.unset(feature.bit);
                }
            }
            disable_depends(&mut target.enabled, self.tables.deps);
        }
        targets
    }

    /// Backend name and feature tokens for one resolved target.
    pub fn backend_target(&self, target: &TargetData<N>) -> BackendTarget {
        backend_target(self.tables, target, self.tables.toolchain_version)
    }

    /// Whether the running target can fuse multiply-add at the given float
    /// width.
    pub fn has_fma(&self, bits: u32) -> bool {
        (bits == 32 || bits == 64)
            && !(self.running().enabled & self.tables.clone_math).is_empty()
    }

    /// Resolve a request list: normalize names, clamp the first entry to the
    /// host, resolve the rest unclamped.
    fn resolve_requests(&self, requests: &[TargetData<N>]) -> Vec<TargetData<N>> {
        assert!(!requests.is_empty(), "no targets specified");
        let mut out = Vec::with_capacity(requests.len());
        for request in requests {
            let mut request = request.clone();
            if let Some(canonical) = self.tables.normalize_name(&request.name) {
                request.name = canonical.to_string();
            }
            let clamp = out.is_empty();
            out.push(resolve_target(self.tables, &self.host, &request, clamp));
        }
        out
    }

    fn decode_image(&self, image: &[u8]) -> Result<Vec<TargetData<N>>, SessionError> {
        let mut candidates = deserialize_targets::<N>(image)?;
        assert!(!candidates.is_empty(), "image contains no targets");
        for candidate in &mut candidates {
            if let Some(canonical) = self.tables.normalize_name(&candidate.name) {
                candidate.name = canonical.to_string();
            }
        }
        Ok(candidates)
    }

    /// Unless the image itself ships an entry that goes without the floor
    /// feature, a host lacking it cannot run this image at all.
    fn check_portability_floor(&self, candidates: &[TargetData<N>], target: &TargetData<N>) {
        let Some(floor) = self.tables.floor_bit else {
            return;
        };
        let image_requires_floor = candidates
            .iter()
            .all(|candidate| candidate.enabled.test(floor));
        if image_requires_floor && !target.enabled.test(floor) {
            let name = self
                .tables
                .feature_name(floor)
                .unwrap_or("an unnamed baseline feature");
            panic!(
                "this processor does not support the {name} feature required by this image; \
                 this is often due to running inside a virtualized environment"
            );
        }
    }
}
