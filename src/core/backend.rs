//! Backend-facing target strings.
//!
//! The backend consumes a microarchitecture name plus an ordered list of
//! `+feature`/`-feature` tokens. The name is fallback-walked until the
//! active toolchain recognizes it; feature tokens whose minimum toolchain
//! version exceeds the active toolchain are filtered out entirely. Enabled
//! features are prepended, disabled features appended, baseline tokens for
//! the target pointer width always appended, and opaque extension tokens
//! appended verbatim at the very end.

use crate::core::registry::ArchTables;
use crate::core::target::TargetData;

/// A target as the backend wants to see it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendTarget {
    /// Microarchitecture name the toolchain recognizes.
    pub cpu: String,
    /// Ordered feature tokens.
    pub features: Vec<String>,
}

impl BackendTarget {
    /// Feature tokens joined into one comma-separated attribute string.
    pub fn features_str(&self) -> String {
        self.features.join(",")
    }
}

/// Produce the backend name and feature tokens for one resolved target.
pub fn backend_target<const N: usize>(
    tables: &ArchTables<'_, N>,
    target: &TargetData<N>,
    toolchain: u32,
) -> BackendTarget {
    let mut cpu = tables
        .compatible_cpu_name(&target.name, toolchain)
        .unwrap_or(target.name.as_str())
        .to_string();
    if cpu == tables.generic_name {
        // The featureless name means different baselines to different
        // backends; hand over what this target pointer width requires.
        cpu = tables.backend_generic_name.to_string();
    }

    let mut features = Vec::new();
    for feature in tables.features {
        if feature.min_toolchain > toolchain {
            continue;
        }
        if target.enabled.test(feature.bit) {
            features.insert(0, format!("+{}", feature.name));
        } else if target.disabled.test(feature.bit) {
            features.push(format!("-{}", feature.name));
        }
    }
    for token in tables.base_tokens {
        features.push(token.to_string());
    }
    for ext in target
        .ext_features
        .split(',')
        .filter(|token| !token.is_empty())
    {
        features.push(ext.to_string());
    }
    BackendTarget { cpu, features }
}

/// Target string for disassembler configuration: the featureless name with
/// every recognized feature enabled, so any encountered instruction decodes.
pub fn disasm_target<const N: usize>(tables: &ArchTables<'_, N>) -> BackendTarget {
    let target = TargetData::<N> {
        name: tables.generic_name.to_string(),
        enabled: tables.known,
        disabled: Default::default(),
        ext_features: String::new(),
        flags: Default::default(),
        base: 0,
    };
    backend_target(tables, &target, tables.toolchain_version)
}
