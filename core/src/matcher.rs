//! The Installer Matcher (§4.H): pairs each newly-parsed `Installer`
//! with at most one existing `Installer` from the prior manifest.

use crate::errors::{AmbiguousInstaller, CoreError, CoreResult, UnmatchedInstaller};
use crate::parser::{ParsedInstaller, UrlParseReport};
use pkgforge_schema::model::{CompatibilityClass, Installer, InstallerManifest, InstallerType};

/// One `new[i] -> existing[j]` pairing the Matcher produced.
#[derive(Debug, Clone, Copy)]
pub struct Match {
    /// Index into the new (just-parsed) installer slice.
    pub new_index: usize,
    /// Index into the existing manifest's installer slice.
    pub existing_index: usize,
}

fn effective_type(installer: &Installer, manifest: &InstallerManifest) -> Option<InstallerType> {
    installer.installer_type.or(manifest.installer_type)
}

/// The architecture key the Matcher narrows candidates by (§4.H tier
/// 2): override, then URL-derived, then binary-detected, then
/// whatever ended up on the new record itself.
fn architecture_key(report: &UrlParseReport, installer: &Installer) -> Option<pkgforge_schema::model::Architecture> {
    report
        .override_arch
        .or(report.url_arch)
        .or(report.binary_arch)
        .or(installer.architecture)
}

/// Pair every new installer with an existing one. `new` and `existing`
/// must have equal length (checked here, not by the caller).
pub fn match_installers(
    new: &[ParsedInstaller],
    existing_manifest: &InstallerManifest,
    override_scope: &[Option<pkgforge_schema::model::Scope>],
) -> CoreResult<Vec<Match>> {
    let existing = &existing_manifest.installers;
    if new.len() != existing.len() {
        return Err(CoreError::CountMismatch {
            new_count: new.len(),
            existing_count: existing.len(),
        });
    }

    let mut taken = vec![false; existing.len()];
    let mut matches = Vec::with_capacity(new.len());
    let mut unmatched = Vec::new();
    let mut ambiguous = Vec::new();
    let mut override_in_effect = false;

    for (new_index, parsed) in new.iter().enumerate() {
        let scope_override = override_scope.get(new_index).copied().flatten();
        if parsed.report.override_arch.is_some() || scope_override.is_some() {
            override_in_effect = true;
        }

        let mut candidates: Vec<usize> = (0..existing.len()).filter(|&i| !taken[i]).collect();

        // Tier 1: exact installer-type match, falling back to the
        // same compatibility class when no exact match survives.
        let new_type = parsed.installer.installer_type;
        let exact: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| effective_type(&existing[i], existing_manifest) == new_type)
            .collect();
        if !exact.is_empty() {
            candidates = exact;
        } else if let Some(new_type) = new_type {
            if let Some(class) = new_type.compatibility_class() {
                candidates = candidates
                    .into_iter()
                    .filter(|&i| {
                        effective_type(&existing[i], existing_manifest)
                            .and_then(InstallerType::compatibility_class)
                            == Some(class)
                    })
                    .collect();
            } else {
                candidates.clear();
            }
        }

        // Tier 2: architecture narrowing. Unconditional, like tier 1 —
        // a tier-1 match on type alone can still pair the wrong
        // architecture if it's left unchecked.
        let key = architecture_key(&parsed.report, &parsed.installer);
        if let Some(key) = key {
            let narrowed: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|&i| existing[i].architecture == Some(key))
                .collect();
            if !narrowed.is_empty() {
                candidates = narrowed;
            }
        }

        // Tier 3: scope narrowing, only consulted if still ambiguous.
        if candidates.len() > 1 {
            if let Some(scope) = scope_override {
                let narrowed: Vec<usize> = candidates
                    .iter()
                    .copied()
                    .filter(|&i| existing[i].scope == Some(scope))
                    .collect();
                if !narrowed.is_empty() {
                    candidates = narrowed;
                }
            }
        }

        match candidates.len() {
            1 => {
                let existing_index = candidates[0];
                taken[existing_index] = true;
                matches.push(Match { new_index, existing_index });
            }
            0 => unmatched.push(UnmatchedInstaller {
                installer_url: parsed.installer.installer_url.clone(),
                architecture: parsed.installer.architecture,
            }),
            _ => ambiguous.push(AmbiguousInstaller {
                installer_url: parsed.installer.installer_url.clone(),
                candidate_existing_urls: candidates.iter().map(|&i| existing[i].installer_url.clone()).collect(),
            }),
        }
    }

    if !unmatched.is_empty() || !ambiguous.is_empty() {
        return Err(CoreError::InstallerMatchError {
            unmatched,
            ambiguous,
            override_in_effect,
        });
    }

    Ok(matches)
}
