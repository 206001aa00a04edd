//! The Manifest Merger (§4.I): applies a completed [`Match`] set to an
//! existing [`ManifestTree`], producing the updated tree the caller
//! will serialize back out. Never touches the filesystem itself.

use crate::errors::{CoreError, CoreResult};
use crate::matcher::Match;
use crate::parser::ParsedInstaller;
use pkgforge_schema::model::{Installer, ManifestTree};

/// Per-pair field rules (§4.I). Applied to a clone of the existing
/// installer; everything not named here is left untouched.
fn apply_pair(existing: &mut Installer, new: &Installer) {
    existing.installer_url = new.installer_url.clone();
    existing.installer_sha256 = new.installer_sha256.clone();
    existing.signature_sha256 = new.signature_sha256.clone();
    existing.architecture = new.architecture;

    if new.product_code.is_some() {
        existing.product_code = new.product_code.clone();
    }
    if new.minimum_os_version.is_some() {
        existing.minimum_os_version = new.minimum_os_version.clone();
    }
    if new.package_family_name.is_some() {
        existing.package_family_name = new.package_family_name.clone();
    }
    if !new.nested_installer_files.is_empty() {
        existing.nested_installer_files = new.nested_installer_files.clone();
    }
    if !new.platform.is_empty() {
        existing.platform = new.platform.clone();
    }
}

/// A caller's request to replace the version currently on disk rather
/// than add a new one alongside it. The merger records which files
/// that implies deleting; it never deletes them.
#[derive(Debug, Clone, Default)]
pub struct ReplaceRequest {
    /// Whether this update should replace the prior version's files
    /// rather than add a new version alongside it.
    pub replace_existing_version: bool,
    /// File names of the version being replaced, already serialized
    /// on disk under its own version directory. Populated by the
    /// caller (`lib::update`) from the prior `serialize` call, not
    /// derived here.
    pub existing_version_files: Vec<String>,
}

/// Files the caller should delete after writing out the updated tree,
/// when a "replace existing version" update was requested. Empty for
/// an ordinary side-by-side update.
#[derive(Debug, Clone, Default)]
pub struct DeletionPlan {
    /// File names to remove, relative to the prior version's
    /// directory. The merger computes this list; it never deletes
    /// anything itself.
    pub files_to_delete: Vec<String>,
}

/// Apply `matches` to `existing`, replacing `new_package_version` at
/// the tree level and running the per-pair field rules for each
/// matched installer. `new` must be the same slice the Matcher was
/// given (matches index into it by `new_index`).
pub fn apply_updates(
    mut existing: ManifestTree,
    new: &[ParsedInstaller],
    matches: &[Match],
    new_package_version: &str,
    replace: &ReplaceRequest,
) -> CoreResult<(ManifestTree, DeletionPlan)> {
    for m in matches {
        apply_pair(&mut existing.installer.installers[m.existing_index], &new[m.new_index].installer);
    }

    propagate_package_version(&mut existing, new_package_version)?;

    let plan = DeletionPlan {
        files_to_delete: if replace.replace_existing_version {
            replace.existing_version_files.clone()
        } else {
            Vec::new()
        },
    };

    Ok((existing, plan))
}

/// `package_version` propagates to every manifest file in the tree
/// (§4.I). `package_identifier` is read-only; a caller that somehow
/// changes it is rejected rather than silently accepted.
fn propagate_package_version(tree: &mut ManifestTree, new_version: &str) -> CoreResult<()> {
    let expected = tree.version.common.package_identifier.clone();

    for identifier in [
        &tree.version.common.package_identifier,
        &tree.installer.common.package_identifier,
        &tree.default_locale.common.package_identifier,
    ] {
        if identifier != &expected {
            return Err(CoreError::IdentityChanged {
                expected,
                actual: identifier.clone(),
            });
        }
    }
    for locale in &tree.additional_locales {
        if locale.common.package_identifier != expected {
            return Err(CoreError::IdentityChanged {
                expected,
                actual: locale.common.package_identifier.clone(),
            });
        }
    }

    tree.version.common.package_version = new_version.to_string();
    tree.installer.common.package_version = new_version.to_string();
    tree.default_locale.common.package_version = new_version.to_string();
    for locale in &mut tree.additional_locales {
        locale.common.package_version = new_version.to_string();
    }
    Ok(())
}
