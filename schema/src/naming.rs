//! File- and directory-naming policy for a serialized tree (§4.J, §6.2).

use crate::model::ManifestTree;

/// The file name (no directory component) for one manifest file in a
/// tree, given the package identifier and the extension the chosen
/// [`crate::Format`] uses.
pub fn installer_manifest_name(package_id: &str, ext: &str) -> String {
    format!("{package_id}.installer{ext}")
}

pub fn version_manifest_name(package_id: &str, ext: &str) -> String {
    format!("{package_id}{ext}")
}

pub fn default_locale_manifest_name(package_id: &str, locale: &str, ext: &str) -> String {
    format!("{package_id}.locale.{locale}{ext}")
}

pub fn additional_locale_manifest_name(package_id: &str, locale: &str, ext: &str) -> String {
    format!("{package_id}.locale.{locale}{ext}")
}

pub fn singleton_manifest_name(package_id: &str, ext: &str) -> String {
    format!("{package_id}{ext}")
}

/// The repository-relative directory a manifest tree's files live
/// under: `manifests/<first-letter-lower>/<publisher>/<name>/<version>/`,
/// with one path segment per `.`-separated token in the package
/// identifier (so `Microsoft.VisualStudio.Code` nests as
/// `manifests/m/Microsoft/VisualStudio/Code/`, one token per directory
/// level, case preserved from the identifier).
pub fn manifest_directory(tree: &ManifestTree) -> String {
    let id = tree.package_identifier();
    let first_letter = id
        .chars()
        .next()
        .map(|c| c.to_ascii_lowercase())
        .unwrap_or('0');
    let mut segments: Vec<String> = id.split('.').map(str::to_string).collect();
    if segments.is_empty() {
        segments.push(id.to_string());
    }
    let mut path = format!("manifests/{first_letter}");
    for segment in segments {
        path.push('/');
        path.push_str(&segment);
    }
    path.push('/');
    path.push_str(&tree.version.common.package_version);
    path
}
