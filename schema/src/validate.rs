//! Explicit invariant checks (§3.2 "Invariants"), producing
//! [`SchemaViolation`] values the way an external validator would
//! (§9's "Attribute-driven validation" redesign hint: a `(path,
//! rule)` list rather than attributes scattered on fields).

use crate::errors::SchemaViolation;
use crate::model::*;

/// Validate every invariant in §3.2 against a tree. Returns every
/// violation found rather than stopping at the first one, so a
/// caller can report them all in one pass (mirrors `ParsePackageError`
/// and `InstallerMatchError`'s aggregated-reporting style).
pub fn validate(tree: &ManifestTree) -> Vec<SchemaViolation> {
    let mut out = Vec::new();
    check_identifier(tree, &mut out);
    check_locale_uniqueness(tree, &mut out);
    check_installer_fields(tree, &mut out);
    out
}

fn check_identifier(tree: &ManifestTree, out: &mut Vec<SchemaViolation>) {
    let canonical = tree.package_identifier();
    // I6: shape of the identifier.
    if !is_valid_identifier(canonical) {
        out.push(SchemaViolation::new(
            "PackageIdentifier",
            format!("`{canonical}` doesn't match [A-Za-z0-9][A-Za-z0-9.-]{{0,127}} with a dot"),
        ));
    }

    // I1: case-insensitive equality across every file.
    let others = [
        ("InstallerManifest.PackageIdentifier", &tree.installer.common.package_identifier),
        (
            "DefaultLocaleManifest.PackageIdentifier",
            &tree.default_locale.common.package_identifier,
        ),
    ];
    for (path, value) in others {
        if !value.eq_ignore_ascii_case(canonical) {
            out.push(SchemaViolation::new(
                path,
                format!("`{value}` doesn't match the version manifest's `{canonical}` (case-insensitively)"),
            ));
        }
    }
    for (i, locale) in tree.additional_locales.iter().enumerate() {
        if !locale.common.package_identifier.eq_ignore_ascii_case(canonical) {
            out.push(SchemaViolation::new(
                format!("AdditionalLocales[{i}].PackageIdentifier"),
                format!(
                    "`{}` doesn't match the version manifest's `{canonical}` (case-insensitively)",
                    locale.common.package_identifier
                ),
            ));
        }
    }
}

fn is_valid_identifier(id: &str) -> bool {
    if id.is_empty() || id.len() > 128 {
        return false;
    }
    let mut chars = id.chars();
    let Some(first) = chars.next() else { return false };
    if !first.is_ascii_alphanumeric() {
        return false;
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-') {
        return false;
    }
    id.contains('.')
}

fn check_locale_uniqueness(tree: &ManifestTree, out: &mut Vec<SchemaViolation>) {
    // I3: every additional-locale has a package_locale distinct from
    // every other locale, including the default.
    let mut seen = vec![tree.default_locale.package_locale.to_ascii_lowercase()];
    for (i, locale) in tree.additional_locales.iter().enumerate() {
        let key = locale.package_locale.to_ascii_lowercase();
        if seen.contains(&key) {
            out.push(SchemaViolation::new(
                format!("AdditionalLocales[{i}].PackageLocale"),
                format!("duplicate locale `{}`", locale.package_locale),
            ));
        }
        seen.push(key);
    }
}

fn check_installer_fields(tree: &ManifestTree, out: &mut Vec<SchemaViolation>) {
    for (i, installer) in tree.installer.installers.iter().enumerate() {
        let path = format!("Installers[{i}]");
        // I4: hash shape, and signature_sha256 present iff msix/appx.
        if !is_uppercase_hex64(&installer.installer_sha256) {
            out.push(SchemaViolation::new(
                format!("{path}.InstallerSha256"),
                "must be 64 uppercase hex characters",
            ));
        }
        let is_msix_family = matches!(installer.installer_type, Some(InstallerType::Msix) | Some(InstallerType::Appx));
        match (&installer.signature_sha256, is_msix_family) {
            (Some(sig), true) => {
                if !is_uppercase_hex64(sig) {
                    out.push(SchemaViolation::new(
                        format!("{path}.SignatureSha256"),
                        "must be 64 uppercase hex characters",
                    ));
                }
            }
            (Some(_), false) => out.push(SchemaViolation::new(
                format!("{path}.SignatureSha256"),
                "present but installer type isn't msix/appx",
            )),
            (None, true) => out.push(SchemaViolation::new(
                format!("{path}.SignatureSha256"),
                "missing for an msix/appx installer",
            )),
            (None, false) => {}
        }
    }

    // I5: a hoisted field must equal every per-record value, or it
    // shouldn't be considered hoisted at all.
    for field_name in ["InstallerLocale", "PackageFamilyName", "MinimumOSVersion"] {
        check_hoistable_agrees(tree, field_name, out);
    }
}

fn check_hoistable_agrees(tree: &ManifestTree, field_name: &str, out: &mut Vec<SchemaViolation>) {
    let hoisted = match field_name {
        "InstallerLocale" => tree.installer.installer_locale.as_deref(),
        "PackageFamilyName" => tree.installer.package_family_name.as_deref(),
        "MinimumOSVersion" => tree.installer.minimum_os_version.as_deref(),
        _ => None,
    };
    let Some(hoisted) = hoisted else { return };
    for (i, installer) in tree.installer.installers.iter().enumerate() {
        let per_record = match field_name {
            "InstallerLocale" => installer.installer_locale.as_deref(),
            "PackageFamilyName" => installer.package_family_name.as_deref(),
            "MinimumOSVersion" => installer.minimum_os_version.as_deref(),
            _ => None,
        };
        if let Some(per_record) = per_record {
            if per_record != hoisted {
                out.push(SchemaViolation::new(
                    format!("Installers[{i}].{field_name}"),
                    format!("`{per_record}` disagrees with the hoisted default `{hoisted}`"),
                ));
            }
        }
    }
}

fn is_uppercase_hex64(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_shape() {
        assert!(is_valid_identifier("Publisher.Package"));
        assert!(!is_valid_identifier("NoDot"));
        assert!(!is_valid_identifier(".LeadingDot"));
        assert!(!is_valid_identifier(""));
    }
}
