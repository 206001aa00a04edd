//! The Package Parser (§4.G): the orchestrator that hands one
//! downloaded file to the PE, MSIX/APPX and MSI inspectors in turn,
//! resolves the hoistable-field and architecture-precedence rules,
//! and recurses into the ZIP Inspector when the file is a container.

use crate::arch::guess_architecture;
use crate::errors::{CoreError, CoreResult};
use crate::hash::sha256_hex_upper;
use crate::inspect::{msi, msix, pe, zip as zip_inspect, InspectOutcome};
use pkgforge_schema::model::{Architecture, Installer, InstallerSwitches, InstallerType, NestedInstallerFile, NestedInstallerType, Platform, Scope};
use std::collections::BTreeSet;
use tracing::debug;

/// Installer-manifest-level defaults already in force (from the
/// existing manifest, during `update`; empty during a fresh `parse`).
/// Used to implement I5's hoisting rule: a record-level hoistable
/// field is nulled when it already equals the manifest default.
#[derive(Debug, Clone, Default)]
pub struct HoistDefaults {
    /// Manifest-level `InstallerLocale`.
    pub installer_locale: Option<String>,
    /// Manifest-level `Platform` set.
    pub platform: BTreeSet<Platform>,
    /// Manifest-level `MinimumOSVersion`.
    pub minimum_os_version: Option<String>,
    /// Manifest-level `PackageFamilyName`.
    pub package_family_name: Option<String>,
}

fn hoist_scalar<T: PartialEq + Clone>(candidate: Option<T>, default: &Option<T>) -> Option<T> {
    match (&candidate, default) {
        (Some(c), Some(d)) if c == d => None,
        _ => candidate,
    }
}

fn hoist_platform(candidate: BTreeSet<Platform>, default: &BTreeSet<Platform>) -> BTreeSet<Platform> {
    if !candidate.is_empty() && &candidate == default {
        BTreeSet::new()
    } else {
        candidate
    }
}

/// One relative path a caller wants extracted out of a ZIP carrier,
/// with the `PortableCommandAlias` to stamp onto the resulting nested
/// installer file, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestedPathRequest {
    /// Path inside the archive, as the caller wrote it.
    pub relative_path: String,
    /// Alias the caller wants recorded against this path (§6.1).
    pub portable_command_alias: Option<String>,
}

/// Everything the Package Parser needs about one URL invocation that
/// doesn't come from the downloaded bytes themselves.
#[derive(Debug, Clone)]
pub struct ParseContext<'a> {
    /// The URL this file was downloaded from (post-override parse).
    pub source_url: &'a str,
    /// Caller-forced architecture, from the `|<arch>` override suffix.
    pub architecture_override: Option<Architecture>,
    /// Caller-forced scope, from the `|<arch>|<scope>` override suffix.
    pub scope_override: Option<Scope>,
    /// Caller-attached display version, from the `|<display-version>` suffix.
    pub display_version_override: Option<String>,
    /// Relative paths (with optional aliases) to extract if this file
    /// turns out to be a ZIP carrier. Empty for a plain installer URL.
    pub nested_paths: &'a [NestedPathRequest],
    pub defaults: &'a HoistDefaults,
    /// Set when this file is itself a nested entry extracted from a
    /// ZIP (§4.F: forces EXE-family detection to `portable`).
    pub nested_context: bool,
}

/// Per-URL parse report (§6.2): the raw signals the Matcher's
/// architecture-narrowing tier reads independently of what ended up on
/// the `Installer` record itself.
#[derive(Debug, Clone, Default)]
pub struct UrlParseReport {
    /// The installer URL this report describes.
    pub url: String,
    /// Architecture guessed from the URL text itself (§4.B).
    pub url_arch: Option<Architecture>,
    /// Architecture read out of the downloaded binary.
    pub binary_arch: Option<Architecture>,
    /// Architecture the caller forced via the override suffix.
    pub override_arch: Option<Architecture>,
    /// Architectures seen across a ZIP carrier's nested files.
    pub nested_archs: Vec<Architecture>,
    /// Set when `nested_archs` disagreed (§4.F).
    pub multiple_nested_arches: bool,
}

/// One new installer record plus the report describing how its
/// architecture was derived.
#[derive(Debug, Clone)]
pub struct ParsedInstaller {
    /// The built record.
    pub installer: Installer,
    /// How its architecture was derived.
    pub report: UrlParseReport,
}

fn resolve_architecture(ctx: &ParseContext, binary_arch: Architecture) -> Architecture {
    ctx.architecture_override
        .or_else(|| guess_architecture(ctx.source_url))
        .unwrap_or(binary_arch)
}

fn base_installer(ctx: &ParseContext, sha256: String) -> Installer {
    Installer {
        installer_url: ctx.source_url.to_string(),
        installer_sha256: sha256,
        signature_sha256: None,
        architecture: None,
        installer_type: None,
        nested_installer_type: None,
        nested_installer_files: Vec::new(),
        scope: ctx.scope_override,
        installer_locale: None,
        product_code: None,
        package_family_name: None,
        platform: BTreeSet::new(),
        minimum_os_version: None,
        upgrade_behavior: None,
        install_modes: BTreeSet::new(),
        installer_switches: InstallerSwitches::default(),
        installer_success_codes: Vec::new(),
        commands: Vec::new(),
        protocols: Vec::new(),
        file_extensions: Vec::new(),
        capabilities: Vec::new(),
        restricted_capabilities: Vec::new(),
        dependencies: None,
        display_version: ctx.display_version_override.clone(),
        release_date: None,
        multiple_nested_installer_architectures: false,
    }
}

/// Parse one downloaded file's bytes. Returns one record for the
/// common cases, or several for an MSIX bundle that declares more than
/// one application child package.
pub fn parse_file(bytes: &[u8], ctx: &ParseContext) -> CoreResult<Vec<ParsedInstaller>> {
    let sha256 = sha256_hex_upper(bytes);
    let url_arch = guess_architecture(ctx.source_url);

    match pe::inspect(bytes, ctx.nested_context) {
        InspectOutcome::Matched(info) => {
            debug!(url = ctx.source_url, "recognized as PE");
            let mut installer = base_installer(ctx, sha256);
            installer.installer_type = Some(info.installer_type);
            installer.architecture = Some(resolve_architecture(ctx, info.architecture));
            let report = UrlParseReport {
                url: ctx.source_url.to_string(),
                url_arch,
                binary_arch: Some(info.architecture),
                override_arch: ctx.architecture_override,
                nested_archs: Vec::new(),
                multiple_nested_arches: false,
            };
            return Ok(vec![ParsedInstaller { installer, report }]);
        }
        InspectOutcome::ParseFailure(reason) => return Err(CoreError::ParsePackageError(vec![reason])),
        InspectOutcome::NotThisFormat => {}
    }

    match msix::inspect(bytes) {
        InspectOutcome::Matched(info) => {
            debug!(url = ctx.source_url, packages = info.packages.len(), "recognized as MSIX/APPX");
            let mut out = Vec::new();
            for package in info.packages {
                let mut installer = base_installer(ctx, sha256.clone());
                installer.installer_type = Some(InstallerType::Msix);
                // MSIX records bypass URL and override (§4.G).
                installer.architecture = Some(package.architecture);
                installer.signature_sha256 = info.signature_sha256.clone();
                installer.package_family_name = hoist_scalar(
                    Some(package.package_family_name.to_uppercase()),
                    &ctx.defaults.package_family_name,
                );
                installer.platform = hoist_platform(package.platform, &ctx.defaults.platform);
                installer.minimum_os_version =
                    hoist_scalar(package.minimum_os_version, &ctx.defaults.minimum_os_version);
                let report = UrlParseReport {
                    url: ctx.source_url.to_string(),
                    url_arch,
                    binary_arch: Some(package.architecture),
                    override_arch: None,
                    nested_archs: Vec::new(),
                    multiple_nested_arches: false,
                };
                out.push(ParsedInstaller { installer, report });
            }
            return Ok(out);
        }
        InspectOutcome::ParseFailure(reason) => return Err(CoreError::ParsePackageError(vec![reason])),
        InspectOutcome::NotThisFormat => {}
    }

    match msi::inspect(bytes) {
        InspectOutcome::Matched(info) => {
            debug!(url = ctx.source_url, "recognized as MSI");
            let mut installer = base_installer(ctx, sha256);
            installer.installer_type = Some(if info.is_wix_authored {
                InstallerType::Wix
            } else {
                InstallerType::Msi
            });
            installer.architecture = Some(resolve_architecture(ctx, info.architecture));
            installer.product_code = info.product_code;
            installer.installer_locale = hoist_scalar(info.product_language, &ctx.defaults.installer_locale);
            let report = UrlParseReport {
                url: ctx.source_url.to_string(),
                url_arch,
                binary_arch: Some(info.architecture),
                override_arch: ctx.architecture_override,
                nested_archs: Vec::new(),
                multiple_nested_arches: false,
            };
            return Ok(vec![ParsedInstaller { installer, report }]);
        }
        InspectOutcome::ParseFailure(reason) => return Err(CoreError::ParsePackageError(vec![reason])),
        InspectOutcome::NotThisFormat => {}
    }

    if !ctx.nested_paths.is_empty() {
        let requested: Vec<String> = ctx.nested_paths.iter().map(|p| p.relative_path.clone()).collect();
        if let InspectOutcome::Matched(entries) = zip_inspect::extract(bytes, &requested) {
            return Ok(vec![parse_zip_carrier(bytes, &sha256, ctx, entries)?]);
        }
    }

    Err(CoreError::ParsePackageError(vec![ctx.source_url.to_string()]))
}

fn parse_zip_carrier(
    _archive_bytes: &[u8],
    sha256: &str,
    ctx: &ParseContext,
    entries: Vec<(String, Vec<u8>)>,
) -> CoreResult<ParsedInstaller> {
    let nested_defaults = HoistDefaults::default();
    let mut nested_archs = Vec::new();
    let mut nested_type: Option<NestedInstallerType> = None;

    for (_relative_path, bytes) in &entries {
        let nested_ctx = ParseContext {
            source_url: ctx.source_url,
            architecture_override: None,
            scope_override: None,
            display_version_override: None,
            nested_paths: &[],
            defaults: &nested_defaults,
            nested_context: true,
        };
        if let Ok(parsed) = parse_file(bytes, &nested_ctx) {
            if let Some(first) = parsed.into_iter().next() {
                if let Some(arch) = first.installer.architecture {
                    nested_archs.push(arch);
                }
                if nested_type.is_none() {
                    if let Some(installer_type) = first.installer.installer_type {
                        nested_type = NestedInstallerType::try_from(installer_type).ok();
                    }
                }
            }
        }
    }

    let mut distinct = nested_archs.clone();
    distinct.sort();
    distinct.dedup();
    let multiple_nested_arches = distinct.len() > 1;
    let binary_arch = if multiple_nested_arches {
        None
    } else {
        distinct.into_iter().next()
    };

    let mut installer = base_installer(ctx, sha256.to_string());
    installer.installer_type = Some(InstallerType::Zip);
    installer.nested_installer_type = nested_type;
    installer.nested_installer_files = entries
        .iter()
        .map(|(path, _)| {
            let alias = ctx
                .nested_paths
                .iter()
                .find(|p| &p.relative_path == path)
                .and_then(|p| p.portable_command_alias.clone());
            NestedInstallerFile {
                relative_path: path.clone(),
                portable_command_alias: alias,
            }
        })
        .collect();
    installer.multiple_nested_installer_architectures = multiple_nested_arches;
    installer.architecture = Some(
        ctx.architecture_override
            .or_else(|| guess_architecture(ctx.source_url))
            .or(binary_arch)
            .unwrap_or(Architecture::Neutral),
    );

    let report = UrlParseReport {
        url: ctx.source_url.to_string(),
        url_arch: guess_architecture(ctx.source_url),
        binary_arch,
        override_arch: ctx.architecture_override,
        nested_archs,
        multiple_nested_arches,
    };

    Ok(ParsedInstaller { installer, report })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hoist_scalar_nulls_when_equal_to_default() {
        let default = Some("en-US".to_string());
        assert_eq!(hoist_scalar(Some("en-US".to_string()), &default), None);
        assert_eq!(
            hoist_scalar(Some("fr-FR".to_string()), &default),
            Some("fr-FR".to_string())
        );
    }

    #[test]
    fn hoist_platform_nulls_when_equal_to_default() {
        let default = BTreeSet::from([Platform::WindowsDesktop]);
        assert!(hoist_platform(BTreeSet::from([Platform::WindowsDesktop]), &default).is_empty());
        assert_eq!(
            hoist_platform(BTreeSet::from([Platform::WindowsUniversal]), &default),
            BTreeSet::from([Platform::WindowsUniversal])
        );
    }
}
