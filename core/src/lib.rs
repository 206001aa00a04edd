#![deny(missing_docs)]

//! # pkgforge-core
//!
//! The installer introspection and manifest update engine: downloads
//! one or more installer URLs, identifies their format (§4.C–F),
//! extracts the fields a winget-style manifest needs (§4.G), pairs
//! the results against an existing manifest's installers (§4.H), and
//! merges the two into an updated tree (§4.I) ready for
//! `pkgforge_schema::encode`.
//!
//! The two public entry points are [`update`] (editing an existing
//! manifest tree) and [`parse`] (building a fresh one). Both return a
//! [`ParseReport`] alongside the manifest tree, per §6.2.

pub mod arch;
pub mod cache;
pub mod config;
pub mod download;
pub mod errors;
pub mod hash;
pub mod inspect;
pub mod lcid;
pub mod matcher;
pub mod merge;
pub mod metadata_source;
pub mod net;
pub mod overrides;
pub mod parser;
pub mod pfn;

use config::EngineConfig;
use download::Downloader;
use errors::{CoreError, CoreResult, SchemaViolationError};
use matcher::match_installers;
use merge::{apply_updates, DeletionPlan, ReplaceRequest};
use metadata_source::{common_release_triple, apply_enrichment, HostingPrefix, MetadataSource};
use overrides::UrlOverride;
use parser::{HoistDefaults, NestedPathRequest, ParseContext, ParsedInstaller, UrlParseReport};
use pkgforge_schema::model::{InstallerManifest, ManifestTree, Scope};
use pkgforge_schema::{decode, Format};
use tracing::debug;

/// One input URL plus the pipe-delimited override suffix already
/// split out, plus the caller-supplied relative paths (and, for a
/// portable EXE, the alias to record against it) to pull out of it if
/// it turns out to be a ZIP carrier.
///
/// The override grammar documented in §6.1 has no way for a caller to
/// name which files inside an archive are the real installers (§4.F
/// assumes this is already known); this field closes that gap and is
/// simply empty for a non-archive URL.
#[derive(Debug, Clone, Default)]
pub struct UrlInput {
    /// Raw `<url>[|...]` text, as documented in §6.1.
    pub raw: String,
    /// Relative paths (with optional `PortableCommandAlias` values) to
    /// extract if this URL's download turns out to be a ZIP/archive
    /// carrier.
    pub nested_paths: Vec<NestedPathRequest>,
}

impl From<&str> for UrlInput {
    fn from(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            nested_paths: Vec::new(),
        }
    }
}

/// Per-URL parse report (§6.2), returned alongside the manifest tree
/// so a caller can inspect how each installer's architecture and type
/// were derived, independent of what ended up on the record.
#[derive(Debug, Clone)]
pub struct UrlReport {
    /// The installer URL this report describes (post-override parse).
    pub url: String,
    /// Architecture guessed from the URL text itself (§4.B).
    pub url_arch: Option<pkgforge_schema::model::Architecture>,
    /// Architecture read out of the downloaded binary.
    pub binary_arch: Option<pkgforge_schema::model::Architecture>,
    /// Architecture the caller forced via the override suffix.
    pub override_arch: Option<pkgforge_schema::model::Architecture>,
    /// Architectures seen across a ZIP carrier's nested files.
    pub nested_archs: Vec<pkgforge_schema::model::Architecture>,
    /// Set when `nested_archs` disagreed (§4.F).
    pub multiple_nested_arches: bool,
}

impl From<UrlParseReport> for UrlReport {
    fn from(report: UrlParseReport) -> Self {
        Self {
            url: report.url,
            url_arch: report.url_arch,
            binary_arch: report.binary_arch,
            override_arch: report.override_arch,
            nested_archs: report.nested_archs,
            multiple_nested_arches: report.multiple_nested_arches,
        }
    }
}

/// The aggregated outcome of one `parse`/`update` call.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    /// One entry per input URL, in the order it was processed.
    pub urls: Vec<UrlReport>,
}

/// Download and identify every URL in `inputs`, in order, using the
/// hoisting defaults already present on `existing` (empty during a
/// fresh `parse`). Shared by both public entry points.
fn download_and_parse(
    downloader: &Downloader,
    inputs: &[UrlInput],
    defaults: &HoistDefaults,
) -> CoreResult<Vec<ParsedInstaller>> {
    let mut results = Vec::with_capacity(inputs.len());
    for input in inputs {
        let overridden: UrlOverride = overrides::parse(&input.raw);
        let path = downloader.download(&overridden.url, None)?;
        let bytes = std::fs::read(&path)?;
        let ctx = ParseContext {
            source_url: &overridden.url,
            architecture_override: overridden.architecture,
            scope_override: overridden.scope,
            display_version_override: overridden.display_version,
            nested_paths: &input.nested_paths,
            defaults,
            nested_context: false,
        };
        let mut parsed = parser::parse_file(&bytes, &ctx)?;
        results.append(&mut parsed);
    }
    Ok(results)
}

fn hoist_defaults_from(manifest: &InstallerManifest) -> HoistDefaults {
    HoistDefaults {
        installer_locale: manifest.installer_locale.clone(),
        platform: manifest.platform.clone(),
        minimum_os_version: manifest.minimum_os_version.clone(),
        package_family_name: manifest.package_family_name.clone(),
    }
}

fn run_validation(tree: &ManifestTree) -> CoreResult<()> {
    let violations = pkgforge_schema::validate::validate(tree);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(CoreError::SchemaViolation(SchemaViolationError(violations)))
    }
}

/// Update an existing manifest tree with freshly downloaded and
/// parsed installers (§6.4's `update` entry point). `existing_texts`
/// is the prior manifest's file contents, in any order, flow or
/// structural; `inputs` is the new set of installer URLs, matched
/// one-to-one against `existing`'s current installers by the Matcher.
///
/// `new_package_version` propagates to every file in the tree (§4.I);
/// `override_scope` supplies a caller-forced scope per input index,
/// consulted by the Matcher's third narrowing tier only when needed.
pub fn update(
    existing_texts: &[String],
    inputs: &[UrlInput],
    new_package_version: &str,
    override_scope: &[Option<Scope>],
    config: &EngineConfig,
    metadata_source: Option<&dyn MetadataSource>,
    hosting_prefixes: &[HostingPrefix],
    replace: &ReplaceRequest,
) -> CoreResult<(ManifestTree, ParseReport, DeletionPlan)> {
    let existing = decode(existing_texts)?;
    let defaults = hoist_defaults_from(&existing.installer);

    let downloader = Downloader::new(config.downloader.clone())?;
    let parsed = download_and_parse(&downloader, inputs, &defaults)?;

    let matches = match_installers(&parsed, &existing.installer, override_scope)?;
    let (mut tree, plan) = apply_updates(existing, &parsed, &matches, new_package_version, replace)?;

    enrich_from_hosting(&mut tree, inputs, metadata_source, hosting_prefixes);
    run_validation(&tree)?;

    let report = ParseReport {
        urls: parsed.into_iter().map(|p| p.report.into()).collect(),
    };
    Ok((tree, report, plan))
}

/// Build a brand-new manifest tree from scratch (§6.4's `parse` entry
/// point, the "new" path). There is no existing installer list to
/// hoist against or match, so every downloaded file becomes a fresh
/// `Installer` record in download order.
pub fn parse(
    inputs: &[UrlInput],
    package_identifier: &str,
    package_version: &str,
    manifest_version: &str,
    default_locale_tag: &str,
    config: &EngineConfig,
    metadata_source: Option<&dyn MetadataSource>,
    hosting_prefixes: &[HostingPrefix],
) -> CoreResult<(ManifestTree, ParseReport)> {
    let downloader = Downloader::new(config.downloader.clone())?;
    let defaults = HoistDefaults::default();
    let parsed = download_and_parse(&downloader, inputs, &defaults)?;

    let mut tree = build_fresh_tree(
        package_identifier,
        package_version,
        manifest_version,
        default_locale_tag,
        &parsed,
    );
    enrich_from_hosting(&mut tree, inputs, metadata_source, hosting_prefixes);
    run_validation(&tree)?;

    let report = ParseReport {
        urls: parsed.into_iter().map(|p| p.report.into()).collect(),
    };
    Ok((tree, report))
}

fn build_fresh_tree(
    package_identifier: &str,
    package_version: &str,
    manifest_version: &str,
    default_locale_tag: &str,
    parsed: &[ParsedInstaller],
) -> ManifestTree {
    use pkgforge_schema::model::*;
    use std::collections::BTreeSet;

    let common = |manifest_type| ManifestCommon {
        package_identifier: package_identifier.to_string(),
        package_version: package_version.to_string(),
        manifest_version: manifest_version.to_string(),
        manifest_type,
    };

    ManifestTree {
        version: VersionManifest {
            common: common(ManifestType::Version),
            default_locale: default_locale_tag.to_string(),
        },
        installer: InstallerManifest {
            common: common(ManifestType::Installer),
            installers: parsed.iter().map(|p| p.installer.clone()).collect(),
            installer_type: None,
            installer_locale: None,
            platform: BTreeSet::new(),
            minimum_os_version: None,
            package_family_name: None,
            scope: None,
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
        },
        default_locale: DefaultLocaleManifest {
            common: common(ManifestType::DefaultLocale),
            package_locale: default_locale_tag.to_string(),
            fields: LocaleFields::default(),
        },
        additional_locales: Vec::new(),
    }
}

/// §6.4: only called when every input URL shares one known hosting
/// prefix and `(owner, repo, tag)` triple; writes only into
/// currently-empty fields.
fn enrich_from_hosting(
    tree: &mut ManifestTree,
    inputs: &[UrlInput],
    metadata_source: Option<&dyn MetadataSource>,
    hosting_prefixes: &[HostingPrefix],
) {
    let Some(source) = metadata_source else { return };
    if hosting_prefixes.is_empty() {
        return;
    }
    let urls: Vec<String> = inputs.iter().map(|i| overrides::parse(&i.raw).url).collect();
    let Some(triple) = common_release_triple(&urls, hosting_prefixes) else {
        return;
    };
    let Some(metadata) = source.fetch_repo_metadata(&triple.owner, &triple.repo, &triple.tag) else {
        return;
    };
    debug!(owner = %triple.owner, repo = %triple.repo, tag = %triple.tag, "enriching from hosting metadata");

    let mut release_date = tree.installer.installers.first().and_then(|i| i.release_date.clone());
    apply_enrichment(&mut tree.default_locale.fields, &metadata, &mut release_date);
    if let Some(release_date) = release_date {
        for installer in &mut tree.installer.installers {
            if installer.release_date.is_none() {
                installer.release_date = Some(release_date.clone());
            }
        }
    }
    if let Some(wiki_url) = &metadata.documentation_wiki_url {
        if tree.default_locale.fields.documentations.is_empty() {
            tree.default_locale
                .fields
                .documentations
                .push(("Wiki".to_string(), wiki_url.clone()));
        }
    }
}

/// Serialize a tree to disk-ready file contents (§4.J, §6.2
/// `manifests/<first-letter-lower>/<publisher>/<name>/<version>/`
/// directory layout left to the caller, since it owns the filesystem
/// root to write under).
pub fn serialize(tree: &ManifestTree, format: Format, opts: &pkgforge_schema::EncodeOptions) -> Vec<pkgforge_schema::ManifestFile> {
    pkgforge_schema::encode(tree, format, opts)
}

/// Read a full set of manifest file contents back into one tree
/// (§6.4 `deserialize`).
pub fn deserialize(texts: &[String]) -> CoreResult<ManifestTree> {
    Ok(decode(texts)?)
}

/// The relative directory a tree's files should be written under
/// (§4.J, §6.2): `manifests/<first-letter-lower>/<publisher>/<name>/<version>`.
pub fn output_directory(tree: &ManifestTree) -> String {
    pkgforge_schema::naming::manifest_directory(tree)
}
