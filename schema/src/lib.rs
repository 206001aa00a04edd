#![deny(missing_docs)]

//! # pkgforge-schema
//!
//! The typed manifest tree (§3.2 of the spec this crate implements)
//! plus the two on-disk wire formats it round-trips through: a
//! flow-style YAML dialect and a structural JSON dialect (§4.J).
//!
//! The root type is [`ManifestTree`].

pub mod de;
pub mod errors;
pub mod fields;
pub mod model;
pub mod naming;
pub mod ser;
pub mod validate;
pub mod wire;

use de::Raw;
use errors::{SchemaError, SchemaResult};
use model::{AdditionalLocaleManifest, DefaultLocaleManifest, InstallerManifest, ManifestTree, ManifestType, Singleton, VersionManifest};
use ser::{flow::FlowBanner, flow, structural};

/// The on-disk encoding a manifest tree is serialized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// YAML, single-quoted scalars, literal block multiline strings.
    Flow,
    /// JSON, two-space indented, `$schema` first.
    Structural,
}

impl Format {
    /// File extension (with leading dot) this format writes.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Flow => ".yaml",
            Format::Structural => ".json",
        }
    }
}

/// Producer/schema banner inputs shared by every file in one encode
/// call.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub producer: String,
    pub lang_server: String,
    pub schema_version: String,
}

fn schema_url(schema_version: &str, manifest_type: ManifestType) -> String {
    format!(
        "https://aka.ms/winget-manifest.{}.{}.schema.json",
        manifest_type.wire(),
        schema_version
    )
}

/// One named file of a serialized tree.
#[derive(Debug, Clone)]
pub struct ManifestFile {
    pub file_name: String,
    pub content: String,
}

/// Serialize a tree to its five-file (or four-file, with zero
/// additional locales) on-disk form (§4.J naming policy).
pub fn encode(tree: &ManifestTree, format: Format, opts: &EncodeOptions) -> Vec<ManifestFile> {
    let id = tree.package_identifier();
    let ext = format.extension();
    let mut files = Vec::new();

    files.push(ManifestFile {
        file_name: naming::version_manifest_name(id, ext),
        content: render(tree.version.to_fields(), format, opts, ManifestType::Version),
    });
    files.push(ManifestFile {
        file_name: naming::installer_manifest_name(id, ext),
        content: render(tree.installer.to_fields(), format, opts, ManifestType::Installer),
    });
    files.push(ManifestFile {
        file_name: naming::default_locale_manifest_name(id, &tree.default_locale.package_locale, ext),
        content: render(
            tree.default_locale.to_fields(),
            format,
            opts,
            ManifestType::DefaultLocale,
        ),
    });
    for locale in &tree.additional_locales {
        files.push(ManifestFile {
            file_name: naming::additional_locale_manifest_name(id, &locale.package_locale, ext),
            content: render(locale.to_fields(), format, opts, ManifestType::Locale),
        });
    }
    files
}

fn render(value: ser::Value, format: Format, opts: &EncodeOptions, manifest_type: ManifestType) -> String {
    let url = schema_url(&opts.schema_version, manifest_type);
    match format {
        Format::Flow => flow::render(
            value,
            &FlowBanner {
                producer: opts.producer.clone(),
                lang_server: opts.lang_server.clone(),
                schema_url: url,
            },
        ),
        Format::Structural => structural::render(value, &url),
    }
}

/// Parse a single manifest file's text into a raw tree and identify
/// its manifest type, without committing to a concrete model type.
/// Exposed so a caller juggling many files (as `decode` does) can sort
/// them before dispatching.
pub fn sniff(text: &str) -> SchemaResult<(ManifestType, Raw)> {
    let raw = de::parse(text)?;
    let manifest_type = fields::peek_manifest_type(&raw)
        .ok_or_else(|| SchemaError::Malformed("missing or unrecognized ManifestType".to_string()))?;
    Ok((manifest_type, raw))
}

/// Parse a full set of manifest file contents (in any order, any
/// mix of flow/structural text) into one [`ManifestTree`].
///
/// Accepts either the split five-file form or a single [`Singleton`]
/// document; in the latter case the singleton is converted on the way
/// in, as §3.2 describes for the input-only `Singleton` variant.
pub fn decode(texts: &[String]) -> SchemaResult<ManifestTree> {
    let mut version = None;
    let mut installer = None;
    let mut default_locale = None;
    let mut additional_locales = Vec::new();
    let mut singleton = None;

    for text in texts {
        let (manifest_type, raw) = sniff(text)?;
        let map = raw
            .as_map()
            .ok_or_else(|| SchemaError::Malformed("manifest root must be a mapping".to_string()))?;
        match manifest_type {
            ManifestType::Version => version = Some(VersionManifest::from_raw(map, "Version")?),
            ManifestType::Installer => installer = Some(InstallerManifest::from_raw(map, "Installer")?),
            ManifestType::DefaultLocale => {
                default_locale = Some(DefaultLocaleManifest::from_raw(map, "DefaultLocale")?)
            }
            ManifestType::Locale => {
                additional_locales.push(AdditionalLocaleManifest::from_raw(map, "Locale")?)
            }
            ManifestType::Singleton => singleton = Some(Singleton::from_raw(map, "Singleton")?),
        }
    }

    if let Some(singleton) = singleton {
        return Ok(ManifestTree::from_singleton(singleton));
    }

    let version = version.ok_or_else(|| SchemaError::Malformed("no Version manifest present".to_string()))?;
    let installer = installer.ok_or_else(|| SchemaError::Malformed("no Installer manifest present".to_string()))?;
    let default_locale =
        default_locale.ok_or_else(|| SchemaError::Malformed("no DefaultLocale manifest present".to_string()))?;

    Ok(ManifestTree {
        version,
        installer,
        default_locale,
        additional_locales,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::*;
    use std::collections::BTreeSet;

    fn sample_tree() -> ManifestTree {
        let common = |manifest_type| ManifestCommon {
            package_identifier: "Publisher.Package".to_string(),
            package_version: "1.2.3".to_string(),
            manifest_version: "1.9.0".to_string(),
            manifest_type,
        };
        ManifestTree {
            version: VersionManifest {
                common: common(ManifestType::Version),
                default_locale: "en-US".to_string(),
            },
            installer: InstallerManifest {
                common: common(ManifestType::Installer),
                installer_type: None,
                installers: vec![Installer {
                    installer_url: "https://example.com/app.exe".to_string(),
                    installer_sha256: "A".repeat(64),
                    signature_sha256: None,
                    architecture: Some(Architecture::X64),
                    installer_type: Some(InstallerType::Exe),
                    nested_installer_type: None,
                    nested_installer_files: vec![],
                    scope: Some(Scope::Machine),
                    installer_locale: None,
                    product_code: None,
                    package_family_name: None,
                    platform: BTreeSet::new(),
                    minimum_os_version: None,
                    upgrade_behavior: Some(UpgradeBehavior::Install),
                    install_modes: BTreeSet::from([InstallMode::Silent]),
                    installer_switches: InstallerSwitches::default(),
                    installer_success_codes: vec![0],
                    commands: vec![],
                    protocols: vec![],
                    file_extensions: vec![],
                    capabilities: vec![],
                    restricted_capabilities: vec![],
                    dependencies: None,
                    display_version: None,
                    release_date: None,
                    multiple_nested_installer_architectures: false,
                }],
                installer_locale: None,
                platform: BTreeSet::new(),
                minimum_os_version: None,
                package_family_name: None,
                scope: None,
                upgrade_behavior: None,
                install_modes: BTreeSet::new(),
                installer_switches: InstallerSwitches::default(),
                installer_success_codes: vec![],
                commands: vec![],
                protocols: vec![],
                file_extensions: vec![],
                capabilities: vec![],
                restricted_capabilities: vec![],
                dependencies: None,
            },
            default_locale: DefaultLocaleManifest {
                common: common(ManifestType::DefaultLocale),
                package_locale: "en-US".to_string(),
                fields: LocaleFields {
                    publisher: "Publisher".to_string(),
                    package_name: "Package".to_string(),
                    license: "MIT".to_string(),
                    short_description: "A package.".to_string(),
                    ..Default::default()
                },
            },
            additional_locales: vec![],
        }
    }

    fn opts() -> EncodeOptions {
        EncodeOptions {
            producer: "pkgforge 0.1.0".to_string(),
            lang_server: "yaml-language-server".to_string(),
            schema_version: "1.9.0".to_string(),
        }
    }

    #[test]
    fn flow_round_trip() {
        let tree = sample_tree();
        let files = encode(&tree, Format::Flow, &opts());
        let texts = files.into_iter().map(|f| f.content).collect::<Vec<_>>();
        let decoded = decode(&texts).unwrap();
        assert_eq!(decoded, tree);
    }

    #[test]
    fn structural_round_trip() {
        let tree = sample_tree();
        let files = encode(&tree, Format::Structural, &opts());
        let texts = files.into_iter().map(|f| f.content).collect::<Vec<_>>();
        let decoded = decode(&texts).unwrap();
        assert_eq!(decoded, tree);
    }

    #[test]
    fn flow_encoding_is_stable_under_a_round_trip() {
        let tree = sample_tree();
        let first = encode(&tree, Format::Flow, &opts());
        let texts: Vec<String> = first.iter().map(|f| f.content.clone()).collect();
        let decoded = decode(&texts).unwrap();
        let second = encode(&decoded, Format::Flow, &opts());
        assert_eq!(
            first.iter().map(|f| &f.content).collect::<Vec<_>>(),
            second.iter().map(|f| &f.content).collect::<Vec<_>>()
        );
    }

    #[test]
    fn installer_manifest_file_name_matches_policy() {
        let tree = sample_tree();
        let files = encode(&tree, Format::Flow, &opts());
        assert!(files.iter().any(|f| f.file_name == "Publisher.Package.installer.yaml"));
        assert!(files.iter().any(|f| f.file_name == "Publisher.Package.yaml"));
        assert!(files
            .iter()
            .any(|f| f.file_name == "Publisher.Package.locale.en-US.yaml"));
    }

    #[test]
    fn singleton_splits_into_tree() {
        let single = Singleton {
            common: ManifestCommon {
                package_identifier: "Publisher.Package".to_string(),
                package_version: "1.0.0".to_string(),
                manifest_version: "1.9.0".to_string(),
                manifest_type: ManifestType::Singleton,
            },
            package_locale: "en-US".to_string(),
            fields: LocaleFields {
                publisher: "Publisher".to_string(),
                package_name: "Package".to_string(),
                license: "MIT".to_string(),
                short_description: "A package.".to_string(),
                ..Default::default()
            },
            installers: vec![],
        };
        let tree = ManifestTree::from_singleton(single);
        assert_eq!(tree.version.common.manifest_type, ManifestType::Version);
        assert_eq!(tree.installer.common.manifest_type, ManifestType::Installer);
        assert_eq!(tree.default_locale.common.manifest_type, ManifestType::DefaultLocale);
    }
}
