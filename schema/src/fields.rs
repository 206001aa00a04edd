//! Explicit per-type field tables: one function converting a model
//! type to the ordered `Value` tree the serializers walk, and one
//! converting back out of a parsed `Raw` tree. This is the single
//! place wire names live for each manifest type (see `crate::wire`
//! for the enum-level version of the same idea).

use indexmap::IndexMap;

use crate::de::{get, Raw};
use crate::errors::SchemaResult;
use crate::model::*;
use crate::ser::Value;

fn platform_set_to_value(platform: &std::collections::BTreeSet<Platform>) -> Value {
    Value::Seq(platform.iter().map(|p| Value::Str(p.wire().to_string())).collect())
}

fn platform_set_from_raw(map: &IndexMap<String, Raw>, key: &str) -> std::collections::BTreeSet<Platform> {
    get::str_list(map, key)
        .iter()
        .filter_map(|s| Platform::from_wire(s))
        .collect()
}

fn install_modes_to_value(modes: &std::collections::BTreeSet<InstallMode>) -> Value {
    Value::Seq(modes.iter().map(|m| Value::Str(m.wire().to_string())).collect())
}

fn install_modes_from_raw(map: &IndexMap<String, Raw>, key: &str) -> std::collections::BTreeSet<InstallMode> {
    get::str_list(map, key)
        .iter()
        .filter_map(|s| InstallMode::from_wire(s))
        .collect()
}

impl InstallerSwitches {
    pub fn to_fields(&self) -> Value {
        Value::Map(vec![
            ("Silent", Value::opt_str(&self.silent)),
            ("SilentWithProgress", Value::opt_str(&self.silent_with_progress)),
            ("Interactive", Value::opt_str(&self.interactive)),
            ("InstallLocation", Value::opt_str(&self.install_location)),
            ("Log", Value::opt_str(&self.log)),
            ("Upgrade", Value::opt_str(&self.upgrade)),
            ("Custom", Value::opt_str(&self.custom)),
        ])
    }

    pub fn from_raw(map: &IndexMap<String, Raw>) -> Self {
        Self {
            silent: get::str_opt(map, "Silent"),
            silent_with_progress: get::str_opt(map, "SilentWithProgress"),
            interactive: get::str_opt(map, "Interactive"),
            install_location: get::str_opt(map, "InstallLocation"),
            log: get::str_opt(map, "Log"),
            upgrade: get::str_opt(map, "Upgrade"),
            custom: get::str_opt(map, "Custom"),
        }
    }
}

impl Dependencies {
    pub fn to_fields(&self) -> Value {
        Value::Map(vec![
            ("WindowsFeatures", Value::str_list(&self.windows_features)),
            ("WindowsLibraries", Value::str_list(&self.windows_libraries)),
            (
                "PackageDependencies",
                Value::Seq(
                    self.package_dependencies
                        .iter()
                        .map(|(id, ver)| {
                            Value::Map(vec![
                                ("PackageIdentifier", Value::Str(id.clone())),
                                ("MinimumVersion", Value::opt_str(ver)),
                            ])
                        })
                        .collect(),
                ),
            ),
            ("ExternalDependencies", Value::str_list(&self.external_dependencies)),
        ])
    }

    pub fn from_raw(map: &IndexMap<String, Raw>) -> Self {
        let package_dependencies = get::seq_opt(map, "PackageDependencies")
            .iter()
            .filter_map(Raw::as_map)
            .filter_map(|entry| {
                get::str_opt(entry, "PackageIdentifier")
                    .map(|id| (id, get::str_opt(entry, "MinimumVersion")))
            })
            .collect();
        Self {
            windows_features: get::str_list(map, "WindowsFeatures"),
            windows_libraries: get::str_list(map, "WindowsLibraries"),
            package_dependencies,
            external_dependencies: get::str_list(map, "ExternalDependencies"),
        }
    }
}

impl NestedInstallerFile {
    pub fn to_fields(&self) -> Value {
        Value::Map(vec![
            ("RelativeFilePath", Value::Str(self.relative_path.clone())),
            (
                "PortableCommandAlias",
                Value::opt_str(&self.portable_command_alias),
            ),
        ])
    }

    pub fn from_raw(map: &IndexMap<String, Raw>, path: &str) -> SchemaResult<Self> {
        Ok(Self {
            relative_path: get::str_req(map, "RelativeFilePath", path)?,
            portable_command_alias: get::str_opt(map, "PortableCommandAlias"),
        })
    }
}

impl Installer {
    pub fn to_fields(&self) -> Value {
        Value::Map(vec![
            ("InstallerUrl", Value::Str(self.installer_url.clone())),
            ("InstallerSha256", Value::Str(self.installer_sha256.clone())),
            ("SignatureSha256", Value::opt_str(&self.signature_sha256)),
            (
                "Architecture",
                match self.architecture {
                    Some(a) => Value::Str(a.wire().to_string()),
                    None => Value::Null,
                },
            ),
            (
                "InstallerType",
                match self.installer_type {
                    Some(t) => Value::Str(t.wire().to_string()),
                    None => Value::Null,
                },
            ),
            (
                "NestedInstallerType",
                match self.nested_installer_type {
                    Some(t) => Value::Str(t.wire().to_string()),
                    None => Value::Null,
                },
            ),
            (
                "NestedInstallerFiles",
                Value::Seq(self.nested_installer_files.iter().map(|f| f.to_fields()).collect()),
            ),
            (
                "Scope",
                match self.scope {
                    Some(s) => Value::Str(s.wire().to_string()),
                    None => Value::Null,
                },
            ),
            ("InstallerLocale", Value::opt_str(&self.installer_locale)),
            ("ProductCode", Value::opt_str(&self.product_code)),
            ("PackageFamilyName", Value::opt_str(&self.package_family_name)),
            ("Platform", platform_set_to_value(&self.platform)),
            ("MinimumOSVersion", Value::opt_str(&self.minimum_os_version)),
            (
                "UpgradeBehavior",
                match self.upgrade_behavior {
                    Some(b) => Value::Str(b.wire().to_string()),
                    None => Value::Null,
                },
            ),
            ("InstallModes", install_modes_to_value(&self.install_modes)),
            ("InstallerSwitches", self.installer_switches.to_fields()),
            ("InstallerSuccessCodes", Value::int_list(&self.installer_success_codes)),
            ("Commands", Value::str_list(&self.commands)),
            ("Protocols", Value::str_list(&self.protocols)),
            ("FileExtensions", Value::str_list(&self.file_extensions)),
            ("Capabilities", Value::str_list(&self.capabilities)),
            ("RestrictedCapabilities", Value::str_list(&self.restricted_capabilities)),
            (
                "Dependencies",
                match &self.dependencies {
                    Some(d) => d.to_fields(),
                    None => Value::Null,
                },
            ),
            ("DisplayVersion", Value::opt_str(&self.display_version)),
            ("ReleaseDate", Value::opt_date(&self.release_date)),
        ])
    }

    pub fn from_raw(map: &IndexMap<String, Raw>, path: &str) -> SchemaResult<Self> {
        let nested_installer_files = get::seq_opt(map, "NestedInstallerFiles")
            .iter()
            .filter_map(Raw::as_map)
            .map(|m| NestedInstallerFile::from_raw(m, path))
            .collect::<SchemaResult<Vec<_>>>()?;
        let dependencies = get::map_opt(map, "Dependencies").map(Dependencies::from_raw);
        let installer_switches = get::map_opt(map, "InstallerSwitches")
            .map(InstallerSwitches::from_raw)
            .unwrap_or_default();

        Ok(Self {
            installer_url: get::str_req(map, "InstallerUrl", path)?,
            installer_sha256: get::str_req(map, "InstallerSha256", path)?,
            signature_sha256: get::str_opt(map, "SignatureSha256"),
            architecture: get::str_opt(map, "Architecture").and_then(|s| Architecture::from_wire(&s)),
            installer_type: get::str_opt(map, "InstallerType").and_then(|s| InstallerType::from_wire(&s)),
            nested_installer_type: get::str_opt(map, "NestedInstallerType")
                .and_then(|s| NestedInstallerType::from_wire(&s)),
            nested_installer_files,
            scope: get::str_opt(map, "Scope").and_then(|s| Scope::from_wire(&s)),
            installer_locale: get::str_opt(map, "InstallerLocale"),
            product_code: get::str_opt(map, "ProductCode"),
            package_family_name: get::str_opt(map, "PackageFamilyName"),
            platform: platform_set_from_raw(map, "Platform"),
            minimum_os_version: get::str_opt(map, "MinimumOSVersion"),
            upgrade_behavior: get::str_opt(map, "UpgradeBehavior").and_then(|s| UpgradeBehavior::from_wire(&s)),
            install_modes: install_modes_from_raw(map, "InstallModes"),
            installer_switches,
            installer_success_codes: get::int_list(map, "InstallerSuccessCodes"),
            commands: get::str_list(map, "Commands"),
            protocols: get::str_list(map, "Protocols"),
            file_extensions: get::str_list(map, "FileExtensions"),
            capabilities: get::str_list(map, "Capabilities"),
            restricted_capabilities: get::str_list(map, "RestrictedCapabilities"),
            dependencies,
            display_version: get::str_opt(map, "DisplayVersion"),
            release_date: get::date_opt(map, "ReleaseDate"),
            multiple_nested_installer_architectures: false,
        })
    }
}

fn common_fields(common: &ManifestCommon) -> Vec<(&'static str, Value)> {
    vec![
        ("PackageIdentifier", Value::Str(common.package_identifier.clone())),
        ("PackageVersion", Value::Str(common.package_version.clone())),
        ("ManifestType", Value::Str(common.manifest_type.wire().to_string())),
        ("ManifestVersion", Value::Str(common.manifest_version.clone())),
    ]
}

fn common_from_raw(map: &IndexMap<String, Raw>, path: &str, expect: ManifestType) -> SchemaResult<ManifestCommon> {
    let manifest_type = get::str_opt(map, "ManifestType")
        .and_then(|s| ManifestType::from_wire(&s))
        .unwrap_or(expect);
    Ok(ManifestCommon {
        package_identifier: get::str_req(map, "PackageIdentifier", path)?,
        package_version: get::str_req(map, "PackageVersion", path)?,
        manifest_version: get::str_req(map, "ManifestVersion", path)?,
        manifest_type,
    })
}

impl VersionManifest {
    pub fn to_fields(&self) -> Value {
        let mut fields = common_fields(&self.common);
        fields.push(("DefaultLocale", Value::Str(self.default_locale.clone())));
        Value::Map(fields)
    }

    pub fn from_raw(map: &IndexMap<String, Raw>, path: &str) -> SchemaResult<Self> {
        Ok(Self {
            common: common_from_raw(map, path, ManifestType::Version)?,
            default_locale: get::str_req(map, "DefaultLocale", path)?,
        })
    }
}

impl InstallerManifest {
    pub fn to_fields(&self) -> Value {
        let mut fields = common_fields(&self.common);
        fields.extend([
            (
                "InstallerType",
                match self.installer_type {
                    Some(t) => Value::Str(t.wire().to_string()),
                    None => Value::Null,
                },
            ),
            ("InstallerLocale", Value::opt_str(&self.installer_locale)),
            ("Platform", platform_set_to_value(&self.platform)),
            ("MinimumOSVersion", Value::opt_str(&self.minimum_os_version)),
            ("PackageFamilyName", Value::opt_str(&self.package_family_name)),
            (
                "Scope",
                match self.scope {
                    Some(s) => Value::Str(s.wire().to_string()),
                    None => Value::Null,
                },
            ),
            (
                "UpgradeBehavior",
                match self.upgrade_behavior {
                    Some(b) => Value::Str(b.wire().to_string()),
                    None => Value::Null,
                },
            ),
            ("InstallModes", install_modes_to_value(&self.install_modes)),
            ("InstallerSwitches", self.installer_switches.to_fields()),
            ("InstallerSuccessCodes", Value::int_list(&self.installer_success_codes)),
            ("Commands", Value::str_list(&self.commands)),
            ("Protocols", Value::str_list(&self.protocols)),
            ("FileExtensions", Value::str_list(&self.file_extensions)),
            ("Capabilities", Value::str_list(&self.capabilities)),
            ("RestrictedCapabilities", Value::str_list(&self.restricted_capabilities)),
            (
                "Dependencies",
                match &self.dependencies {
                    Some(d) => d.to_fields(),
                    None => Value::Null,
                },
            ),
            (
                "Installers",
                Value::Seq(self.installers.iter().map(|i| i.to_fields()).collect()),
            ),
        ]);
        Value::Map(fields)
    }

    pub fn from_raw(map: &IndexMap<String, Raw>, path: &str) -> SchemaResult<Self> {
        let installers = get::seq_opt(map, "Installers")
            .iter()
            .filter_map(Raw::as_map)
            .enumerate()
            .map(|(i, m)| Installer::from_raw(m, &format!("{path}.Installers[{i}]")))
            .collect::<SchemaResult<Vec<_>>>()?;
        let dependencies = get::map_opt(map, "Dependencies").map(Dependencies::from_raw);
        let installer_switches = get::map_opt(map, "InstallerSwitches")
            .map(InstallerSwitches::from_raw)
            .unwrap_or_default();

        Ok(Self {
            common: common_from_raw(map, path, ManifestType::Installer)?,
            installers,
            installer_type: get::str_opt(map, "InstallerType").and_then(|s| InstallerType::from_wire(&s)),
            installer_locale: get::str_opt(map, "InstallerLocale"),
            platform: platform_set_from_raw(map, "Platform"),
            minimum_os_version: get::str_opt(map, "MinimumOSVersion"),
            package_family_name: get::str_opt(map, "PackageFamilyName"),
            scope: get::str_opt(map, "Scope").and_then(|s| Scope::from_wire(&s)),
            upgrade_behavior: get::str_opt(map, "UpgradeBehavior").and_then(|s| UpgradeBehavior::from_wire(&s)),
            install_modes: install_modes_from_raw(map, "InstallModes"),
            installer_switches,
            installer_success_codes: get::int_list(map, "InstallerSuccessCodes"),
            commands: get::str_list(map, "Commands"),
            protocols: get::str_list(map, "Protocols"),
            file_extensions: get::str_list(map, "FileExtensions"),
            capabilities: get::str_list(map, "Capabilities"),
            restricted_capabilities: get::str_list(map, "RestrictedCapabilities"),
            dependencies,
        })
    }
}

impl LocaleFields {
    fn to_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("Publisher", Value::Str(self.publisher.clone())),
            ("PublisherUrl", Value::opt_str(&self.publisher_url)),
            ("PublisherSupportUrl", Value::opt_str(&self.publisher_support_url)),
            ("PrivacyUrl", Value::opt_str(&self.privacy_url)),
            ("Author", Value::opt_str(&self.author)),
            ("PackageName", Value::Str(self.package_name.clone())),
            ("PackageUrl", Value::opt_str(&self.package_url)),
            ("License", Value::Str(self.license.clone())),
            ("LicenseUrl", Value::opt_str(&self.license_url)),
            ("Copyright", Value::opt_str(&self.copyright)),
            ("CopyrightUrl", Value::opt_str(&self.copyright_url)),
            ("ShortDescription", Value::Str(self.short_description.clone())),
            ("Description", Value::opt_str(&self.description)),
            ("Moniker", Value::opt_str(&self.moniker)),
            ("Tags", Value::str_list(&self.tags)),
            ("ReleaseNotes", Value::opt_str(&self.release_notes)),
            ("ReleaseNotesUrl", Value::opt_str(&self.release_notes_url)),
            ("PurchaseUrl", Value::opt_str(&self.purchase_url)),
            ("InstallationNotes", Value::opt_str(&self.installation_notes)),
            (
                "Documentations",
                Value::Seq(
                    self.documentations
                        .iter()
                        .map(|(label, url)| {
                            Value::Map(vec![
                                ("DocumentLabel", Value::Str(label.clone())),
                                ("DocumentUrl", Value::Str(url.clone())),
                            ])
                        })
                        .collect(),
                ),
            ),
        ]
    }

    fn from_raw(map: &IndexMap<String, Raw>, path: &str) -> SchemaResult<Self> {
        let documentations = get::seq_opt(map, "Documentations")
            .iter()
            .filter_map(Raw::as_map)
            .filter_map(|entry| {
                Some((
                    get::str_opt(entry, "DocumentLabel")?,
                    get::str_opt(entry, "DocumentUrl")?,
                ))
            })
            .collect();
        Ok(Self {
            publisher: get::str_req(map, "Publisher", path)?,
            publisher_url: get::str_opt(map, "PublisherUrl"),
            publisher_support_url: get::str_opt(map, "PublisherSupportUrl"),
            privacy_url: get::str_opt(map, "PrivacyUrl"),
            author: get::str_opt(map, "Author"),
            package_name: get::str_req(map, "PackageName", path)?,
            package_url: get::str_opt(map, "PackageUrl"),
            license: get::str_req(map, "License", path)?,
            license_url: get::str_opt(map, "LicenseUrl"),
            copyright: get::str_opt(map, "Copyright"),
            copyright_url: get::str_opt(map, "CopyrightUrl"),
            short_description: get::str_req(map, "ShortDescription", path)?,
            description: get::str_opt(map, "Description"),
            moniker: get::str_opt(map, "Moniker"),
            tags: get::str_list(map, "Tags"),
            release_notes: get::str_opt(map, "ReleaseNotes"),
            release_notes_url: get::str_opt(map, "ReleaseNotesUrl"),
            purchase_url: get::str_opt(map, "PurchaseUrl"),
            installation_notes: get::str_opt(map, "InstallationNotes"),
            documentations,
        })
    }
}

impl DefaultLocaleManifest {
    pub fn to_fields(&self) -> Value {
        let mut fields = common_fields(&self.common);
        fields.push(("PackageLocale", Value::Str(self.package_locale.clone())));
        fields.extend(self.fields.to_fields());
        Value::Map(fields)
    }

    pub fn from_raw(map: &IndexMap<String, Raw>, path: &str) -> SchemaResult<Self> {
        Ok(Self {
            common: common_from_raw(map, path, ManifestType::DefaultLocale)?,
            package_locale: get::str_req(map, "PackageLocale", path)?,
            fields: LocaleFields::from_raw(map, path)?,
        })
    }
}

impl AdditionalLocaleManifest {
    pub fn to_fields(&self) -> Value {
        let mut fields = common_fields(&self.common);
        fields.push(("PackageLocale", Value::Str(self.package_locale.clone())));
        fields.extend(self.fields.to_fields());
        Value::Map(fields)
    }

    pub fn from_raw(map: &IndexMap<String, Raw>, path: &str) -> SchemaResult<Self> {
        Ok(Self {
            common: common_from_raw(map, path, ManifestType::Locale)?,
            package_locale: get::str_req(map, "PackageLocale", path)?,
            fields: LocaleFields::from_raw(map, path)?,
        })
    }
}

impl Singleton {
    pub fn from_raw(map: &IndexMap<String, Raw>, path: &str) -> SchemaResult<Self> {
        let installers = get::seq_opt(map, "Installers")
            .iter()
            .filter_map(Raw::as_map)
            .enumerate()
            .map(|(i, m)| Installer::from_raw(m, &format!("{path}.Installers[{i}]")))
            .collect::<SchemaResult<Vec<_>>>()?;
        Ok(Self {
            common: common_from_raw(map, path, ManifestType::Singleton)?,
            package_locale: get::str_req(map, "PackageLocale", path)?,
            fields: LocaleFields::from_raw(map, path)?,
            installers,
        })
    }

    /// Not produced by the engine's own serializer (§3.2: "the engine
    /// always emits the split form"), but kept so tests and external
    /// tooling that still emit singletons have a symmetric writer.
    pub fn to_fields(&self) -> Value {
        let mut fields = common_fields(&self.common);
        fields.push(("PackageLocale", Value::Str(self.package_locale.clone())));
        fields.extend(self.fields.to_fields());
        fields.push((
            "Installers",
            Value::Seq(self.installers.iter().map(|i| i.to_fields()).collect()),
        ));
        Value::Map(fields)
    }
}

/// Look a package identifier up from raw text without fully parsing
/// the record — used by the format sniff's caller to decide which
/// manifest-type parser to dispatch to before committing to one.
pub fn peek_manifest_type(raw: &Raw) -> Option<ManifestType> {
    raw.as_map()
        .and_then(|m| get::str_opt(m, "ManifestType"))
        .and_then(|s| ManifestType::from_wire(&s))
}
