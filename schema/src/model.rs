//! The manifest tree: the typed model the engine reads, merges, and
//! writes back out. See `crate::wire` for the enum surface-spelling
//! tables and `crate::fields` for the per-type field tables consumed
//! by the serializers in `crate::ser`.

use std::collections::BTreeSet;

/// CPU target of an installer's primary payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Architecture {
    X86,
    X64,
    Arm,
    Arm64,
    Neutral,
}

/// The software-distribution format family of a downloaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallerType {
    Exe,
    Msi,
    Msix,
    Appx,
    Wix,
    Burn,
    Inno,
    Nullsoft,
    Portable,
    Zip,
}

/// Same family as [`InstallerType`], minus `Zip` (a nested installer
/// can't itself be a ZIP carrier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NestedInstallerType {
    Exe,
    Msi,
    Msix,
    Appx,
    Wix,
    Burn,
    Inno,
    Nullsoft,
    Portable,
}

impl TryFrom<InstallerType> for NestedInstallerType {
    type Error = ();

    fn try_from(value: InstallerType) -> Result<Self, Self::Error> {
        Ok(match value {
            InstallerType::Exe => Self::Exe,
            InstallerType::Msi => Self::Msi,
            InstallerType::Msix => Self::Msix,
            InstallerType::Appx => Self::Appx,
            InstallerType::Wix => Self::Wix,
            InstallerType::Burn => Self::Burn,
            InstallerType::Inno => Self::Inno,
            InstallerType::Nullsoft => Self::Nullsoft,
            InstallerType::Portable => Self::Portable,
            InstallerType::Zip => return Err(()),
        })
    }
}

impl From<NestedInstallerType> for InstallerType {
    fn from(value: NestedInstallerType) -> Self {
        match value {
            NestedInstallerType::Exe => Self::Exe,
            NestedInstallerType::Msi => Self::Msi,
            NestedInstallerType::Msix => Self::Msix,
            NestedInstallerType::Appx => Self::Appx,
            NestedInstallerType::Wix => Self::Wix,
            NestedInstallerType::Burn => Self::Burn,
            NestedInstallerType::Inno => Self::Inno,
            NestedInstallerType::Nullsoft => Self::Nullsoft,
            NestedInstallerType::Portable => Self::Portable,
        }
    }
}

/// Compatibility partition used by the Matcher when exact-type
/// matching fails (§4.H, tier 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityClass {
    Exe,
    Msi,
    Msix,
}

impl InstallerType {
    /// The compatibility class this installer type belongs to, if any.
    /// MSIX-family-only types (`msix`, `appx`) and MSI-family types
    /// (`msi`, `wix`) and EXE-family types (`exe`, `inno`, `nullsoft`,
    /// `burn`, `portable`) each form one class; `zip` belongs to none,
    /// since a ZIP carrier is never itself matched by compatibility
    /// class (its nested type is, if the match narrows that far).
    pub fn compatibility_class(self) -> Option<CompatibilityClass> {
        match self {
            Self::Exe | Self::Inno | Self::Nullsoft | Self::Burn | Self::Portable => {
                Some(CompatibilityClass::Exe)
            }
            Self::Msi | Self::Wix => Some(CompatibilityClass::Msi),
            Self::Msix | Self::Appx => Some(CompatibilityClass::Msix),
            Self::Zip => None,
        }
    }
}

/// Privilege level an installer runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    User,
    Machine,
}

/// MSIX `TargetDeviceFamily` platform, mapped from the manifest's
/// `Name` attribute (`.` substituted with `_`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    WindowsDesktop,
    WindowsUniversal,
    WindowsIot,
    WindowsTeam,
    WindowsHolographic,
    WindowsXbox,
}

/// What happens to a previous install during an upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeBehavior {
    Install,
    UninstallPrevious,
}

/// Supported invocation modes for an installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InstallMode {
    Interactive,
    Silent,
    SilentWithProgress,
}

/// One relative path extracted from a ZIP carrier and treated as the
/// true installer for metadata purposes (§4.F), plus the alias a
/// generated portable-command shim should use, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedInstallerFile {
    pub relative_path: String,
    pub portable_command_alias: Option<String>,
}

/// Pass-through dependency declarations. The engine never inspects
/// these; it only ever preserves them across an update (§4.I).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    pub windows_features: Vec<String>,
    pub windows_libraries: Vec<String>,
    /// `{package_identifier, minimum_version?}` pairs.
    pub package_dependencies: Vec<(String, Option<String>)>,
    pub external_dependencies: Vec<String>,
}

/// The matching and merge unit (§3.1).
#[derive(Debug, Clone, PartialEq)]
pub struct Installer {
    pub installer_url: String,
    pub installer_sha256: String,
    pub signature_sha256: Option<String>,
    pub architecture: Option<Architecture>,
    pub installer_type: Option<InstallerType>,
    pub nested_installer_type: Option<NestedInstallerType>,
    pub nested_installer_files: Vec<NestedInstallerFile>,
    pub scope: Option<Scope>,
    pub installer_locale: Option<String>,
    pub product_code: Option<String>,
    pub package_family_name: Option<String>,
    pub platform: BTreeSet<Platform>,
    pub minimum_os_version: Option<String>,
    pub upgrade_behavior: Option<UpgradeBehavior>,
    pub install_modes: BTreeSet<InstallMode>,
    pub installer_switches: InstallerSwitches,
    pub installer_success_codes: Vec<i64>,
    pub commands: Vec<String>,
    pub protocols: Vec<String>,
    pub file_extensions: Vec<String>,
    pub capabilities: Vec<String>,
    pub restricted_capabilities: Vec<String>,
    pub dependencies: Option<Dependencies>,
    pub display_version: Option<String>,
    /// Canonical `YYYY-MM-DD`; rendered as a date string in flow
    /// format and a Unix timestamp in structural format (§4.I, §4.J).
    pub release_date: Option<String>,
    /// Set by the ZIP Inspector (§4.F) when two nested files disagree
    /// on architecture. Not a failure; it makes the record
    /// architecture-indeterminate for matching purposes.
    pub multiple_nested_installer_architectures: bool,
}

/// Free-form switches passed through untouched (§3.1 pass-through set).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallerSwitches {
    pub silent: Option<String>,
    pub silent_with_progress: Option<String>,
    pub interactive: Option<String>,
    pub install_location: Option<String>,
    pub log: Option<String>,
    pub upgrade: Option<String>,
    pub custom: Option<String>,
}

/// The enumeration of manifest files that make up one package version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestType {
    Version,
    Installer,
    DefaultLocale,
    Locale,
    Singleton,
}

/// Fields shared by every manifest file in a tree (§3.2 preamble).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestCommon {
    pub package_identifier: String,
    pub package_version: String,
    pub manifest_version: String,
    pub manifest_type: ManifestType,
}

/// Version manifest: pointer to the default locale and the rest of
/// the manifest set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionManifest {
    pub common: ManifestCommon,
    pub default_locale: String,
}

/// Installer manifest: the ordered list of [`Installer`] records plus
/// locale-neutral defaults for fields that may be hoisted (§I5).
#[derive(Debug, Clone, PartialEq)]
pub struct InstallerManifest {
    pub common: ManifestCommon,
    pub installers: Vec<Installer>,
    /// Manifest-level default installer type. Not itself part of I5's
    /// hoistable set, but used the same way by the Matcher's exact-type
    /// tier (§4.H): a record's "effective" type falls back to this when
    /// the record omits its own.
    pub installer_type: Option<InstallerType>,
    pub installer_locale: Option<String>,
    pub platform: BTreeSet<Platform>,
    pub minimum_os_version: Option<String>,
    pub package_family_name: Option<String>,
    pub scope: Option<Scope>,
    pub upgrade_behavior: Option<UpgradeBehavior>,
    pub install_modes: BTreeSet<InstallMode>,
    pub installer_switches: InstallerSwitches,
    pub installer_success_codes: Vec<i64>,
    pub commands: Vec<String>,
    pub protocols: Vec<String>,
    pub file_extensions: Vec<String>,
    pub capabilities: Vec<String>,
    pub restricted_capabilities: Vec<String>,
    pub dependencies: Option<Dependencies>,
}

/// Mandatory localized fields for a package's default locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleFields {
    pub publisher: String,
    pub publisher_url: Option<String>,
    pub publisher_support_url: Option<String>,
    pub privacy_url: Option<String>,
    pub author: Option<String>,
    pub package_name: String,
    pub package_url: Option<String>,
    pub license: String,
    pub license_url: Option<String>,
    pub copyright: Option<String>,
    pub copyright_url: Option<String>,
    pub short_description: String,
    pub description: Option<String>,
    pub moniker: Option<String>,
    pub tags: Vec<String>,
    pub release_notes: Option<String>,
    pub release_notes_url: Option<String>,
    pub purchase_url: Option<String>,
    pub installation_notes: Option<String>,
    pub documentations: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultLocaleManifest {
    pub common: ManifestCommon,
    pub package_locale: String,
    pub fields: LocaleFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalLocaleManifest {
    pub common: ManifestCommon,
    pub package_locale: String,
    pub fields: LocaleFields,
}

/// The union of the above, used only as an input format (§3.2). The
/// engine always emits the split form; a `Singleton` is converted to
/// a [`ManifestTree`] on the way in and never produced on the way out.
#[derive(Debug, Clone, PartialEq)]
pub struct Singleton {
    pub common: ManifestCommon,
    pub package_locale: String,
    pub fields: LocaleFields,
    pub installers: Vec<Installer>,
}

/// The full manifest tree for one package version (§3.2).
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestTree {
    pub version: VersionManifest,
    pub installer: InstallerManifest,
    pub default_locale: DefaultLocaleManifest,
    pub additional_locales: Vec<AdditionalLocaleManifest>,
}

impl ManifestTree {
    /// The case-insensitive-stable package identifier (§I1), taking
    /// the canonical case from the version manifest.
    pub fn package_identifier(&self) -> &str {
        &self.version.common.package_identifier
    }

    /// Split a [`Singleton`] into the five-file tree the engine
    /// always works with internally.
    pub fn from_singleton(singleton: Singleton) -> Self {
        let Singleton {
            common,
            package_locale,
            fields,
            installers,
        } = singleton;

        let version = VersionManifest {
            common: ManifestCommon {
                manifest_type: ManifestType::Version,
                ..common.clone()
            },
            default_locale: package_locale.clone(),
        };
        let installer = InstallerManifest {
            common: ManifestCommon {
                manifest_type: ManifestType::Installer,
                ..common.clone()
            },
            installers,
            installer_type: None,
            installer_locale: None,
            platform: Default::default(),
            minimum_os_version: None,
            package_family_name: None,
            scope: None,
            upgrade_behavior: None,
            install_modes: Default::default(),
            installer_switches: Default::default(),
            installer_success_codes: Vec::new(),
            commands: Vec::new(),
            protocols: Vec::new(),
            file_extensions: Vec::new(),
            capabilities: Vec::new(),
            restricted_capabilities: Vec::new(),
            dependencies: None,
        };
        let default_locale = DefaultLocaleManifest {
            common: ManifestCommon {
                manifest_type: ManifestType::DefaultLocale,
                ..common
            },
            package_locale,
            fields,
        };

        Self {
            version,
            installer,
            default_locale,
            additional_locales: Vec::new(),
        }
    }
}
