//! MSIX/APPX Inspector (§4.E): bundle and single-package layouts over
//! a ZIP-shaped container, read with `zip` and `quick-xml`.

use super::InspectOutcome;
use crate::hash::sha256_hex_upper;
use crate::pfn::package_family_name;
use pkgforge_schema::model::{Architecture, Platform};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// One installable package surfaced by the inspector: either the lone
/// package in a single-package container, or one child of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsixPackageInfo {
    /// `Identity/@Name`.
    pub name: String,
    /// `Identity/@Publisher`, the full distinguished name.
    pub publisher: String,
    /// `Identity/@Version`.
    pub version: String,
    /// CPU target from `Identity/@ProcessorArchitecture`.
    pub architecture: Architecture,
    /// `Properties/DisplayName`, if present.
    pub display_name: Option<String>,
    /// `Properties/PublisherDisplayName`, if present.
    pub publisher_display_name: Option<String>,
    /// `Properties/Description`, if present.
    pub description: Option<String>,
    /// Platforms derived from `Dependencies/TargetDeviceFamily` names.
    pub platform: BTreeSet<Platform>,
    /// Lowest `TargetDeviceFamily/@MinVersion` across declared families.
    pub minimum_os_version: Option<String>,
    /// Computed per §4.E; lowercase here, uppercased by the Package
    /// Parser before it reaches an `Installer` record.
    pub package_family_name: String,
}

/// Everything the MSIX Inspector read from one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsixInfo {
    /// SHA-256 of `AppxSignature.p7x`, if the container carried one.
    pub signature_sha256: Option<String>,
    /// One entry per installable package (bundles may have several).
    pub packages: Vec<MsixPackageInfo>,
}

#[derive(Debug, Deserialize)]
struct PackageXml {
    #[serde(rename = "Identity")]
    identity: IdentityXml,
    #[serde(rename = "Properties", default)]
    properties: Option<PropertiesXml>,
    #[serde(rename = "Dependencies", default)]
    dependencies: Option<DependenciesXml>,
}

#[derive(Debug, Deserialize)]
struct IdentityXml {
    #[serde(rename = "@Name")]
    name: String,
    #[serde(rename = "@Publisher")]
    publisher: String,
    #[serde(rename = "@Version")]
    version: String,
    #[serde(rename = "@ProcessorArchitecture", default)]
    processor_architecture: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PropertiesXml {
    #[serde(rename = "DisplayName", default)]
    display_name: Option<String>,
    #[serde(rename = "PublisherDisplayName", default)]
    publisher_display_name: Option<String>,
    #[serde(rename = "Description", default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DependenciesXml {
    #[serde(rename = "TargetDeviceFamily", default)]
    target_device_family: Vec<TargetDeviceFamilyXml>,
}

#[derive(Debug, Deserialize)]
struct TargetDeviceFamilyXml {
    #[serde(rename = "@Name")]
    name: String,
    #[serde(rename = "@MinVersion")]
    min_version: String,
}

#[derive(Debug, Deserialize)]
struct BundleXml {
    #[serde(rename = "Packages")]
    packages: BundlePackagesXml,
}

#[derive(Debug, Deserialize)]
struct BundlePackagesXml {
    #[serde(rename = "Package", default)]
    package: Vec<BundlePackageXml>,
}

#[derive(Debug, Deserialize)]
struct BundlePackageXml {
    #[serde(rename = "@PackageType")]
    package_type: String,
    #[serde(rename = "@RelativeFilePath")]
    relative_file_path: String,
}

fn architecture_from_processor(value: Option<&str>) -> Architecture {
    match value {
        Some("x86") => Architecture::X86,
        Some("x64") => Architecture::X64,
        Some("arm") => Architecture::Arm,
        Some("arm64") => Architecture::Arm64,
        _ => Architecture::Neutral,
    }
}

fn read_zip_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, path: &str) -> Option<Vec<u8>> {
    let normalized = path.replace('\\', "/");
    let mut file = archive.by_name(&normalized).or_else(|_| archive.by_name(path)).ok()?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).ok()?;
    Some(buf)
}

fn parse_package_xml(xml: &str) -> Result<MsixPackageInfo, String> {
    let parsed: PackageXml = quick_xml::de::from_str(xml).map_err(|e| e.to_string())?;

    let mut platform = BTreeSet::new();
    let mut minimum_os_version: Option<String> = None;
    if let Some(deps) = &parsed.dependencies {
        for tdf in &deps.target_device_family {
            if let Some(p) = Platform::from_target_device_family(&tdf.name) {
                platform.insert(p);
            }
            minimum_os_version = match &minimum_os_version {
                Some(current) if version_ge(current, &tdf.min_version) => Some(current.clone()),
                _ => Some(tdf.min_version.clone()),
            };
        }
    }

    let properties = parsed.properties.unwrap_or_default();
    // Left lowercase here, as the algorithm in §4.E produces it; the
    // Package Parser uppercases it before it reaches an Installer
    // record (SPEC_FULL.md §3).
    let package_family_name = package_family_name(&parsed.identity.name, &parsed.identity.publisher);

    Ok(MsixPackageInfo {
        name: parsed.identity.name,
        publisher: parsed.identity.publisher,
        version: parsed.identity.version,
        architecture: architecture_from_processor(parsed.identity.processor_architecture.as_deref()),
        display_name: properties.display_name,
        publisher_display_name: properties.publisher_display_name,
        description: properties.description,
        platform,
        minimum_os_version,
        package_family_name,
    })
}

/// Compare two dotted-numeric version strings, treating any
/// unparsable segment as `0`. Good enough for "largest `MinVersion`
/// seen" (§4.E); not a general version-ordering facility.
fn version_ge(a: &str, b: &str) -> bool {
    let parse = |s: &str| -> Vec<u64> { s.split('.').map(|p| p.parse().unwrap_or(0)).collect() };
    parse(a) >= parse(b)
}

/// Inspect `buf` as an MSIX/APPX container.
pub fn inspect(buf: &[u8]) -> InspectOutcome<MsixInfo> {
    let mut archive = match ZipArchive::new(Cursor::new(buf)) {
        Ok(a) => a,
        Err(_) => return InspectOutcome::NotThisFormat,
    };

    if let Some(bundle_xml) = read_zip_entry(&mut archive, "AppxMetadata/AppxBundleManifest.xml") {
        return inspect_bundle(&mut archive, &bundle_xml);
    }

    match read_zip_entry(&mut archive, "AppxManifest.xml") {
        Some(manifest_xml) => match parse_package_xml(&String::from_utf8_lossy(&manifest_xml)) {
            Ok(package) => {
                let signature_sha256 =
                    read_zip_entry(&mut archive, "AppxSignature.p7x").map(|bytes| sha256_hex_upper(&bytes));
                InspectOutcome::Matched(MsixInfo {
                    signature_sha256,
                    packages: vec![package],
                })
            }
            Err(reason) => InspectOutcome::ParseFailure(reason),
        },
        None => InspectOutcome::NotThisFormat,
    }
}

fn inspect_bundle(archive: &mut ZipArchive<Cursor<&[u8]>>, bundle_xml: &[u8]) -> InspectOutcome<MsixInfo> {
    let bundle: BundleXml = match quick_xml::de::from_str(&String::from_utf8_lossy(bundle_xml)) {
        Ok(b) => b,
        Err(e) => return InspectOutcome::ParseFailure(e.to_string()),
    };

    let signature_sha256 = read_zip_entry(archive, "AppxSignature.p7x").map(|bytes| sha256_hex_upper(&bytes));

    let mut packages = Vec::new();
    for child in &bundle.packages.package {
        if child.package_type != "application" {
            continue;
        }
        if child.relative_file_path.starts_with("AppxMetadata\\Stub") {
            continue;
        }
        let Some(child_bytes) = read_zip_entry(archive, &child.relative_file_path) else {
            continue;
        };
        let mut child_archive = match ZipArchive::new(Cursor::new(child_bytes.as_slice())) {
            Ok(a) => a,
            Err(_) => continue,
        };
        let Some(manifest_xml) = read_zip_entry(&mut child_archive, "AppxManifest.xml") else {
            continue;
        };
        match parse_package_xml(&String::from_utf8_lossy(&manifest_xml)) {
            Ok(package) => packages.push(package),
            Err(_) => continue,
        }
    }

    InspectOutcome::Matched(MsixInfo {
        signature_sha256,
        packages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processor_architecture_mapping() {
        assert_eq!(architecture_from_processor(Some("x64")), Architecture::X64);
        assert_eq!(architecture_from_processor(Some("neutral")), Architecture::Neutral);
        assert_eq!(architecture_from_processor(None), Architecture::Neutral);
    }

    #[test]
    fn parses_minimal_package_manifest() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<Package>
  <Identity Name="Contoso.App" Publisher="CN=Contoso" Version="1.0.0.0" ProcessorArchitecture="x64" />
  <Properties>
    <DisplayName>Contoso App</DisplayName>
    <PublisherDisplayName>Contoso</PublisherDisplayName>
    <Description>An app.</Description>
  </Properties>
  <Dependencies>
    <TargetDeviceFamily Name="Windows.Desktop" MinVersion="10.0.17763.0" />
  </Dependencies>
</Package>"#;
        let info = parse_package_xml(xml).unwrap();
        assert_eq!(info.name, "Contoso.App");
        assert_eq!(info.architecture, Architecture::X64);
        assert_eq!(info.display_name.as_deref(), Some("Contoso App"));
        assert!(info.platform.contains(&Platform::WindowsDesktop));
        assert_eq!(info.minimum_os_version.as_deref(), Some("10.0.17763.0"));
    }

    #[test]
    fn version_ge_compares_numerically() {
        assert!(version_ge("10.0.17763.0", "10.0.10240.0"));
        assert!(!version_ge("10.0.10240.0", "10.0.17763.0"));
    }
}
