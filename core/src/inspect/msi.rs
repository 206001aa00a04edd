//! MSI Inspector (§4.D): reads an MSI compound file's summary
//! information stream and `Property` table through the `msi` crate.

use super::InspectOutcome;
use crate::lcid::lcid_to_bcp47;
use pkgforge_schema::model::Architecture;
use std::io::Cursor;

/// What the MSI Inspector learned about one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsiInfo {
    /// CPU target read from the `Template` summary property.
    pub architecture: Architecture,
    /// Whether the Property table or table names mention WiX.
    pub is_wix_authored: bool,
    /// `ProductVersion` property, if present.
    pub product_version: Option<String>,
    /// `ProductName` property, if present.
    pub product_name: Option<String>,
    /// `Manufacturer` property, if present.
    pub manufacturer: Option<String>,
    /// `ProductCode` property, if present.
    pub product_code: Option<String>,
    /// `ProductLanguage` resolved to a BCP-47 tag, if the LCID is known.
    pub product_language: Option<String>,
}

/// Inspect `buf` as an MSI compound file.
pub fn inspect(buf: &[u8]) -> InspectOutcome<MsiInfo> {
    let mut package = match msi::Package::open(Cursor::new(buf)) {
        Ok(p) => p,
        Err(_) => return InspectOutcome::NotThisFormat,
    };

    let summary = package.summary_info();
    let architecture = summary
        .template()
        .map(template_to_architecture)
        .unwrap_or(Architecture::Neutral);
    let creating_app = summary.creating_application().unwrap_or_default().to_string();

    let mut properties = std::collections::HashMap::new();
    let rows = match package.select_rows(msi::Select::table("Property")) {
        Ok(rows) => rows,
        Err(e) => return InspectOutcome::ParseFailure(e.to_string()),
    };
    for row in rows {
        let name = row[0].as_str().unwrap_or_default().to_string();
        let value = row[1].as_str().unwrap_or_default().to_string();
        properties.insert(name, value);
    }

    let mentions_wix = |s: &str| {
        let lower = s.to_lowercase();
        lower.contains("wix")
    };
    let property_mentions_wix = properties
        .iter()
        .any(|(k, v)| mentions_wix(k) || mentions_wix(v));
    let table_mentions_wix = package.tables().any(|t| mentions_wix(t.name()));
    let creating_app_mentions_wix =
        mentions_wix(&creating_app) || creating_app.to_lowercase().contains("windows installer xml");

    let is_wix_authored = property_mentions_wix || table_mentions_wix || creating_app_mentions_wix;

    let product_language = properties
        .get("ProductLanguage")
        .and_then(|v| v.parse::<u32>().ok())
        .and_then(lcid_to_bcp47)
        .map(str::to_string);

    InspectOutcome::Matched(MsiInfo {
        architecture,
        is_wix_authored,
        product_version: properties.get("ProductVersion").cloned(),
        product_name: properties.get("ProductName").cloned(),
        manufacturer: properties.get("Manufacturer").cloned(),
        product_code: properties.get("ProductCode").cloned(),
        product_language,
    })
}

fn template_to_architecture(template: &str) -> Architecture {
    let first = template.split(';').next().unwrap_or_default();
    match first {
        "Intel" => Architecture::X86,
        "Intel64" | "x64" => Architecture::X64,
        "Arm" => Architecture::Arm,
        "Arm64" => Architecture::Arm64,
        _ => Architecture::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_msi() {
        let buf = vec![0u8; 64];
        assert!(matches!(inspect(&buf), InspectOutcome::NotThisFormat));
    }

    #[test]
    fn template_mapping() {
        assert_eq!(template_to_architecture("Intel;1033"), Architecture::X86);
        assert_eq!(template_to_architecture("Intel64;1033"), Architecture::X64);
        assert_eq!(template_to_architecture("Arm64;1033"), Architecture::Arm64);
        assert_eq!(template_to_architecture("SomethingElse;1033"), Architecture::Neutral);
    }
}
