//! PE Inspector (§4.C): reads the DOS/PE headers directly at their
//! fixed offsets rather than through a structured parser, matching the
//! spec's own description of the algorithm; `goblin` is reserved for
//! locating the `.rsrc` section for installer-family sniffing, where a
//! raw offset walk would be unreasonable.

use super::InspectOutcome;
use goblin::pe::PE;
use pkgforge_schema::model::{Architecture, InstallerType};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// What the PE Inspector learned about one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeInfo {
    /// CPU target read from the COFF header's machine field.
    pub architecture: Architecture,
    /// Installer family, narrowed by `.rsrc` description sniffing.
    pub installer_type: InstallerType,
}

const MZ_SIGNATURE: u16 = 0x5A4D;
const PE_SIGNATURE: u32 = 0x0000_4550;

fn read_u16_le(buf: &[u8], offset: usize) -> Option<u16> {
    buf.get(offset..offset + 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    buf.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn machine_to_architecture(machine: u16) -> Architecture {
    match machine {
        0x014C => Architecture::X86,
        0x8664 => Architecture::X64,
        0x01C0 | 0x01C4 => Architecture::Arm,
        0xAA64 => Architecture::Arm64,
        _ => Architecture::Neutral,
    }
}

/// Inspect `buf` as a PE image. `force_portable` is the caller's
/// pre-declaration (§4.F: a nested file named as the ZIP's chosen
/// portable entry) that should resolve the `exe` family token to
/// `portable` instead.
pub fn inspect(buf: &[u8], force_portable: bool) -> InspectOutcome<PeInfo> {
    let Some(mz) = read_u16_le(buf, 0) else {
        return InspectOutcome::NotThisFormat;
    };
    if mz != MZ_SIGNATURE {
        return InspectOutcome::NotThisFormat;
    }

    let Some(pe_header_offset) = read_u32_le(buf, 60) else {
        return InspectOutcome::NotThisFormat;
    };
    let pe_header_offset = pe_header_offset as usize;

    let Some(pe_sig) = read_u32_le(buf, pe_header_offset) else {
        return InspectOutcome::NotThisFormat;
    };
    if pe_sig != PE_SIGNATURE {
        return InspectOutcome::NotThisFormat;
    }

    let Some(machine) = read_u16_le(buf, pe_header_offset + 4) else {
        return InspectOutcome::ParseFailure("truncated PE header".to_string());
    };
    let architecture = machine_to_architecture(machine);
    let installer_type = installer_family(buf, force_portable);

    InspectOutcome::Matched(PeInfo {
        architecture,
        installer_type,
    })
}

fn description_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)<description[^>]*>\s*([^<]*)</description>").unwrap())
}

/// Best-effort installer-family detection (§4.C sub-step): locate the
/// `.rsrc` section via the section table and look for the first
/// `description` element's text within it.
fn installer_family(buf: &[u8], force_portable: bool) -> InstallerType {
    let fallback = || {
        if force_portable {
            InstallerType::Portable
        } else {
            InstallerType::Exe
        }
    };

    let Ok(pe) = PE::parse(buf) else {
        debug!("goblin could not parse section table; treating resource section as absent");
        return fallback();
    };

    let Some(rsrc) = pe.sections.iter().find(|s| s.name().ok().map(|n| n == ".rsrc").unwrap_or(false)) else {
        return fallback();
    };

    let start = rsrc.pointer_to_raw_data as usize;
    let len = rsrc.size_of_raw_data as usize;
    let Some(section_bytes) = buf.get(start..start.saturating_add(len)) else {
        return fallback();
    };

    let text = String::from_utf8_lossy(section_bytes);
    let Some(captures) = description_pattern().captures(&text) else {
        return fallback();
    };
    let token = captures
        .get(1)
        .map(|m| m.as_str())
        .unwrap_or_default()
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match token.as_str() {
        "wix" => InstallerType::Burn,
        "inno" => InstallerType::Inno,
        "nullsoft" => InstallerType::Nullsoft,
        _ => fallback(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_pe(machine: u16) -> Vec<u8> {
        let mut buf = vec![0u8; 64];
        buf[0..2].copy_from_slice(&MZ_SIGNATURE.to_le_bytes());
        buf[60..64].copy_from_slice(&64u32.to_le_bytes());
        buf.extend_from_slice(&PE_SIGNATURE.to_le_bytes());
        buf.extend_from_slice(&machine.to_le_bytes());
        buf
    }

    #[test]
    fn rejects_non_pe() {
        let buf = vec![0u8; 128];
        assert!(matches!(inspect(&buf, false), InspectOutcome::NotThisFormat));
    }

    #[test]
    fn maps_x64_machine_type() {
        let buf = minimal_pe(0x8664);
        match inspect(&buf, false) {
            InspectOutcome::Matched(info) => assert_eq!(info.architecture, Architecture::X64),
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn unknown_machine_is_neutral() {
        let buf = minimal_pe(0xFFFF);
        match inspect(&buf, false) {
            InspectOutcome::Matched(info) => assert_eq!(info.architecture, Architecture::Neutral),
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn force_portable_overrides_plain_exe_fallback() {
        let buf = minimal_pe(0x014C);
        match inspect(&buf, true) {
            InspectOutcome::Matched(info) => assert_eq!(info.installer_type, InstallerType::Portable),
            _ => panic!("expected a match"),
        }
    }
}
