//! Enum surface spellings.
//!
//! Per the spec's redesign hint, enum wire names live in one table per
//! enum rather than as `#[serde(rename = ...)]` metadata scattered
//! across variants. Every table is a flat match in both directions so
//! there's exactly one place to update when a wire spelling changes.

use crate::model::{
    Architecture, CompatibilityClass, InstallMode, InstallerType, ManifestType,
    NestedInstallerType, Platform, Scope, UpgradeBehavior,
};

impl Architecture {
    pub const ALL: [Self; 5] = [Self::X86, Self::X64, Self::Arm, Self::Arm64, Self::Neutral];

    pub fn wire(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X64 => "x64",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::Neutral => "neutral",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "x86" => Self::X86,
            "x64" => Self::X64,
            "arm" => Self::Arm,
            "arm64" => Self::Arm64,
            "neutral" => Self::Neutral,
            _ => return None,
        })
    }
}

impl InstallerType {
    pub fn wire(self) -> &'static str {
        match self {
            Self::Exe => "exe",
            Self::Msi => "msi",
            Self::Msix => "msix",
            Self::Appx => "appx",
            Self::Wix => "wix",
            Self::Burn => "burn",
            Self::Inno => "inno",
            Self::Nullsoft => "nullsoft",
            Self::Portable => "portable",
            Self::Zip => "zip",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "exe" => Self::Exe,
            "msi" => Self::Msi,
            "msix" => Self::Msix,
            "appx" => Self::Appx,
            "wix" => Self::Wix,
            "burn" => Self::Burn,
            "inno" => Self::Inno,
            "nullsoft" => Self::Nullsoft,
            "portable" => Self::Portable,
            "zip" => Self::Zip,
            _ => return None,
        })
    }
}

impl NestedInstallerType {
    pub fn wire(self) -> &'static str {
        InstallerType::from(self).wire()
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        InstallerType::from_wire(s).and_then(|t| t.try_into().ok())
    }
}

impl CompatibilityClass {
    pub fn wire(self) -> &'static str {
        match self {
            Self::Exe => "exe-class",
            Self::Msi => "msi-class",
            Self::Msix => "msix-class",
        }
    }
}

impl Scope {
    pub fn wire(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Machine => "machine",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "user" => Self::User,
            "machine" => Self::Machine,
            _ => return None,
        })
    }
}

impl Platform {
    pub fn wire(self) -> &'static str {
        match self {
            Self::WindowsDesktop => "Windows.Desktop",
            Self::WindowsUniversal => "Windows.Universal",
            Self::WindowsIot => "Windows.IoT",
            Self::WindowsTeam => "Windows.Team",
            Self::WindowsHolographic => "Windows.Holographic",
            Self::WindowsXbox => "Windows.Xbox",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "Windows.Desktop" => Self::WindowsDesktop,
            "Windows.Universal" => Self::WindowsUniversal,
            "Windows.IoT" => Self::WindowsIot,
            "Windows.Team" => Self::WindowsTeam,
            "Windows.Holographic" => Self::WindowsHolographic,
            "Windows.Xbox" => Self::WindowsXbox,
            _ => return None,
        })
    }

    /// Map a `TargetDeviceFamily/@Name` value (e.g. `Windows.Desktop`)
    /// to a [`Platform`] the way §4.E describes: substitute `.` with
    /// `_` and look the result up. Unmapped values are dropped.
    pub fn from_target_device_family(name: &str) -> Option<Self> {
        let normalized = name.replace('_', ".");
        Self::from_wire(&normalized)
    }
}

impl UpgradeBehavior {
    pub fn wire(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::UninstallPrevious => "uninstallPrevious",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "install" => Self::Install,
            "uninstallPrevious" => Self::UninstallPrevious,
            _ => return None,
        })
    }
}

impl InstallMode {
    pub fn wire(self) -> &'static str {
        match self {
            Self::Interactive => "interactive",
            Self::Silent => "silent",
            Self::SilentWithProgress => "silentWithProgress",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "interactive" => Self::Interactive,
            "silent" => Self::Silent,
            "silentWithProgress" => Self::SilentWithProgress,
            _ => return None,
        })
    }
}

impl ManifestType {
    pub fn wire(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Installer => "installer",
            Self::DefaultLocale => "defaultLocale",
            Self::Locale => "locale",
            Self::Singleton => "singleton",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "version" => Self::Version,
            "installer" => Self::Installer,
            "defaultLocale" => Self::DefaultLocale,
            "locale" => Self::Locale,
            "singleton" => Self::Singleton,
            _ => return None,
        })
    }
}
