//! The Architecture Heuristic (§4.B): guesses an [`Architecture`] from
//! a URL string alone, for use before any installer has been
//! downloaded or as a tiebreaker against the Matcher's URL-precedence
//! rule (§4.H).

use pkgforge_schema::model::Architecture;
use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    arm64: Regex,
    arm: Regex,
    x64: Regex,
    x86: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        arm64: Regex::new(r"(?i)arm64|aarch64|aarch64ec").unwrap(),
        arm: Regex::new(r"(?i)\barm\b|armv[567]|\baarch\b").unwrap(),
        x64: Regex::new(r"(?i)x64|winx?64|_64|64-?bit|ia64|amd64|x86-64|x86_64").unwrap(),
        x86: Regex::new(r"(?i)x86|win32|winx86|_86|32-?bit|ia32|i[3-6]86|\b[3-6]86\b").unwrap(),
    })
}

/// Guess the architecture implied by `url`'s text. Returns `None` when
/// zero or more than one architecture family matched (§4.B step 5).
pub fn guess_architecture(url: &str) -> Option<Architecture> {
    let p = patterns();
    let mut found = Vec::with_capacity(1);

    if p.arm64.is_match(url) {
        found.push(Architecture::Arm64);
    } else if p.arm.is_match(url) {
        found.push(Architecture::Arm);
    }

    if p.x64.is_match(url) {
        found.push(Architecture::X64);
    }
    if p.x86.is_match(url) {
        found.push(Architecture::X86);
    }

    match found.len() {
        1 => found.into_iter().next(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm64_variants() {
        assert_eq!(guess_architecture("app-arm64.exe"), Some(Architecture::Arm64));
        assert_eq!(guess_architecture("app-aarch64.msi"), Some(Architecture::Arm64));
        assert_eq!(guess_architecture("app-aarch64ec.exe"), Some(Architecture::Arm64));
    }

    #[test]
    fn arm_variants() {
        assert_eq!(guess_architecture("app-arm.exe"), Some(Architecture::Arm));
        assert_eq!(guess_architecture("app-armv7.exe"), Some(Architecture::Arm));
    }

    #[test]
    fn x64_variants() {
        assert_eq!(guess_architecture("app-x64.exe"), Some(Architecture::X64));
        assert_eq!(guess_architecture("app-amd64.exe"), Some(Architecture::X64));
        assert_eq!(guess_architecture("app_64.exe"), Some(Architecture::X64));
    }

    #[test]
    fn x86_variants() {
        assert_eq!(guess_architecture("app-x86.exe"), Some(Architecture::X86));
        assert_eq!(guess_architecture("app-win32.exe"), Some(Architecture::X86));
        assert_eq!(guess_architecture("app-i686.exe"), Some(Architecture::X86));
    }

    #[test]
    fn ambiguous_returns_none() {
        assert_eq!(guess_architecture("app-x86-x64-universal.exe"), None);
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(guess_architecture("app-installer.exe"), None);
    }
}
