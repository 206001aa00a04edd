//! The per-URL override suffix grammar (§6.1, SPEC_FULL.md §4): a
//! pipe-delimited tail on an input URL string that can force an
//! architecture, a scope, or attach a per-installer display version.

use pkgforge_schema::model::{Architecture, Scope};
use regex::Regex;
use std::sync::OnceLock;

/// One input URL plus whatever the caller forced on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlOverride {
    /// The URL with any override suffix stripped off.
    pub url: String,
    /// Forced architecture, if the suffix supplied one.
    pub architecture: Option<Architecture>,
    /// Forced scope, if the suffix supplied one.
    pub scope: Option<Scope>,
    /// Attached display version, if the suffix supplied one.
    pub display_version: Option<String>,
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+(\.\d+)*$").unwrap())
}

/// Parse one raw `<url>[|...]` input per the grammar in §6.1:
/// - `<url>` — no override.
/// - `<url>|<arch>` — architecture override.
/// - `<url>|<arch>|<scope>` — architecture and scope override.
/// - `<url>|<display-version>` — display-version override (when the
///   second segment isn't one of the five architecture wire names).
pub fn parse(raw: &str) -> UrlOverride {
    let mut parts = raw.split('|');
    let url = parts.next().unwrap_or_default().to_string();
    let second = parts.next();
    let third = parts.next();

    match second {
        None => UrlOverride {
            url,
            architecture: None,
            scope: None,
            display_version: None,
        },
        Some(second) => {
            if let Some(arch) = Architecture::from_wire(second) {
                let scope = third.and_then(Scope::from_wire);
                UrlOverride {
                    url,
                    architecture: Some(arch),
                    scope,
                    display_version: None,
                }
            } else if version_pattern().is_match(second) {
                UrlOverride {
                    url,
                    architecture: None,
                    scope: None,
                    display_version: Some(second.to_string()),
                }
            } else {
                UrlOverride {
                    url,
                    architecture: None,
                    scope: None,
                    display_version: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_url_has_no_override() {
        let o = parse("https://example.com/app.exe");
        assert_eq!(o.architecture, None);
        assert_eq!(o.scope, None);
        assert_eq!(o.display_version, None);
    }

    #[test]
    fn architecture_suffix() {
        let o = parse("https://example.com/app.exe|x64");
        assert_eq!(o.architecture, Some(Architecture::X64));
        assert_eq!(o.scope, None);
    }

    #[test]
    fn architecture_and_scope_suffix() {
        let o = parse("https://example.com/app.exe|x64|machine");
        assert_eq!(o.architecture, Some(Architecture::X64));
        assert_eq!(o.scope, Some(Scope::Machine));
    }

    #[test]
    fn display_version_suffix() {
        let o = parse("https://example.com/app.exe|2.1.0");
        assert_eq!(o.architecture, None);
        assert_eq!(o.display_version.as_deref(), Some("2.1.0"));
    }
}
