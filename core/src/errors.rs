//! Errors the engine can return. Grounded on the teacher's own
//! `errors` module: one `thiserror` enum, `#[from]` wrapping for
//! foreign errors, `miette::Diagnostic` so an embedding CLI can
//! render these directly without a translation layer.
//!
//! `NotPE` / `NotMsi` / `NotMsix` (§7) never appear here — they're
//! internal orchestrator discriminators, not part of this type.

use miette::Diagnostic;
use pkgforge_schema::errors::SchemaViolation;
use pkgforge_schema::model::{Architecture, Scope};
use thiserror::Error;

/// An alias for the common Result type of this crate.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// One new-installer record the Matcher couldn't place.
#[derive(Debug, Clone)]
pub struct UnmatchedInstaller {
    /// The new installer's URL.
    pub installer_url: String,
    /// Its resolved architecture, if any.
    pub architecture: Option<Architecture>,
}

/// One new-installer record with more than one surviving candidate.
#[derive(Debug, Clone)]
pub struct AmbiguousInstaller {
    /// The new installer's URL.
    pub installer_url: String,
    /// URLs of the existing installers it couldn't be narrowed between.
    pub candidate_existing_urls: Vec<String>,
}

/// Errors the engine can produce (§7).
#[derive(Debug, Error, Diagnostic)]
pub enum CoreError {
    /// random i/o error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A download failed after following redirects, or received a
    /// non-success status.
    #[error("request to {url} failed with status {status}")]
    NetworkError {
        /// HTTP status code, or 0 if the transport itself failed.
        status: u16,
        /// The URL that was requested (post-redirect, if applicable).
        url: String,
    },

    /// A URL used a scheme other than `https` without `allow_unsecure`.
    #[error("`{scheme}` is not an accepted scheme for {url} (set allow_unsecure to permit http)")]
    UnsupportedScheme {
        /// The rejected scheme, e.g. `http` or `ftp`.
        scheme: String,
        /// The offending URL.
        url: String,
    },

    /// The response declared a content-length larger than the caller's
    /// cap.
    #[error("{url} declared a size over the {max_size} byte cap")]
    DownloadTooLarge {
        /// The configured cap that was exceeded.
        max_size: u64,
        /// The offending URL.
        url: String,
    },

    /// Every inspector (PE, MSIX/APPX, MSI) failed to recognize one or
    /// more downloaded files. One entry per URL that failed all three.
    #[error("{} installer(s) couldn't be identified by any inspector", .0.len())]
    ParsePackageError(Vec<String>),

    /// The Matcher could not produce a total pairing (§4.H, §P4).
    #[error("{} unmatched, {} ambiguous installer(s)", .unmatched.len(), .ambiguous.len())]
    InstallerMatchError {
        /// New installers with zero surviving candidates.
        unmatched: Vec<UnmatchedInstaller>,
        /// New installers with more than one surviving candidate.
        ambiguous: Vec<AmbiguousInstaller>,
        /// Whether the caller supplied an architecture/scope override
        /// for at least one URL — used to pick a remediation hint.
        override_in_effect: bool,
    },

    /// `|new| != |existing|` going into the Matcher.
    #[error("{new_count} new installer(s) but {existing_count} existing installer(s)")]
    CountMismatch {
        new_count: usize,
        existing_count: usize,
    },

    /// An update attempted to change `package_identifier`.
    #[error("package identifier changed: expected `{expected}`, found `{actual}`")]
    IdentityChanged { expected: String, actual: String },

    /// Forwarded verbatim from an external manifest validator, or
    /// produced by `pkgforge_schema::validate`.
    #[error(transparent)]
    SchemaViolation(#[from] SchemaViolationError),

    /// random schema-crate error (parse/malformed manifest text)
    #[error(transparent)]
    Schema(#[from] pkgforge_schema::errors::SchemaError),

    /// random zip-reading error
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    /// random MSI-reading error
    #[error("failed to read MSI database: {0}")]
    Msi(String),

    /// random XML-reading error
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    /// random goblin (PE) error
    #[error(transparent)]
    Goblin(#[from] goblin::error::Error),

    /// random reqwest error
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// random URL-parse error
    #[error(transparent)]
    UrlParse(#[from] url::ParseError),
}

/// Wrapper so `SchemaViolation`'s `Vec` can implement `std::error::Error`
/// (needed for `#[from]`).
#[derive(Debug, Error, Diagnostic)]
#[error("{} schema violation(s)", .0.len())]
pub struct SchemaViolationError(
    /// The violations found.
    pub Vec<SchemaViolation>,
);

/// Narrow helper used by the Matcher's error path to describe which
/// scope, if any, disambiguated a candidate set.
pub fn describe_scope(scope: Option<Scope>) -> &'static str {
    match scope {
        Some(Scope::User) => "user",
        Some(Scope::Machine) => "machine",
        None => "unspecified",
    }
}
