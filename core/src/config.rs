//! Plain-struct-with-defaults configuration, grounded on the teacher's
//! own `config` module: no attribute-driven validation, no persisted
//! settings file (persistence/DSC is out of scope for this engine).

use camino::Utf8PathBuf;
use std::time::Duration;

/// The redirect cap the Downloader enforces (§4.A). Fixed, but kept as
/// a named constant rather than a literal so tests can reference it.
pub const DEFAULT_REDIRECT_LIMIT: u8 = 2;

/// Configuration for [`crate::download::Downloader`] (§4.A, §2.3).
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Permit `http://` URLs. Default `false`; §4.A rejects any
    /// non-`https` scheme unless this is set.
    pub allow_unsecure: bool,
    /// Reject a download whose declared (or observed) size exceeds
    /// this many bytes. `None` means unbounded.
    pub max_download_size: Option<u64>,
    /// Directory downloaded artifacts and per-URL scratch space live
    /// under.
    pub cache_dir: Utf8PathBuf,
    /// How long a cache entry may sit unused before a sweep evicts it
    /// (§6.3).
    pub cache_eviction_interval: Duration,
    /// Maximum redirects to follow before failing with
    /// [`crate::errors::CoreError::NetworkError`].
    pub redirect_limit: u8,
    /// `User-Agent` header sent on every request.
    pub user_agent: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            allow_unsecure: false,
            max_download_size: None,
            cache_dir: Utf8PathBuf::from(".pkgforge-cache"),
            cache_eviction_interval: Duration::from_secs(60 * 60 * 24 * 7),
            redirect_limit: DEFAULT_REDIRECT_LIMIT,
            user_agent: concat!("pkgforge/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Top-level engine configuration: the pieces every stage of `update`/
/// `parse` (§5) shares.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Settings for outbound downloads.
    pub downloader: DownloaderConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            downloader: DownloaderConfig::default(),
        }
    }
}
