//! Centralized logic for initializing http clients, to ensure uniform
//! configuration. Grounded on the teacher's own `net` module, adapted
//! to the blocking client this engine uses and to manual redirect
//! handling (the Downloader needs to observe each hop's URL itself,
//! §4.A).

use crate::config::DownloaderConfig;
use crate::errors::CoreResult;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;

/// Settings for http clients.
///
/// Any setting that should apply to every outbound request is stored
/// here, to avoid ad-hoc client configuration scattered through the
/// crate.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    user_agent: String,
}

impl ClientSettings {
    /// Build settings from a [`DownloaderConfig`].
    pub fn new(config: &DownloaderConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Create a blocking reqwest client with redirects disabled.
///
/// Redirects are disabled deliberately: the Downloader follows them
/// one hop at a time so it can apply the redirect cap and remember the
/// final URL for filename selection (§4.A).
pub fn create_client(settings: &ClientSettings) -> CoreResult<Client> {
    let client = Client::builder()
        .user_agent(settings.user_agent.clone())
        .redirect(Policy::none())
        .build()?;
    Ok(client)
}
