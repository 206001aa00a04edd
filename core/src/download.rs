//! The Downloader (§4.A): fetches one URL to a local path in the
//! configured cache directory, enforcing the redirect cap, scheme
//! policy and size cap before any bytes are written out.

use crate::config::DownloaderConfig;
use crate::errors::{CoreError, CoreResult};
use crate::net::{create_client, ClientSettings};
use camino::{Utf8Path, Utf8PathBuf};
use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, LOCATION};
use reqwest::StatusCode;
use std::fs::File;
use std::io::{self, Write};
use tracing::{debug, warn};

/// Downloads one URL, observing the scheme/redirect/size policy of
/// §4.A, and returns the path it was saved to inside `config.cache_dir`.
pub struct Downloader {
    client: Client,
    config: DownloaderConfig,
}

impl Downloader {
    /// Build a downloader from the given configuration.
    pub fn new(config: DownloaderConfig) -> CoreResult<Self> {
        let client = create_client(&ClientSettings::new(&config))?;
        std::fs::create_dir_all(&config.cache_dir)?;
        Ok(Self { client, config })
    }

    /// Fetch `url`, honoring an optional per-call size cap that
    /// overrides `config.max_download_size` when smaller.
    pub fn download(&self, url: &str, max_size: Option<u64>) -> CoreResult<Utf8PathBuf> {
        let cap = match (self.config.max_download_size, max_size) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };

        let mut current = url.to_string();
        let mut hops = 0u8;
        let response = loop {
            check_scheme(&current, self.config.allow_unsecure)?;
            debug!(url = %current, hop = hops, "fetching");
            let resp = self
                .client
                .get(&current)
                .send()
                .map_err(|_| CoreError::NetworkError {
                    status: 0,
                    url: current.clone(),
                })?;

            if resp.status().is_redirection() {
                if hops >= self.config.redirect_limit {
                    warn!(url = %current, "redirect cap exceeded");
                    return Err(CoreError::NetworkError {
                        status: resp.status().as_u16(),
                        url: current,
                    });
                }
                let location = resp
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| CoreError::NetworkError {
                        status: resp.status().as_u16(),
                        url: current.clone(),
                    })?;
                current = resolve_redirect(&current, location);
                hops += 1;
                continue;
            }

            if !resp.status().is_success() {
                return Err(CoreError::NetworkError {
                    status: resp.status().as_u16(),
                    url: current,
                });
            }

            break resp;
        };

        if let Some(cap) = cap {
            if let Some(len) = content_length(&response) {
                if len > cap {
                    return Err(CoreError::DownloadTooLarge {
                        max_size: cap,
                        url: current,
                    });
                }
            }
        }

        let file_name = choose_file_name(&response, url, &current);
        let dest = unique_destination(&self.config.cache_dir, &file_name)?;
        stream_to_file(response, &dest, cap, &current)?;
        Ok(dest)
    }
}

fn check_scheme(url: &str, allow_unsecure: bool) -> CoreResult<()> {
    let parsed = url::Url::parse(url)?;
    match parsed.scheme() {
        "https" => Ok(()),
        "http" if allow_unsecure => Ok(()),
        other => Err(CoreError::UnsupportedScheme {
            scheme: other.to_string(),
            url: url.to_string(),
        }),
    }
}

fn resolve_redirect(current: &str, location: &str) -> String {
    match url::Url::parse(current).and_then(|base| base.join(location)) {
        Ok(joined) => joined.into(),
        Err(_) => location.to_string(),
    }
}

fn content_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Filename selection priority chain (§4.A): content-disposition,
/// then the original URL's path tail, then the final redirected URL's
/// path tail, then a freshly minted name.
fn choose_file_name(response: &Response, original_url: &str, final_url: &str) -> String {
    if let Some(name) = content_disposition_filename(response) {
        return name;
    }
    if let Some(name) = path_tail(original_url) {
        return name;
    }
    if let Some(name) = path_tail(final_url) {
        return name;
    }
    format!("download-{}", uuid::Uuid::new_v4())
}

fn content_disposition_filename(response: &Response) -> Option<String> {
    let header = response.headers().get(CONTENT_DISPOSITION)?.to_str().ok()?;
    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("filename=") {
            return Some(value.trim_matches('"').to_string());
        }
    }
    None
}

fn path_tail(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let tail = parsed.path_segments()?.next_back()?;
    if tail.is_empty() {
        None
    } else {
        Some(tail.to_string())
    }
}

/// If `name` already exists in `dir`, append ` (N)` before the
/// extension, where N is the count of existing matches sharing the
/// stem. No hash-based deduplication (§4.A: "does NOT consult content
/// hashes").
fn unique_destination(dir: &Utf8Path, name: &str) -> CoreResult<Utf8PathBuf> {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return Ok(candidate);
    }

    let (stem, ext) = split_stem_ext(name);
    let mut count = 0usize;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(existing) = entry.file_name().to_str() {
            if file_name_matches_stem(existing, &stem) {
                count += 1;
            }
        }
    }
    let numbered = match &ext {
        Some(ext) => format!("{stem} ({count}).{ext}"),
        None => format!("{stem} ({count})"),
    };
    Ok(dir.join(numbered))
}

fn split_stem_ext(name: &str) -> (String, Option<String>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), Some(ext.to_string())),
        _ => (name.to_string(), None),
    }
}

fn file_name_matches_stem(existing: &str, stem: &str) -> bool {
    existing == stem || existing.starts_with(&format!("{stem} (")) || existing.starts_with(&format!("{stem}."))
}

/// Stream the response body to `dest`, enforcing `cap` against the
/// running byte count (guards against a missing or lying
/// content-length) and removing the partial file on any failure so no
/// truncated artifact is left behind (§5 "no partial files on disk
/// after failure or cancellation").
fn stream_to_file(mut response: Response, dest: &Utf8Path, cap: Option<u64>, url: &str) -> CoreResult<()> {
    let mut file = File::create(dest)?;
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = match io::Read::read(&mut response, &mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                drop(file);
                let _ = std::fs::remove_file(dest);
                return Err(e.into());
            }
        };
        total += n as u64;
        if let Some(cap) = cap {
            if total > cap {
                drop(file);
                let _ = std::fs::remove_file(dest);
                return Err(CoreError::DownloadTooLarge {
                    max_size: cap,
                    url: url.to_string(),
                });
            }
        }
        if let Err(e) = file.write_all(&buf[..n]) {
            drop(file);
            let _ = std::fs::remove_file(dest);
            return Err(e.into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_http_without_allow_unsecure() {
        assert!(check_scheme("http://example.com/a.exe", false).is_err());
        assert!(check_scheme("http://example.com/a.exe", true).is_ok());
        assert!(check_scheme("https://example.com/a.exe", false).is_ok());
    }

    #[test]
    fn path_tail_strips_query() {
        assert_eq!(
            path_tail("https://example.com/dir/app.exe?token=abc"),
            Some("app.exe".to_string())
        );
    }

    #[test]
    fn stem_ext_split() {
        assert_eq!(split_stem_ext("app.exe"), ("app".to_string(), Some("exe".to_string())));
        assert_eq!(split_stem_ext("README"), ("README".to_string(), None));
    }
}
