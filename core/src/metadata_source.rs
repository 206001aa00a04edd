//! The external metadata-source collaborator (§6.4): a hosting-service
//! adapter the caller injects, plus the enrichment pass that applies
//! it. The core never reaches out to a network API on its own behalf
//! for this — it only consumes whatever the adapter returns.

use pkgforge_schema::model::LocaleFields;

/// One known hosting service's release-asset URL prefix, e.g. GitHub's
/// `https://github.com/<owner>/<repo>/releases/download/<tag>/`.
#[derive(Debug, Clone)]
pub struct HostingPrefix {
    /// The prefix's host component, e.g. `github.com`.
    pub host: String,
}

/// `(owner, repo, tag)` extracted from a release-asset URL that
/// matched a known hosting prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTriple {
    /// The repository owner or organization.
    pub owner: String,
    /// The repository name.
    pub repo: String,
    /// The release tag the asset URLs point at.
    pub tag: String,
}

/// Metadata a hosting-service adapter can surface for one release. Any
/// field the adapter has nothing for is `None`/empty; `tags` is
/// truncated to the first 16 by the adapter or by `apply_enrichment`
/// below, whichever runs first.
#[derive(Debug, Clone, Default)]
pub struct RepoMetadata {
    /// SPDX or free-form license identifier.
    pub license: Option<String>,
    /// One-line package summary.
    pub short_description: Option<String>,
    /// The repository's home page URL.
    pub package_url: Option<String>,
    /// The publisher's home page URL.
    pub publisher_url: Option<String>,
    /// Present only when the hosting repo has issues enabled.
    pub publisher_support_url: Option<String>,
    /// URL of the release notes for this tag.
    pub release_notes_url: Option<String>,
    /// Canonical `YYYY-MM-DD`.
    pub release_date: Option<String>,
    /// Repository topics/tags, already truncated to the adapter's view.
    pub tags: Vec<String>,
    /// Present only when the hosting repo has a wiki enabled.
    pub documentation_wiki_url: Option<String>,
}

/// Implemented by the hosting-service adapter the caller supplies.
/// The core only calls this when every installer URL of a new record
/// shares one `(owner, repo, tag)` triple under a known hosting
/// prefix (§6.4).
pub trait MetadataSource {
    /// Fetch metadata for one `(owner, repo, tag)` release.
    fn fetch_repo_metadata(&self, owner: &str, repo: &str, tag: &str) -> Option<RepoMetadata>;
}

/// Parse `url` against one hosting prefix, returning the
/// `(owner, repo, tag)` triple if it matches
/// `https://<host>/<owner>/<repo>/releases/download/<tag>/...`.
pub fn match_release_triple(url: &str, prefix: &HostingPrefix) -> Option<ReleaseTriple> {
    let parsed = url::Url::parse(url).ok()?;
    if parsed.host_str() != Some(prefix.host.as_str()) {
        return None;
    }
    let mut segments = parsed.path_segments()?;
    let owner = segments.next()?.to_string();
    let repo = segments.next()?.to_string();
    if segments.next()? != "releases" || segments.next()? != "download" {
        return None;
    }
    let tag = segments.next()?.to_string();
    Some(ReleaseTriple { owner, repo, tag })
}

/// The common `(owner, repo, tag)` triple for a set of installer
/// URLs, if every one matches the same known prefix and agrees on the
/// triple. Returns `None` as soon as one URL disagrees or doesn't
/// match any prefix, per §6.4's "every URL shares the same triple".
pub fn common_release_triple(urls: &[String], prefixes: &[HostingPrefix]) -> Option<ReleaseTriple> {
    let mut found: Option<ReleaseTriple> = None;
    for url in urls {
        let triple = prefixes.iter().find_map(|prefix| match_release_triple(url, prefix))?;
        match &found {
            None => found = Some(triple),
            Some(existing) if existing == &triple => {}
            Some(_) => return None,
        }
    }
    found
}

/// Fill in only the locale fields that are currently empty (§6.4,
/// idempotence per §8 scenario 6). Never overwrites a field the
/// manifest already has a value for.
pub fn apply_enrichment(fields: &mut LocaleFields, metadata: &RepoMetadata, release_date: &mut Option<String>) {
    if fields.license.is_empty() {
        if let Some(license) = &metadata.license {
            fields.license = license.clone();
        }
    }
    if fields.short_description.is_empty() {
        if let Some(short_description) = &metadata.short_description {
            fields.short_description = short_description.clone();
        }
    }
    fill_if_empty(&mut fields.package_url, &metadata.package_url);
    fill_if_empty(&mut fields.publisher_url, &metadata.publisher_url);
    fill_if_empty(&mut fields.publisher_support_url, &metadata.publisher_support_url);
    fill_if_empty(&mut fields.release_notes_url, &metadata.release_notes_url);
    if fields.tags.is_empty() && !metadata.tags.is_empty() {
        fields.tags = metadata.tags.iter().take(16).cloned().collect();
    }
    fill_if_empty(release_date, &metadata.release_date);
}

fn fill_if_empty(field: &mut Option<String>, value: &Option<String>) {
    if field.is_none() {
        if let Some(value) = value {
            *field = Some(value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn github() -> HostingPrefix {
        HostingPrefix { host: "github.com".to_string() }
    }

    #[test]
    fn matches_known_prefix() {
        let triple = match_release_triple(
            "https://github.com/acme/widget/releases/download/v1.2.0/widget.exe",
            &github(),
        )
        .unwrap();
        assert_eq!(triple.owner, "acme");
        assert_eq!(triple.repo, "widget");
        assert_eq!(triple.tag, "v1.2.0");
    }

    #[test]
    fn rejects_mismatched_host() {
        assert!(match_release_triple("https://example.com/acme/widget/releases/download/v1.2.0/widget.exe", &github())
            .is_none());
    }

    #[test]
    fn common_triple_requires_full_agreement() {
        let urls = vec![
            "https://github.com/acme/widget/releases/download/v1.2.0/widget-x64.exe".to_string(),
            "https://github.com/acme/widget/releases/download/v1.2.0/widget-x86.exe".to_string(),
        ];
        assert!(common_release_triple(&urls, &[github()]).is_some());

        let mismatched = vec![
            "https://github.com/acme/widget/releases/download/v1.2.0/widget.exe".to_string(),
            "https://github.com/acme/widget/releases/download/v1.3.0/widget.exe".to_string(),
        ];
        assert!(common_release_triple(&mismatched, &[github()]).is_none());
    }

    #[test]
    fn enrichment_never_overwrites_a_present_field() {
        let mut fields = LocaleFields {
            license: "MIT".to_string(),
            ..Default::default()
        };
        let mut release_date = None;
        let metadata = RepoMetadata {
            license: Some("Apache-2.0".to_string()),
            short_description: Some("A widget.".to_string()),
            ..Default::default()
        };
        apply_enrichment(&mut fields, &metadata, &mut release_date);
        assert_eq!(fields.license, "MIT");
        assert_eq!(fields.short_description, "A widget.");
    }

    #[test]
    fn enrichment_is_idempotent() {
        let mut fields = LocaleFields::default();
        let mut release_date = None;
        let metadata = RepoMetadata {
            license: Some("MIT".to_string()),
            ..Default::default()
        };
        apply_enrichment(&mut fields, &metadata, &mut release_date);
        apply_enrichment(&mut fields, &metadata, &mut release_date);
        assert_eq!(fields.license, "MIT");
    }
}
