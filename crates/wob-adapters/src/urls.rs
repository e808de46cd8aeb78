//! Canonical and archive URL resolution.

use chrono::NaiveDateTime;
use tracing::debug;
use url::Url;
use wob_core::SourceUrls;

use crate::dates::archive_timestamp;
use crate::NormalizeError;

/// Base used for root-relative links on the municipal site.
pub const SITE_BASE_URL: &str = "https://www.utrecht.nl";

/// Host fragment identifying the web-archive mirror.
pub const ARCHIVE_MARKER: &str = "archiefweb.eu";

pub const ARCHIVE_MIRROR_BASE: &str = "https://archief12.archiefweb.eu/archives/archiefweb";

/// `og:url` first, then the `url` query parameter of the read-aloud player link.
pub fn resolve_canonical_url(
    og_url: Option<&str>,
    player_href: Option<&str>,
) -> Result<String, NormalizeError> {
    if let Some(url) = og_url.map(str::trim).filter(|u| !u.is_empty()) {
        debug!(url, "canonical url from og:url");
        return Ok(url.to_string());
    }
    if let Some(url) = player_href.and_then(player_url_parameter) {
        debug!(url = %url, "canonical url from player link");
        return Ok(url);
    }
    Err(NormalizeError::UnresolvableUrl)
}

pub fn player_url_parameter(href: &str) -> Option<String> {
    let base = Url::parse(SITE_BASE_URL).ok()?;
    let parsed = base.join(href.trim()).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Makes a link absolute against the site base. Only root-relative links are rewritten.
pub fn absolutize(href: &str) -> String {
    let href = href.trim();
    if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("{SITE_BASE_URL}{href}")
    } else {
        href.to_string()
    }
}

/// Mirror prefix carried by a stylesheet served from the archive, e.g.
/// `https://archief12.archiefweb.eu/archives/archiefweb/20160101120000/`
/// out of `.../20160101120000/https://www.utrecht.nl/style.css`.
pub fn archive_prefix(stylesheet_href: &str) -> Option<String> {
    let (_, after) = stylesheet_href.split_once("http")?;
    let segment = after.split("http").next().unwrap_or(after);
    segment
        .contains(ARCHIVE_MARKER)
        .then(|| format!("http{segment}"))
}

pub fn is_archived(url: &str) -> bool {
    url.contains(ARCHIVE_MARKER)
}

pub fn mirror_url(url: &str, stamp: NaiveDateTime) -> String {
    format!("{ARCHIVE_MIRROR_BASE}/{}/{url}", archive_timestamp(stamp))
}

/// URLs for a rendered page. A page served from the archive keeps the
/// archive address for both fields.
pub fn resolve_page_urls(
    canonical: &str,
    last_stylesheet: Option<&str>,
    stamp: NaiveDateTime,
) -> SourceUrls {
    let url = match last_stylesheet.and_then(archive_prefix) {
        Some(prefix) => {
            debug!(prefix = %prefix, "page served from archive mirror");
            format!("{prefix}{canonical}")
        }
        None => canonical.to_string(),
    };
    resolve_listing_urls(&url, stamp)
}

pub fn resolve_listing_urls(url: &str, stamp: NaiveDateTime) -> SourceUrls {
    let archived = if is_archived(url) {
        url.to_string()
    } else {
        mirror_url(url, stamp)
    };
    SourceUrls {
        canonical: Some(url.to_string()),
        archived: Some(archived),
    }
}

/// Last non-empty path segment of a URL.
pub fn slug_from_url(url: &str) -> Option<String> {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()?
            .filter(|s| !s.is_empty())
            .last()
            .map(ToString::to_string),
        Err(_) => url
            .split('/')
            .filter(|s| !s.is_empty())
            .last()
            .map(ToString::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn og_url_wins_over_player_link() {
        let url = resolve_canonical_url(
            Some("https://www.utrecht.nl/wob/a/"),
            Some("/player?url=https://www.utrecht.nl/wob/b/"),
        )
        .unwrap();
        assert_eq!(url, "https://www.utrecht.nl/wob/a/");
    }

    #[test]
    fn falls_back_to_player_url_parameter() {
        let href = "https://app.readspeaker.com/cgi-bin/rsent?customerid=1&lang=nl_nl&url=https%3A%2F%2Fwww.utrecht.nl%2Fwob%2Fb%2F";
        assert_eq!(
            resolve_canonical_url(Some("  "), Some(href)).unwrap(),
            "https://www.utrecht.nl/wob/b/"
        );
        assert_eq!(
            player_url_parameter("/rsent?url=https://www.utrecht.nl/x/").as_deref(),
            Some("https://www.utrecht.nl/x/")
        );
    }

    #[test]
    fn unresolvable_without_either_source() {
        assert_eq!(
            resolve_canonical_url(None, Some("/rsent?lang=nl")),
            Err(NormalizeError::UnresolvableUrl)
        );
        assert_eq!(resolve_canonical_url(None, None), Err(NormalizeError::UnresolvableUrl));
    }

    #[test]
    fn absolutize_prefixes_root_relative_links() {
        assert_eq!(absolutize("/doc.PDF"), "https://www.utrecht.nl/doc.PDF");
        assert_eq!(absolutize("https://cdn.example.nl/a.pdf"), "https://cdn.example.nl/a.pdf");
        assert_eq!(absolutize("//cdn.example.nl/a.pdf"), "https://cdn.example.nl/a.pdf");
    }

    #[test]
    fn archive_prefix_is_read_from_mirrored_stylesheet() {
        let href = "https://archief12.archiefweb.eu/archives/archiefweb/20160101120000/https://www.utrecht.nl/typo3temp/style.css";
        assert_eq!(
            archive_prefix(href).as_deref(),
            Some("https://archief12.archiefweb.eu/archives/archiefweb/20160101120000/")
        );
        assert_eq!(archive_prefix("https://www.utrecht.nl/style.css"), None);
        assert_eq!(archive_prefix("/style.css"), None);
    }

    #[test]
    fn live_page_gets_synthesized_mirror_url() {
        let urls = resolve_page_urls(
            "https://www.utrecht.nl/wob/a/",
            Some("https://www.utrecht.nl/style.css"),
            stamp(),
        );
        assert_eq!(urls.canonical.as_deref(), Some("https://www.utrecht.nl/wob/a/"));
        assert_eq!(
            urls.archived.as_deref(),
            Some("https://archief12.archiefweb.eu/archives/archiefweb/20240301100000/https://www.utrecht.nl/wob/a/")
        );
    }

    #[test]
    fn archived_page_keeps_mirror_address() {
        let urls = resolve_page_urls(
            "https://www.utrecht.nl/wob/a/",
            Some("https://archief12.archiefweb.eu/archives/archiefweb/20160101120000/https://www.utrecht.nl/style.css"),
            stamp(),
        );
        let expected = "https://archief12.archiefweb.eu/archives/archiefweb/20160101120000/https://www.utrecht.nl/wob/a/";
        assert_eq!(urls.canonical.as_deref(), Some(expected));
        assert_eq!(urls.archived.as_deref(), Some(expected));
    }

    #[test]
    fn listing_url_already_on_mirror_is_not_wrapped() {
        let url = "https://archief12.archiefweb.eu/archives/archiefweb/20150101000000/https://www.utrecht.nl/x/";
        let urls = resolve_listing_urls(url, stamp());
        assert_eq!(urls.archived.as_deref(), Some(url));
    }

    #[test]
    fn slug_is_last_non_empty_segment() {
        assert_eq!(
            slug_from_url("https://www.utrecht.nl/wob/some-slug/").as_deref(),
            Some("some-slug")
        );
        assert_eq!(
            slug_from_url("https://www.utrecht.nl/wob/some-slug").as_deref(),
            Some("some-slug")
        );
        assert_eq!(slug_from_url("wob/2024-42/").as_deref(), Some("2024-42"));
        assert_eq!(slug_from_url("https://www.utrecht.nl/"), None);
        assert_eq!(slug_from_url(""), None);
    }
}
