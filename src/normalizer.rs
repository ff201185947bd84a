//! URL canonicalization and crawl-eligibility predicates.
//!
//! Every URL that enters the frontier or the visited set goes through
//! [`normalize`] first, so two spellings of the same page (trailing slash,
//! fragment, host case) collapse onto a single key.

use url::Url;

/// Path extensions that never yield indexable text.
pub const SKIPPED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".zip", ".doc", ".docx",
];

/// Canonicalizes `url` into the key used for crawl dedup.
///
/// The host is lowercased, the fragment dropped, scheme/path/query kept, and
/// trailing slashes stripped. A query that is empty or only slashes is
/// dropped along with its `?`. Input that does not parse as a URL falls back
/// to the same fragment and slash stripping on the raw text. The result is a
/// fixed point: `normalize(&normalize(u)) == normalize(u)`.
pub fn normalize(url: &str) -> String {
    let trimmed = url.trim();
    let Ok(mut parsed) = Url::parse(trimmed) else {
        return strip_textual(trimmed);
    };

    parsed.set_fragment(None);
    if parsed
        .query()
        .is_some_and(|query| query.trim_matches('/').is_empty())
    {
        parsed.set_query(None);
    }
    if let Some(host) = parsed.host_str() {
        let lowered = host.to_ascii_lowercase();
        if lowered != host && parsed.set_host(Some(&lowered)).is_err() {
            return strip_textual(trimmed);
        }
    }

    parsed.as_str().trim_end_matches('/').to_string()
}

fn strip_textual(raw: &str) -> String {
    let without_fragment = raw.split_once('#').map_or(raw, |(head, _)| head);
    without_fragment.trim_end_matches('/').to_string()
}

/// Returns true when both URLs point at the same site.
///
/// Hosts compare case-insensitively with one leading `www.` removed from each
/// side; explicit ports must match. URLs without a host never match.
pub fn same_domain(a: &str, b: &str) -> bool {
    match (site_key(a), site_key(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

fn site_key(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    let bare = host.strip_prefix("www.").unwrap_or(&host);
    Some(match parsed.port() {
        Some(port) => format!("{bare}:{port}"),
        None => bare.to_string(),
    })
}

/// Decides whether a discovered URL is worth rendering.
pub fn is_crawlable(url: &str) -> bool {
    let raw = url.trim();
    if raw.is_empty() {
        return false;
    }
    let Ok(parsed) = Url::parse(raw) else {
        return false;
    };
    if parsed.scheme().is_empty() || parsed.host_str().map_or(true, str::is_empty) {
        return false;
    }

    let path = parsed.path().to_ascii_lowercase();
    if SKIPPED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return false;
    }

    if parsed.fragment().is_some() && raw_path(raw).is_empty() {
        return false;
    }

    true
}

/// Path component exactly as written, before the parser fills in `/`.
fn raw_path(raw: &str) -> &str {
    let after_scheme = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let end = after_scheme
        .find(|ch| ch == '?' || ch == '#')
        .unwrap_or(after_scheme.len());
    let before_query = &after_scheme[..end];
    before_query
        .find('/')
        .map_or("", |slash| &before_query[slash..])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "https://Example.com/a/",
        "https://example.com/a#x",
        "https://WWW.Example.com/Path/To/Page/?q=1#frag",
        "http://example.com:8080//",
        "https://example.com/?",
        "https://example.com/search?q=a/",
        "https://example.com/x?/",
        "https://ex.com/a?b=/?/",
        "https://ex.com/a?//",
        "not a url at all/#frag",
        "",
        "file:///",
        "https://example.com/a b/",
    ];

    #[test]
    fn normalization_is_idempotent() {
        for sample in SAMPLES {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not a fixed point for {sample:?}");
        }
    }

    #[test]
    fn trailing_slash_and_fragment_collapse() {
        assert_eq!(normalize("https://Example.com/a/"), "https://example.com/a");
        assert_eq!(normalize("https://example.com/a#x"), "https://example.com/a");
        assert_eq!(normalize("https://example.com/"), "https://example.com");
    }

    #[test]
    fn query_survives_normalization() {
        assert_eq!(
            normalize("https://Example.com/list?page=2#top"),
            "https://example.com/list?page=2"
        );
        assert_eq!(normalize("https://example.com/x?"), "https://example.com/x");
        assert_eq!(normalize("https://example.com/x?//"), "https://example.com/x");
    }

    #[test]
    fn query_slashes_are_trimmed_not_collapsed() {
        assert_eq!(normalize("https://ex.com/a?b=/?/"), "https://ex.com/a?b=/?");
        assert_ne!(normalize("https://ex.com/a?b=/?/"), normalize("https://ex.com/a?b="));
        assert_eq!(normalize("https://ex.com/a/?q=1"), "https://ex.com/a/?q=1");
    }

    #[test]
    fn path_case_is_preserved() {
        assert_eq!(
            normalize("https://EXAMPLE.com/Docs/Intro"),
            "https://example.com/Docs/Intro"
        );
    }

    #[test]
    fn same_domain_ignores_www_and_case() {
        assert!(same_domain("https://www.foo.com/x", "https://foo.com/y"));
        assert!(same_domain("https://FOO.com", "http://www.foo.COM/z"));
        assert!(!same_domain("https://foo.com", "https://bar.com"));
        assert!(!same_domain("https://foo.com", "https://foo.com:8443"));
        assert!(!same_domain("mailto:someone@foo.com", "https://foo.com"));
    }

    #[test]
    fn crawlable_rejects_binary_and_malformed() {
        assert!(is_crawlable("https://example.com/docs/intro"));
        assert!(is_crawlable("https://example.com/docs/#section"));
        assert!(!is_crawlable(""));
        assert!(!is_crawlable("/relative/path"));
        assert!(!is_crawlable("mailto:team@example.com"));
        assert!(!is_crawlable("javascript:void(0)"));
        assert!(!is_crawlable("https://example.com/report.PDF"));
        assert!(!is_crawlable("https://example.com/photo.jpeg"));
        assert!(!is_crawlable("https://example.com/archive.zip?dl=1"));
        assert!(!is_crawlable("https://example.com#top"));
    }
}
