use once_cell::sync::Lazy;
use regex::Regex;

static SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").unwrap());
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w-]").unwrap());
static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// Canonical dedup key for a URL: drops the fragment and trailing slashes.
///
/// `https://a.com/p#frag`, `https://a.com/p/` and `https://a.com/p` all map to
/// `https://a.com/p`.
pub fn normalize_url(url: &str) -> String {
    let without_fragment = match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    };
    // Trimming every trailing slash keeps the function idempotent.
    without_fragment.trim_end_matches('/').to_string()
}

/// Convert a URL to a filesystem-safe name
///
/// The scheme is dropped, anything that is not a word character or hyphen
/// becomes `-`, hyphen runs collapse and the result is lower-cased.
pub fn generate_slug(url: &str) -> String {
    let name = SCHEME.replace(url, "");
    let name = NON_WORD.replace_all(&name, "-");
    let name = HYPHEN_RUNS.replace_all(&name, "-");
    name.trim_matches('-').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_fragment_and_slash() {
        let expected = "https://a.com/p";
        assert_eq!(normalize_url("https://a.com/p#frag"), expected);
        assert_eq!(normalize_url("https://a.com/p/"), expected);
        assert_eq!(normalize_url("https://a.com/p"), expected);
        assert_eq!(normalize_url("https://a.com/p/#top"), expected);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "https://a.com/",
            "https://a.com//",
            "https://a.com/p?q=1#x",
            "https://a.com/#/route/",
            "",
            "#",
        ];
        for input in inputs {
            let once = normalize_url(input);
            assert_eq!(normalize_url(&once), once, "not idempotent for {input}");
        }
    }

    #[test]
    fn test_slug_from_url() {
        assert_eq!(
            generate_slug("https://Example.com/A/B.html"),
            "example-com-a-b-html"
        );
        assert_eq!(generate_slug("http://site.test/"), "site-test");
        assert_eq!(
            generate_slug("https://site.test/docs/intro?x=1&y=2"),
            "site-test-docs-intro-x-1-y-2"
        );
    }

    #[test]
    fn test_slug_keeps_hyphens_and_underscores() {
        assert_eq!(
            generate_slug("https://site.test/my-page/under_score"),
            "site-test-my-page-under_score"
        );
        assert_eq!(generate_slug("https://site.test//--a--//"), "site-test-a");
    }
}
