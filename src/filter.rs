use regex::Regex;
use url::Url;

/// Markers that take a link out of scope regardless of the active pattern.
const REJECTED_MARKERS: [&str; 3] = ["#", "mailto:", "tel:"];

/// Decides which absolute URLs belong to the crawl.
///
/// Two modes are kept apart on purpose: without an explicit pattern a link is
/// in scope when it starts with the seed URL, with a pattern it must match the
/// regular expression anywhere in the absolute URL.
#[derive(Debug, Clone)]
pub enum UrlScope {
    /// The absolute URL must start with this prefix
    Prefix(String),
    /// The absolute URL must match this regex
    Pattern(Regex),
}

impl UrlScope {
    /// Build the scope for a crawl from the seed URL and an optional pattern
    pub fn new(seed: &str, pattern: Option<&str>) -> Result<Self, regex::Error> {
        match pattern {
            Some(p) => Ok(Self::Pattern(Regex::new(p)?)),
            None => Ok(Self::Prefix(seed.to_string())),
        }
    }

    /// Whether the absolute URL satisfies the pattern predicate
    pub fn matches(&self, absolute: &str) -> bool {
        match self {
            Self::Prefix(prefix) => absolute.starts_with(prefix.as_str()),
            Self::Pattern(regex) => regex.is_match(absolute),
        }
    }

    /// Resolve `href` against the page location and return it if it is an
    /// in-scope link.
    ///
    /// Links carrying a fragment, `mailto:` or `tel:` are dropped before the
    /// pattern is consulted. Unparseable hrefs are dropped as well.
    pub fn accept(&self, base: &Url, href: &str) -> Option<String> {
        let resolved = base.join(href.trim()).ok()?;
        let absolute = resolved.as_str();

        if REJECTED_MARKERS.iter().any(|m| absolute.contains(m)) {
            ::log::trace!("Rejected marker link: {}", absolute);
            return None;
        }
        if !self.matches(absolute) {
            ::log::trace!("Out of scope: {}", absolute);
            return None;
        }
        Some(resolved.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://site.test/docs/").unwrap()
    }

    #[test]
    fn test_prefix_scope() {
        let scope = UrlScope::new("https://site.test/docs", None).unwrap();

        assert_eq!(
            scope.accept(&base(), "intro"),
            Some("https://site.test/docs/intro".to_string())
        );
        assert_eq!(
            scope.accept(&base(), "https://site.test/docs/api"),
            Some("https://site.test/docs/api".to_string())
        );
        assert_eq!(scope.accept(&base(), "/blog/post"), None);
        assert_eq!(scope.accept(&base(), "https://other.test/docs/x"), None);
    }

    #[test]
    fn test_pattern_scope() {
        let scope = UrlScope::new("https://site.test/", Some(r"/(guide|api)/")).unwrap();

        assert!(scope.accept(&base(), "/guide/start").is_some());
        assert!(scope.accept(&base(), "https://mirror.test/api/v1").is_some());
        assert!(scope.accept(&base(), "/blog/post").is_none());
    }

    #[test]
    fn test_markers_rejected_regardless_of_pattern() {
        let scope = UrlScope::new("https://site.test/", Some(".*")).unwrap();

        assert_eq!(scope.accept(&base(), "#section"), None);
        assert_eq!(scope.accept(&base(), "intro#part-2"), None);
        assert_eq!(scope.accept(&base(), "mailto:x@y.com"), None);
        assert_eq!(scope.accept(&base(), "tel:+15551234"), None);
        assert!(scope.accept(&base(), "intro").is_some());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(UrlScope::new("https://site.test/", Some("(unclosed")).is_err());
    }
}
