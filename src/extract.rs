//! Anchor extraction and URL normalization
//!
//! Candidate hrefs are taken from `<a>` elements and filtered through a
//! validity pattern before normalization: rooted relative paths, or
//! absolute http/ftp(s) URLs with a domain name, `localhost`, an IPv4 or
//! a bracketed IPv6 host, and an optional port.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

static HREF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(^(/\w+)+)|^(?:http|ftp)s?://(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+(?:[A-Z]{2,6}\.?|[A-Z0-9-]{2,}\.?)|localhost|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}|\[?[A-F0-9]*:[A-F0-9:]+\]?)(?::\d+)?(?:/?|[/?]\S+)$",
    )
    .expect("href pattern compiles")
});

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("anchor selector parses"));

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("invalid url: {0}")]
    Parse(#[from] url::ParseError),
    #[error("relative url with no base")]
    MissingBase,
}

/// Collect every anchor href that looks like a crawlable URL.
///
/// The returned hrefs may still be relative; run them through
/// [`normalize_url`] against the page they came from.
#[must_use]
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| HREF_PATTERN.is_match(href))
        .map(str::to_owned)
        .collect()
}

/// True when `url` cannot stand on its own and needs a base to resolve.
#[must_use]
pub fn is_relative(url: &str) -> bool {
    matches!(Url::parse(url), Err(url::ParseError::RelativeUrlWithoutBase))
}

/// Canonicalize an href, joining relative ones against the page URL.
pub fn normalize_url(href: &str, base: Option<&str>) -> Result<String, NormalizeError> {
    match Url::parse(href) {
        Ok(url) => Ok(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = base.ok_or(NormalizeError::MissingBase)?;
            let joined = Url::parse(base)?.join(href)?;
            debug!("normalized {href} against {base}");
            Ok(joined.to_string())
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_urls_pass_through() {
        assert_eq!(
            normalize_url("http://example.com/docs", None).unwrap(),
            "http://example.com/docs"
        );
    }

    #[test]
    fn relative_urls_join_against_base() {
        assert_eq!(
            normalize_url("/asdf/", Some("http://example.com")).unwrap(),
            "http://example.com/asdf/"
        );
        assert_eq!(
            normalize_url("child", Some("http://example.com/dir/page")).unwrap(),
            "http://example.com/dir/child"
        );
    }

    #[test]
    fn relative_without_base_errors() {
        assert!(matches!(
            normalize_url("/asdf/", None),
            Err(NormalizeError::MissingBase)
        ));
    }

    #[test]
    fn is_relative_detects_rooted_paths() {
        assert!(is_relative("/asdf/"));
        assert!(!is_relative("http://example.com"));
    }

    #[test]
    fn extracts_valid_hrefs_only() {
        let html = r#"
            <html><body>
              <a href="http://example.com/a">a</a>
              <a href="/local/page">local</a>
              <a href="mailto:someone@example.com">mail</a>
              <a href="javascript:void(0)">js</a>
              <a>no href</a>
              <a href="https://localhost:8080/x?q=1">port</a>
            </body></html>
        "#;
        let links = extract_links(html);
        assert_eq!(
            links,
            vec![
                "http://example.com/a".to_string(),
                "/local/page".to_string(),
                "https://localhost:8080/x?q=1".to_string(),
            ]
        );
    }
}
