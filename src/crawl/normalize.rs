// src/crawl/normalize.rs
// =============================================================================
// Turns raw link text into a canonical URL we can compare and deduplicate.
//
// The same page can be linked in many spellings:
//   /docs, ./docs, https://EXAMPLE.com:443/docs#top, //example.com/docs
// All of these must collapse into one visit-state entry, otherwise the
// crawler would check the same page several times.
//
// What we do:
// - Trim surrounding whitespace (common in hand-written HTML)
// - Resolve relative and protocol-relative links against the page URL
// - Keep only http/https
// - Drop the #fragment (it never reaches the server)
//
// Host lower-casing and default-port stripping come for free: the `url`
// crate does both when it parses a special scheme like http or https.
// =============================================================================

use url::Url;

use crate::error::UnusableUrl;

/// Resolves `raw` against `base` and canonicalizes the result.
pub fn normalize(raw: &str, base: &Url) -> Result<Url, UnusableUrl> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UnusableUrl::Empty);
    }

    // join() handles absolute, relative and protocol-relative forms alike
    let mut url = base.join(raw)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UnusableUrl::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UnusableUrl::NoHost);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Key used for host-level politeness: host plus effective port.
pub fn host_key(url: &Url) -> String {
    match (url.host_str(), url.port_or_known_default()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}
