// src/checker/html.rs
// =============================================================================
// This module extracts links from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever, which repairs broken markup the way browsers do
//   (unclosed tags, stray end tags) instead of failing
//
// Links come out lazily, in document order, as the raw attribute text.
// Resolving them into absolute URLs is the normalizer's job; this module
// only knows which base URL they should be resolved against.
//
// Rust concepts:
// - LazyLock: build each CSS selector once, on first use
// - impl Iterator: return a lazy sequence without collecting into a Vec
// - Lifetimes: the iterator borrows the parsed document
// =============================================================================

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

// Selector::parse only fails on invalid CSS. These are constants, so a
// failure is a programmer error and panicking on first use is fine.
static ANCHORS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href], area[href]").expect("valid anchor selector"));

static ANCHORS_AND_RESOURCES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "a[href], area[href], \
         link[rel~=\"stylesheet\"][href], link[rel~=\"icon\"][href], \
         img[src], script[src], iframe[src], source[src]",
    )
    .expect("valid resource selector")
});

static BASE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("base[href]").expect("valid base selector"));

/// A parsed HTML page, ready to hand out its links.
pub struct ParsedPage {
    document: Html,
    base: Url,
    resources: bool,
}

impl ParsedPage {
    /// Parses `html` fetched from `page_url`. With `resources` set, images,
    /// scripts, stylesheets and frames are reported alongside anchors.
    pub fn parse(html: &str, page_url: &Url, resources: bool) -> Self {
        let document = Html::parse_document(html);

        // <base href="..."> changes what relative links resolve against
        let base = document
            .select(&BASE)
            .next()
            .and_then(|element| element.value().attr("href"))
            .and_then(|href| page_url.join(href.trim()).ok())
            .unwrap_or_else(|| page_url.clone());

        Self {
            document,
            base,
            resources,
        }
    }

    /// URL that relative links on this page resolve against.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Raw link strings in document order.
    pub fn links(&self) -> impl Iterator<Item = &str> + '_ {
        let selector: &Selector = if self.resources {
            &ANCHORS_AND_RESOURCES
        } else {
            &ANCHORS
        };
        self.document.select(selector).filter_map(link_attr)
    }
}

fn link_attr(element: ElementRef<'_>) -> Option<&str> {
    let value = element.value();
    match value.name() {
        "a" | "area" | "link" => value.attr("href"),
        _ => value.attr("src"),
    }
}
