//! Network-free inspection of a fetched document
//!
//! Everything derived here is a pure function of the page URL and its HTML:
//! the parsed tree never leaves this module, so callers can hold the result
//! across `.await` points.

use crate::analyzer::links::{discover_link, DiscoveredLink, LinkScope};
use crate::analyzer::version::detect_html_version;
use crate::analyzer::{HeadingCounts, HtmlVersion, PageMetrics, UnreachableLink};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Everything the analyzer knows about a page before probing its links
#[derive(Debug, Clone, PartialEq)]
pub struct PageInspection {
    pub html_version: HtmlVersion,
    pub title: String,
    pub headings: HeadingCounts,
    /// Resolved anchors in document order
    pub links: Vec<DiscoveredLink>,
    pub has_login_form: bool,
}

impl PageInspection {
    pub fn internal_links(&self) -> u32 {
        self.count_scope(LinkScope::Internal)
    }

    pub fn external_links(&self) -> u32 {
        self.count_scope(LinkScope::External)
    }

    fn count_scope(&self, scope: LinkScope) -> u32 {
        self.links.iter().filter(|link| link.scope == scope).count() as u32
    }

    /// Combines the inspection with the probe results into final metrics
    pub fn into_metrics(self, unreachable_links: Vec<UnreachableLink>) -> PageMetrics {
        PageMetrics {
            internal_links: self.internal_links(),
            external_links: self.external_links(),
            title: self.title,
            html_version: self.html_version,
            headings: self.headings,
            unreachable_links,
            has_login_form: self.has_login_form,
        }
    }
}

/// Parses `html` and derives every metric that needs no network access
///
/// # Example
///
/// ```
/// use url::Url;
/// use webpage_analyzer::analyzer::{inspect_document, HtmlVersion};
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let html = "<!DOCTYPE html><title> Home </title><h1>Hi</h1><a href='/a'>a</a>";
/// let page = inspect_document(&base, html);
/// assert_eq!(page.title, "Home");
/// assert_eq!(page.html_version, HtmlVersion::Html5);
/// assert_eq!(page.headings.get(1), 1);
/// assert_eq!(page.internal_links(), 1);
/// ```
pub fn inspect_document(base_url: &Url, html: &str) -> PageInspection {
    let document = Html::parse_document(html);

    PageInspection {
        html_version: detect_html_version(&document),
        title: extract_title(&document),
        headings: count_headings(&document),
        links: collect_links(&document, base_url),
        has_login_form: has_login_form(&document),
    }
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Trimmed text of the first `<title>`, empty when absent
fn extract_title(document: &Html) -> String {
    select_all(document, "title")
        .first()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn count_headings(document: &Html) -> HeadingCounts {
    let mut counts = [0u32; 6];
    for (index, count) in counts.iter_mut().enumerate() {
        *count = select_all(document, &format!("h{}", index + 1)).len() as u32;
    }
    HeadingCounts::from_counts(counts)
}

fn collect_links(document: &Html, base_url: &Url) -> Vec<DiscoveredLink> {
    select_all(document, "a[href]")
        .into_iter()
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| discover_link(base_url, href))
        .collect()
}

/// True once any `<form>` holds an `<input type="password">`
fn has_login_form(document: &Html) -> bool {
    let Ok(inputs) = Selector::parse("input") else {
        return false;
    };

    select_all(document, "form").into_iter().any(|form| {
        form.select(&inputs).any(|input| {
            input
                .value()
                .attr("type")
                .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("password"))
        })
    })
}
