//! Link classification and reachability checks
//!
//! Classification is pure: every `<a href>` that resolves against the page
//! URL is internal or external. Reachability goes through a [`LinkProber`]
//! so tests can substitute fixed responses for the network.

use crate::analyzer::UnreachableLink;
use crate::fetcher::{LinkProber, ProbeOutcome};
use futures::stream::{self, StreamExt};
use url::Url;

/// Schemes that are never probed
const UNPROBED_SCHEMES: [&str; 3] = ["javascript", "mailto", "tel"];

/// Whether a link stays on the analyzed page's host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkScope {
    Internal,
    External,
}

/// An anchor whose `href` resolved against the page URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    /// The raw `href` attribute value
    pub href: String,
    /// The absolute URL after resolution
    pub url: Url,
    pub scope: LinkScope,
    /// False for `javascript:`, `mailto:`, `tel:` and same-page fragments
    pub probe: bool,
}

/// Resolves and classifies one `href`
///
/// Returns None when the value cannot be resolved; such anchors are counted
/// neither internal nor external.
pub fn discover_link(base_url: &Url, href: &str) -> Option<DiscoveredLink> {
    let url = base_url.join(href).ok()?;
    let scope = classify(base_url, &url);
    let probe = !UNPROBED_SCHEMES.contains(&url.scheme()) && !is_same_page_fragment(href);

    Some(DiscoveredLink {
        href: href.to_string(),
        url,
        scope,
        probe,
    })
}

/// Internal when the resolved host is empty or equals the page host
///
/// Scheme and port play no part: `http://example.test/` is internal on
/// `https://example.test/a`.
pub fn classify(base_url: &Url, link: &Url) -> LinkScope {
    match link.host_str() {
        None | Some("") => LinkScope::Internal,
        Some(host) if base_url.host_str() == Some(host) => LinkScope::Internal,
        Some(_) => LinkScope::External,
    }
}

/// True for references whose path is empty and whose fragment is not,
/// such as `#top`, `?tab=2#top` or `https://example.test#top`
fn is_same_page_fragment(href: &str) -> bool {
    let href = href.trim();
    let Some((before, fragment)) = href.split_once('#') else {
        return false;
    };
    if fragment.is_empty() {
        return false;
    }

    reference_path(before).is_empty()
}

/// The path component of a URI reference with its fragment already removed
fn reference_path(reference: &str) -> &str {
    let rest = match reference.split_once(':') {
        Some((scheme, rest)) if is_scheme(scheme) => rest,
        _ => reference,
    };

    let rest = match rest.strip_prefix("//") {
        Some(authority_and_path) => {
            let end = authority_and_path
                .find(['/', '?'])
                .unwrap_or(authority_and_path.len());
            &authority_and_path[end..]
        }
        None => rest,
    };

    rest.split('?').next().unwrap_or_default()
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Probes every probe-eligible link and returns the unreachable ones
///
/// Probes run `concurrency` at a time; results come back in document order,
/// so the returned list does not depend on which probe finishes first. A
/// repeated `href` is probed and reported once per occurrence.
pub async fn check_links<P>(
    prober: &P,
    links: &[DiscoveredLink],
    concurrency: usize,
) -> Vec<UnreachableLink>
where
    P: LinkProber + ?Sized,
{
    let targets: Vec<&DiscoveredLink> = links.iter().filter(|link| link.probe).collect();

    // Probe futures are lazy; `buffered` polls at most `concurrency` of them
    let probes: Vec<_> = targets
        .iter()
        .map(|&link| prober.probe(link.url.as_str()))
        .collect();
    let outcomes: Vec<ProbeOutcome> = stream::iter(probes)
        .buffered(concurrency.max(1))
        .collect()
        .await;

    targets
        .into_iter()
        .zip(outcomes)
        .filter_map(|(link, outcome)| {
            tracing::debug!("Probed {}: {:?}", link.url, outcome);
            match outcome {
                ProbeOutcome::Reachable { .. } => None,
                ProbeOutcome::Unreachable { status_code } => {
                    Some(UnreachableLink::new(link.url.as_str(), status_code))
                }
            }
        })
        .collect()
}
