//! Keyword-matching link harvesting.

use kbharvest_shared::{ExtractOptions, Section};
use url::Url;

use crate::node::{ContentNode, NodeKind};
use crate::relevance::KeywordSet;

/// Gather relevant links into one `"<topic> Resources and Links"` section.
///
/// A link qualifies when its text or its raw destination matches a keyword.
/// Relative destinations are resolved against `page_url`. Without an active
/// keyword set nothing is harvested.
pub fn extract_links<N: ContentNode>(
    root: &N,
    page_url: &Url,
    keywords: Option<&KeywordSet>,
    opts: &ExtractOptions,
) -> Option<Section> {
    let keywords = keywords?;

    let entries: Vec<String> = root
        .descendants_of(NodeKind::Link)
        .iter()
        .filter_map(|link| {
            let href = link.href()?;
            let text = link.text_content();
            if !keywords.matches(&text) && !keywords.matches(&href) {
                return None;
            }
            Some(format!("{text}: {}", resolve(page_url, &href)))
        })
        .take(opts.max_links)
        .collect();

    Section::new(format!("{} Resources and Links", opts.topic), entries)
}

/// Absolute form of `href`, or the raw value when it cannot be joined.
fn resolve(base: &Url, href: &str) -> String {
    base.join(href.trim())
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
