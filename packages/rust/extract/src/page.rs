//! Whole-page extraction: locate the content root, then run every extractor.

use kbharvest_shared::{ExtractOptions, Section};
use scraper::Html;
use tracing::debug;
use url::Url;

use crate::links::extract_links;
use crate::lists::extract_lists;
use crate::locator::locate_content;
use crate::relevance::KeywordSet;
use crate::segment::segment_sections;

/// Parse `html` and return its sections: headings first, then lists, then links.
///
/// Malformed markup is never an error; it just yields fewer sections.
pub fn extract_page(
    html: &str,
    page_url: &Url,
    keywords: Option<&KeywordSet>,
    opts: &ExtractOptions,
) -> Vec<Section> {
    let doc = Html::parse_document(html);
    let root = locate_content(&doc.root_element());

    let mut sections = segment_sections(&root, keywords, opts);
    let from_headings = sections.len();

    sections.extend(extract_lists(&root, keywords, opts));
    let from_lists = sections.len() - from_headings;

    let links = extract_links(&root, page_url, keywords, opts);
    let has_links = links.is_some();
    sections.extend(links);

    debug!(
        url = %page_url,
        root = root.value().name(),
        from_headings,
        from_lists,
        has_links,
        "page extracted"
    );

    sections
}
