//! Standalone list harvesting.
//!
//! Runs over every list in the content root, independently of heading
//! segmentation, so a list may show up in both outputs.

use kbharvest_shared::{ExtractOptions, Section};

use crate::node::{ContentNode, NodeKind};
use crate::relevance::{KeywordSet, admits};

/// One section per list with at least `opts.min_list_items` admitted items.
///
/// Titles are `"<topic> Information <n>"`, numbered among the emitted lists.
pub fn extract_lists<N: ContentNode>(
    root: &N,
    keywords: Option<&KeywordSet>,
    opts: &ExtractOptions,
) -> Vec<Section> {
    let mut sections = Vec::new();

    for list in root.descendants_of(NodeKind::List) {
        let items: Vec<String> = list
            .descendants_of(NodeKind::ListItem)
            .iter()
            .map(|li| li.text_content())
            .filter(|text| admits(text, opts.min_item_chars, keywords))
            .collect();

        if items.len() < opts.min_list_items {
            continue;
        }

        let title = format!("{} Information {}", opts.topic, sections.len() + 1);
        if let Some(section) = Section::new(title, items) {
            sections.push(section);
        }
    }

    sections
}
