//! Heading-bounded section segmentation.
//!
//! Boundaries are flat: any heading, whatever its level, closes the section
//! opened by the previous one.

use kbharvest_shared::{ExtractOptions, Section};

use crate::node::{ContentNode, NodeKind};
use crate::relevance::{KeywordSet, admits};

/// Headings shorter than this (after normalization) never start a section.
pub const MIN_TITLE_CHARS: usize = 3;

/// Build one section per qualifying heading, in heading document order.
///
/// With a keyword set, both the title and each content string must match.
pub fn segment_sections<N: ContentNode>(
    root: &N,
    keywords: Option<&KeywordSet>,
    opts: &ExtractOptions,
) -> Vec<Section> {
    let mut sections = Vec::new();

    for heading in root.descendants().into_iter().filter(|n| n.is_heading()) {
        let title = heading.text_content();
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }
        if keywords.is_some_and(|k| !k.matches(&title)) {
            continue;
        }

        let content = trailing_content(&heading, keywords, opts.min_content_chars);
        if let Some(section) = Section::new(title, content) {
            sections.push(section);
        }
    }

    sections
}

/// Collect admitted text from the siblings after `heading`, up to the next heading.
fn trailing_content<N: ContentNode>(
    heading: &N,
    keywords: Option<&KeywordSet>,
    min_chars: usize,
) -> Vec<String> {
    let mut content = Vec::new();
    let mut cursor = heading.next_sibling_node();

    while let Some(sibling) = cursor {
        match sibling.kind() {
            NodeKind::Heading(_) => break,
            NodeKind::Paragraph | NodeKind::List | NodeKind::Other => {
                let text = sibling.text_content();
                if admits(&text, min_chars, keywords) {
                    content.push(text);
                }
            }
            NodeKind::ListItem | NodeKind::Link => {}
        }
        cursor = sibling.next_sibling_node();
    }

    content
}
