//! Main-content root selection.

use crate::node::{ContentNode, Region};

/// Pick the subtree treated as main content.
///
/// The first `<main>` wins, then the first `<article>`, then the first
/// `div.content`. Without any of those the document root itself is used.
pub fn locate_content<N: ContentNode>(root: &N) -> N {
    let mut best: Option<(Region, N)> = None;

    for node in root.descendants() {
        let Some(region) = node.region() else {
            continue;
        };
        if region == Region::Main {
            return node;
        }
        if best.as_ref().is_none_or(|(r, _)| region < *r) {
            best = Some((region, node));
        }
    }

    best.map(|(_, node)| node).unwrap_or_else(|| root.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use scraper::Html;

    fn heading_texts<N: ContentNode>(node: &N) -> Vec<String> {
        node.descendants()
            .into_iter()
            .filter(|n| matches!(n.kind(), NodeKind::Heading(_)))
            .map(|n| n.text_content())
            .collect()
    }

    #[test]
    fn prefers_main_over_earlier_article() {
        let doc = Html::parse_document(
            "<body><article><h2>Teaser</h2></article><main><h2>Body</h2></main></body>",
        );
        let root = locate_content(&doc.root_element());
        assert_eq!(heading_texts(&root), vec!["Body"]);
    }

    #[test]
    fn article_beats_content_div() {
        let doc = Html::parse_document(
            r#"<body><div class="content"><h2>Div</h2></div><article><h2>Art</h2></article></body>"#,
        );
        let root = locate_content(&doc.root_element());
        assert_eq!(heading_texts(&root), vec!["Art"]);
    }

    #[test]
    fn content_div_used_when_alone() {
        let doc = Html::parse_document(
            r#"<body><nav><h2>Menu</h2></nav><div class="content"><h2>Div</h2></div></body>"#,
        );
        let root = locate_content(&doc.root_element());
        assert_eq!(heading_texts(&root), vec!["Div"]);
    }

    #[test]
    fn falls_back_to_document_root() {
        let doc = Html::parse_document("<body><h2>One</h2><div><h2>Two</h2></div></body>");
        let root = locate_content(&doc.root_element());
        assert_eq!(heading_texts(&root), vec!["One", "Two"]);
    }
}
