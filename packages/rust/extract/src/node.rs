//! Tagged-node view over a parsed document.
//!
//! Every extractor works against [`ContentNode`] only. The `scraper`
//! implementation below is the one used at runtime.

use scraper::{ElementRef, Node};

/// Elements whose text never counts as content.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Structural kind of a node, as far as extraction cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `h1`–`h6`, carrying the level.
    Heading(u8),
    Paragraph,
    /// `ul` / `ol`.
    List,
    ListItem,
    /// An anchor with a destination.
    Link,
    Other,
}

/// Regions that may hold a page's main content, in lookup priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Region {
    Main,
    Article,
    /// A `div` carrying the `content` class.
    ContentContainer,
}

/// Read-only node in a parsed document.
pub trait ContentNode: Clone {
    fn kind(&self) -> NodeKind;

    /// Which main-content region this node marks, if any.
    fn region(&self) -> Option<Region>;

    /// All descendant text, trimmed with inner whitespace collapsed.
    fn text_content(&self) -> String;

    /// Element children in document order.
    fn child_nodes(&self) -> Vec<Self>;

    /// The next element under the same parent.
    fn next_sibling_node(&self) -> Option<Self>;

    /// Link destination as written in the markup.
    fn href(&self) -> Option<String>;

    /// Every element below this one, in document (pre-)order.
    fn descendants(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut stack: Vec<Self> = self.child_nodes().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.child_nodes().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// Descendants of a single kind, in document order.
    fn descendants_of(&self, kind: NodeKind) -> Vec<Self> {
        self.descendants()
            .into_iter()
            .filter(|n| n.kind() == kind)
            .collect()
    }

    fn is_heading(&self) -> bool {
        matches!(self.kind(), NodeKind::Heading(_))
    }
}

/// Trim and collapse runs of whitespace to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// scraper implementation
// ---------------------------------------------------------------------------

impl ContentNode for ElementRef<'_> {
    fn kind(&self) -> NodeKind {
        let el = self.value();
        match el.name() {
            "h1" => NodeKind::Heading(1),
            "h2" => NodeKind::Heading(2),
            "h3" => NodeKind::Heading(3),
            "h4" => NodeKind::Heading(4),
            "h5" => NodeKind::Heading(5),
            "h6" => NodeKind::Heading(6),
            "p" => NodeKind::Paragraph,
            "ul" | "ol" => NodeKind::List,
            "li" => NodeKind::ListItem,
            "a" if el.attr("href").is_some() => NodeKind::Link,
            _ => NodeKind::Other,
        }
    }

    fn region(&self) -> Option<Region> {
        let el = self.value();
        match el.name() {
            "main" => Some(Region::Main),
            "article" => Some(Region::Article),
            "div" if el.classes().any(|c| c == "content") => Some(Region::ContentContainer),
            _ => None,
        }
    }

    fn text_content(&self) -> String {
        if SKIPPED_TAGS.contains(&self.value().name()) {
            return String::new();
        }
        let mut raw = String::new();
        collect_text(*self, &mut raw);
        normalize_whitespace(&raw)
    }

    fn child_nodes(&self) -> Vec<Self> {
        self.children().filter_map(ElementRef::wrap).collect()
    }

    fn next_sibling_node(&self) -> Option<Self> {
        self.next_siblings().find_map(ElementRef::wrap)
    }

    fn href(&self) -> Option<String> {
        self.value().attr("href").map(str::to_string)
    }
}

/// Append every text node under `el` in document order.
///
/// Walks with an explicit stack so nesting depth never touches the call stack.
fn collect_text(el: ElementRef<'_>, out: &mut String) {
    let mut stack: Vec<_> = el.children().collect();
    stack.reverse();

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(inner) if SKIPPED_TAGS.contains(&inner.name()) => {}
            Node::Element(_) => {
                let start = stack.len();
                stack.extend(node.children());
                stack[start..].reverse();
            }
            _ => {}
        }
    }
}
