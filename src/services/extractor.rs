// Text Extractor
// Walks a parsed DOM and emits candidate sentence fragments from
// content-bearing elements, skipping page chrome.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;
use std::sync::OnceLock;

use super::config::ExtractorConfig;

fn sentence_split_re() -> &'static Regex {
    static SPLIT_RE: OnceLock<Regex> = OnceLock::new();
    SPLIT_RE.get_or_init(|| Regex::new(r"[.!?]\s*").unwrap())
}

/// Parse an HTML string into a DOM.
pub fn html_to_dom(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        // Reading from an in-memory buffer cannot fail.
        .unwrap()
}

/// Extract candidate sentence fragments from a DOM subtree.
///
/// Re-running over a static DOM yields the same sequence in the same order.
pub fn extract_candidates(root: &Handle, config: &ExtractorConfig) -> Vec<String> {
    let mut raw_texts: Vec<String> = Vec::new();
    collect_content_text(root, config, &mut raw_texts);

    let split_re = sentence_split_re();
    let mut candidates = Vec::new();
    for raw in &raw_texts {
        for fragment in split_re.split(raw) {
            let fragment = fragment.trim();
            if !fragment.is_empty() {
                candidates.push(fragment.to_string());
            }
        }
    }
    candidates
}

/// Convenience wrapper: parse and extract in one step.
pub fn extract_from_html(html: &str, config: &ExtractorConfig) -> Vec<String> {
    let dom = html_to_dom(html);
    extract_candidates(&dom.document, config)
}

fn collect_content_text(node: &Handle, config: &ExtractorConfig, out: &mut Vec<String>) {
    for child in node.children.borrow().iter() {
        if let NodeData::Element { .. } = child.data {
            if is_excluded_element(child, config) {
                continue;
            }
            if is_content_element(child, config) && !has_content_descendant(child, config) {
                let text = text_content(child, config);
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
                continue;
            }
        }
        collect_content_text(child, config, out);
    }
}

fn node_tag(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

fn is_excluded_element(node: &Handle, config: &ExtractorConfig) -> bool {
    node_tag(node)
        .map(|tag| config.excluded_tags.iter().any(|t| t == tag))
        .unwrap_or(false)
}

fn is_content_element(node: &Handle, config: &ExtractorConfig) -> bool {
    let tag = match node_tag(node) {
        Some(tag) => tag,
        None => return false,
    };

    if config.content_tags.iter().any(|t| t == tag) {
        return true;
    }

    // Auto-direction containers (comment bodies on social feeds) qualify only
    // when explicitly marked dir="auto".
    if config.auto_dir_tags.iter().any(|t| t == tag) {
        if let NodeData::Element { attrs, .. } = &node.data {
            return attrs
                .borrow()
                .iter()
                .any(|a| &*a.name.local == "dir" && a.value.eq_ignore_ascii_case("auto"));
        }
    }

    false
}

fn has_content_descendant(node: &Handle, config: &ExtractorConfig) -> bool {
    node.children.borrow().iter().any(|child| {
        if is_excluded_element(child, config) {
            return false;
        }
        is_content_element(child, config) || has_content_descendant(child, config)
    })
}

/// Concatenated text of all text nodes under `node`, skipping excluded
/// subtrees (inline scripts inside captured containers).
fn text_content(node: &Handle, config: &ExtractorConfig) -> String {
    let mut buf = String::new();
    append_text(node, config, &mut buf);
    buf
}

fn append_text(node: &Handle, config: &ExtractorConfig, buf: &mut String) {
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => {
                let text = contents.borrow();
                if !text.trim().is_empty() {
                    if !buf.is_empty() && !buf.ends_with(char::is_whitespace) {
                        buf.push(' ');
                    }
                    buf.push_str(&text);
                }
            }
            NodeData::Element { .. } => {
                if !is_excluded_element(child, config) {
                    append_text(child, config, buf);
                }
            }
            _ => {}
        }
    }
}
