// src/crawler/extract.rs
// =============================================================================
// Pulls every `href` attribute value out of a parsed HTML document.
//
// Unlike a CSS selector such as "a[href]", we walk the whole tree, so <link>,
// <base>, <area> or any other element carrying an href contributes. Values
// are reported as written: relative paths, fragments and junk all stay.
//
// Rust concepts:
// - Iterators: ego_tree's descendants() is a pre-order walk without recursion
// - Pattern matching on Option with if let
// =============================================================================

use scraper::Html;

/// Parses a response body. html5ever never rejects input, so this always
/// yields a tree, however partial.
pub fn parse_body(body: &[u8]) -> Html {
    Html::parse_document(&String::from_utf8_lossy(body))
}

/// Returns every href value in the document, in pre-order.
///
/// The attribute name is compared case-insensitively, the value is kept
/// untouched.
pub fn extract_references(document: &Html) -> Vec<String> {
    let mut references = Vec::new();

    // descendants() starts with the root itself, then first child, then
    // that child's subtree, then its next sibling, and so on
    for node in document.tree.root().descendants() {
        if let Some(element) = node.value().as_element() {
            for (name, value) in element.attrs() {
                if name.eq_ignore_ascii_case("href") {
                    references.push(value.to_string());
                }
            }
        }
    }

    references
}
