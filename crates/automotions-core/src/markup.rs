//! Small helpers over `scraper` trees shared by the format inferrer, the
//! statistics extractor and the reconciler, plus the info-slide renderer.

use scraper::{CaseSensitivity, ElementRef, Html, Node};

pub fn element_children<'a>(element: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap).collect()
}

pub fn first_element_child(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.children().find_map(ElementRef::wrap)
}

pub fn last_element_child(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.children().rev().find_map(ElementRef::wrap)
}

pub fn is_tag_with_class(element: ElementRef<'_>, tag: &str, class: &str) -> bool {
    let value = element.value();
    value.name() == tag && value.has_class(class, CaseSensitivity::CaseSensitive)
}

pub fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text nodes directly under `element`, ignoring nested elements.
pub fn direct_text(element: ElementRef<'_>) -> String {
    let joined: String = element
        .children()
        .filter_map(|node| node.value().as_text().map(|text| &**text))
        .collect();
    collapse_ws(&joined)
}

pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_ws(&element.text().collect::<String>())
}

/// Leading integer of counters shaped like `"12 affirmative wins"`.
pub fn leading_count(text: &str) -> Option<u32> {
    text.split_whitespace().next()?.parse().ok()
}

/// Plaintext rendering of an info slide: paragraphs and `<br>` become line
/// breaks, list items become `- ` or `N. ` bullets indented two spaces per
/// nesting level.
pub fn info_slide_to_plain(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    render_element(fragment.root_element(), 0)
}

fn render_element(element: ElementRef<'_>, depth: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    for child in element.children() {
        if let Node::Text(text) = child.value() {
            parts.push(text.trim().to_string());
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        match child.value().name() {
            "br" => parts.push("\n".to_string()),
            "p" => {
                let inner = render_element(child, depth);
                let inner = inner.trim();
                if !inner.is_empty() {
                    parts.push(format!("{inner}\n"));
                }
            }
            name @ ("ul" | "ol") => {
                let ordered = name == "ol";
                let items = element_children(child)
                    .into_iter()
                    .filter(|item| item.value().name() == "li");
                for (idx, item) in items.enumerate() {
                    let bullet = if ordered {
                        format!("{}. ", idx + 1)
                    } else {
                        "- ".to_string()
                    };
                    let text = render_element(item, depth + 1);
                    parts.push(format!("{}{}{}\n", "  ".repeat(depth), bullet, text.trim()));
                }
            }
            "li" => parts.push(render_element(child, depth).trim().to_string()),
            _ => parts.push(render_element(child, depth)),
        }
    }
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .replace("\n ", "\n")
        .replace(" \n", "\n")
}
