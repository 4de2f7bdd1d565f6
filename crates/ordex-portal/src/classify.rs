use crate::config::Markers;
use scraper::{ElementRef, Html, Node, Selector};

/// Verdict on a page reached after submitting credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A positive or logout marker was found and no negative one
    Authenticated { marker: String },
    /// A negative marker was found; wins over any positive marker
    Rejected { marker: String },
    /// Neither kind of marker was found
    Ambiguous,
}

impl Classification {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Classification::Authenticated { .. })
    }
}

/// Best-effort lexical classification of a page.
///
/// Only the visible text is scanned (script and style content is ignored);
/// logout markers are additionally matched against link targets.
pub fn classify(body: &str, markers: &Markers) -> Classification {
    let document = Html::parse_document(body);
    let text = visible_text(&document).to_lowercase();

    if let Some(marker) = first_marker(&text, &markers.negative) {
        tracing::debug!("Negative marker found: {}", marker);
        return Classification::Rejected { marker };
    }

    if let Some(marker) = first_marker(&text, &markers.positive) {
        return Classification::Authenticated { marker };
    }

    if let Some(marker) = first_marker(&text, &markers.logout) {
        return Classification::Authenticated { marker };
    }

    let hrefs = link_targets(&document).to_lowercase();
    if let Some(marker) = first_marker(&hrefs, &markers.logout) {
        return Classification::Authenticated { marker };
    }

    Classification::Ambiguous
}

fn first_marker(haystack: &str, markers: &[String]) -> Option<String> {
    markers
        .iter()
        .find(|m| !m.is_empty() && haystack.contains(&m.to_lowercase()))
        .cloned()
}

fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    collect_text(document.root_element(), &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(el) if matches!(el.name(), "script" | "style" | "noscript" | "template") => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

fn link_targets(document: &Html) -> String {
    let Ok(sel) = Selector::parse("a[href]") else {
        return String::new();
    };
    document
        .select(&sel)
        .filter_map(|a| a.value().attr("href"))
        .collect::<Vec<_>>()
        .join(" ")
}
