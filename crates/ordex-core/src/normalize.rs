use scraper::ElementRef;

/// Collapse every whitespace run (including non-breaking spaces) to a single
/// space and trim both ends. Idempotent.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_ws(&element.text().collect::<String>())
}
