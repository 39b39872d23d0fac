//! Small helpers over `scraper` shared by the extractor and the HTTP session.

use enet_core::{EnetError, Result, text::squash_whitespace};
use scraper::{ElementRef, Selector};

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| EnetError::Parse(format!("invalid selector {css}: {e:?}")))
}

/// Rendered text of an element with whitespace collapsed.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    squash_whitespace(&element.text().collect::<String>())
}

/// Direct element children with one of the given tag names.
pub(crate) fn children_named<'a>(
    element: ElementRef<'a>,
    names: &'a [&'a str],
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| names.contains(&child.value().name()))
}
