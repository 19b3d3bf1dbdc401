//! Character-budget truncation for HTML and plain text.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::{ElementRef, Html, Node};

use super::sanitize::VOID_ELEMENTS;

/// Truncate an HTML fragment to `max_chars` visible characters.
///
/// The cut happens inside the innermost open element, trailing whitespace
/// is trimmed and `marker` is inserted verbatim before every open element
/// is closed again. Returns `None` when the fragment already fits.
pub fn truncate_html(html: &str, max_chars: usize, marker: &str) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();

    let visible: usize = root.text().map(|t| t.chars().count()).sum();
    if visible <= max_chars {
        return None;
    }

    let mut cut = Cut { remaining: max_chars, marker, done: false, out: String::with_capacity(html.len()) };
    cut.children(root);
    cut.finish();
    Some(cut.out)
}

/// Undo an escaped rendition of `marker` left in truncated output.
///
/// Only the last occurrence is repaired, and only when the raw marker is
/// absent. Never apply this to content that was not cut: an escaped marker
/// there is the author's own text.
pub fn restore_marker(html: String, marker: &str) -> String {
    let escaped = encode_text(marker);
    if escaped == marker || html.contains(marker) {
        return html;
    }
    match html.rfind(escaped.as_ref()) {
        Some(idx) => {
            let mut repaired = html;
            repaired.replace_range(idx..idx + escaped.len(), marker);
            repaired
        }
        None => html,
    }
}

/// Prefix of `text` holding at most `max_chars` characters, or `None` when
/// it already fits.
pub fn truncate_text(text: &str, max_chars: usize) -> Option<&str> {
    text.char_indices().nth(max_chars).map(|(idx, _)| &text[..idx])
}

struct Cut<'m> {
    remaining: usize,
    marker: &'m str,
    done: bool,
    out: String,
}

impl Cut<'_> {
    fn children(&mut self, parent: ElementRef<'_>) {
        for child in parent.children() {
            if self.done {
                return;
            }
            match child.value() {
                Node::Text(text) => self.text(text),
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        self.element(element);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, element: ElementRef<'_>) {
        if self.remaining == 0 {
            self.finish();
            return;
        }

        let name = element.value().name();
        self.out.push('<');
        self.out.push_str(name);
        for (attr, value) in element.value().attrs() {
            let _ = write!(self.out, " {}=\"{}\"", attr, encode_double_quoted_attribute(value));
        }
        self.out.push('>');

        if VOID_ELEMENTS.contains(&name) {
            return;
        }

        self.children(element);
        // opened elements are always closed, even past the cut
        let _ = write!(self.out, "</{}>", name);
    }

    fn text(&mut self, text: &str) {
        let len = text.chars().count();
        if len <= self.remaining {
            self.remaining -= len;
            self.out.push_str(&encode_text(text));
            return;
        }

        let kept = truncate_text(text, self.remaining).unwrap_or(text).trim_end();
        self.out.push_str(&encode_text(kept));
        self.remaining = 0;
        self.finish();
    }

    fn finish(&mut self) {
        if !self.done {
            self.out.push_str(self.marker);
            self.done = true;
        }
    }
}
