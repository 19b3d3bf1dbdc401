//! Allow-list HTML sanitizer.
//!
//! Parses the fragment with scraper and re-serializes only what the
//! allow-list permits:
//!
//! - allowed elements keep their allowed attributes
//! - other elements are unwrapped, keeping their text
//! - script-like elements are dropped with their content
//! - comments and processing instructions are dropped
//! - all text and attribute values are re-escaped

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::{ElementRef, Html, Node};
use url::Url;
use wmcache_core::config::SanitizeOptions;

/// Elements whose content is never kept, even as text.
const DROP_CONTENT: &[&str] = &["script", "style", "textarea", "noscript", "iframe", "template", "title"];

/// Elements without a closing tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "wbr", "area", "col", "embed", "source", "track"];

/// Schemes kept on URL-valued attributes.
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "ftp"];

/// URL-valued attributes subject to the scheme check.
const URL_ATTRIBUTES: &[&str] = &["href", "src", "cite"];

/// Tag/attribute allow-list sanitizer.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    allowed_tags: HashSet<String>,
    allowed_attributes: HashMap<String, HashSet<String>>,
}

impl Sanitizer {
    pub fn new(options: &SanitizeOptions) -> Self {
        let allowed_tags = options.allowed_tags.iter().map(|t| t.to_ascii_lowercase()).collect();
        let allowed_attributes = options
            .allowed_attributes
            .iter()
            .map(|(tag, attrs)| (tag.to_ascii_lowercase(), attrs.iter().map(|a| a.to_ascii_lowercase()).collect()))
            .collect();
        Self { allowed_tags, allowed_attributes }
    }

    /// Sanitize an HTML fragment.
    pub fn sanitize(&self, html: &str) -> String {
        let fragment = Html::parse_fragment(html);
        let mut out = String::with_capacity(html.len());
        self.write_children(fragment.root_element(), &mut out);
        out
    }

    fn write_children(&self, parent: ElementRef<'_>, out: &mut String) {
        for child in parent.children() {
            match child.value() {
                Node::Text(text) => out.push_str(&encode_text(&**text)),
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        self.write_element(element, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn write_element(&self, element: ElementRef<'_>, out: &mut String) {
        let name = element.value().name();

        if DROP_CONTENT.contains(&name) {
            return;
        }
        if !self.allowed_tags.contains(name) {
            self.write_children(element, out);
            return;
        }

        out.push('<');
        out.push_str(name);
        for (attr, value) in element.value().attrs() {
            if self.keeps_attribute(name, attr, value) {
                let _ = write!(out, " {}=\"{}\"", attr, encode_double_quoted_attribute(value));
            }
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&name) {
            return;
        }

        self.write_children(element, out);
        let _ = write!(out, "</{}>", name);
    }

    fn keeps_attribute(&self, tag: &str, attr: &str, value: &str) -> bool {
        let listed = self.allowed_attributes.get(tag).is_some_and(|attrs| attrs.contains(attr));
        listed && (!URL_ATTRIBUTES.contains(&attr) || is_safe_url(value))
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(&SanitizeOptions::default())
    }
}

/// Relative URLs and absolute URLs with a safe scheme.
fn is_safe_url(value: &str) -> bool {
    match Url::parse(value.trim()) {
        Ok(url) => SAFE_SCHEMES.contains(&url.scheme()),
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}

/// Visible text of an HTML fragment with tags removed and entities decoded.
pub fn strip_tags(html: &str) -> String {
    Html::parse_fragment(html).root_element().text().collect()
}
