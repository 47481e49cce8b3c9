pub mod static_html;

use crate::error::{FieldError, GroundtruthError};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::trace;

/// Trait for page rendering backends.
pub trait PageRenderer: Send + Sync {
    /// Turn a stored page into a queryable document. The returned page is one
    /// render session; it is released when dropped.
    fn render(&self, path: &Path) -> Result<RenderedPage, GroundtruthError>;

    /// Name of this rendering backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// A static, queryable view of one rendered article page.
pub struct RenderedPage {
    path: PathBuf,
    document: Html,
}

impl RenderedPage {
    pub fn from_html(path: impl Into<PathBuf>, html: &str) -> Self {
        Self {
            path: path.into(),
            document: Html::parse_document(html),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First element matching `selector`.
    pub fn find(&self, selector: &str) -> Result<Option<Element<'_>>, FieldError> {
        let compiled = compile(selector)?;
        Ok(self.document.select(&compiled).next().map(Element::new))
    }

    /// All elements matching `selector`, in document order.
    pub fn find_all(&self, selector: &str) -> Result<Vec<Element<'_>>, FieldError> {
        let compiled = compile(selector)?;
        Ok(self.document.select(&compiled).map(Element::new).collect())
    }

    /// Wait at most `timeout` for `selector` to be present.
    ///
    /// A static document cannot change after load, so one probe decides: an
    /// absent element is a timeout when a wait was requested and a plain miss
    /// otherwise.
    pub fn wait_until_present(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Element<'_>, FieldError> {
        self.find(selector)?
            .ok_or_else(|| absent(selector, timeout))
    }

    /// Like [`wait_until_present`](Self::wait_until_present) for every match;
    /// an empty match set counts as absent.
    pub fn wait_until_all_present(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Element<'_>>, FieldError> {
        let elements = self.find_all(selector)?;
        if elements.is_empty() {
            Err(absent(selector, timeout))
        } else {
            Ok(elements)
        }
    }
}

impl Drop for RenderedPage {
    fn drop(&mut self) {
        trace!(page = %self.path.display(), "render session released");
    }
}

impl std::fmt::Debug for RenderedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedPage")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn absent(selector: &str, timeout: Duration) -> FieldError {
    if timeout.is_zero() {
        FieldError::MissingElement {
            selector: selector.to_string(),
        }
    } else {
        FieldError::TimeoutWaiting {
            selector: selector.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

fn compile(selector: &str) -> Result<Selector, FieldError> {
    Selector::parse(selector).map_err(|_| FieldError::InvalidSelector(selector.to_string()))
}

/// An element of a [`RenderedPage`].
#[derive(Clone, Copy)]
pub struct Element<'a> {
    inner: ElementRef<'a>,
}

impl std::fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element").field("name", &self.name()).finish()
    }
}

impl<'a> Element<'a> {
    fn new(inner: ElementRef<'a>) -> Self {
        Self { inner }
    }

    pub fn name(&self) -> &'a str {
        self.inner.value().name()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.inner.value().attr(name)
    }

    /// Rendered text on one line, whitespace collapsed.
    pub fn text(&self) -> String {
        self.lines().join(" ")
    }

    /// Rendered text split at line breaks: `<br>` and block element boundaries.
    pub fn lines(&self) -> Vec<String> {
        let mut raw = String::new();
        collect_text(self.inner, &mut raw);
        raw.lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect()
    }

    pub fn find(&self, selector: &str) -> Result<Option<Element<'a>>, FieldError> {
        let compiled = compile(selector)?;
        let found = self.inner.select(&compiled).next().map(Element::new);
        Ok(found)
    }

    pub fn find_all(&self, selector: &str) -> Result<Vec<Element<'a>>, FieldError> {
        let compiled = compile(selector)?;
        let found = self.inner.select(&compiled).map(Element::new).collect();
        Ok(found)
    }

    /// Direct element children, in document order.
    pub fn children(&self) -> Vec<Element<'a>> {
        self.inner
            .children()
            .filter_map(ElementRef::wrap)
            .map(Element::new)
            .collect()
    }

    /// Nearest preceding sibling element with tag `name`.
    pub fn preceding_sibling(&self, name: &str) -> Option<Element<'a>> {
        self.inner
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == name)
            .map(Element::new)
    }
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if name == "br" {
                out.push('\n');
                continue;
            }
            if matches!(name, "script" | "style" | "noscript" | "template") {
                continue;
            }
            let block = is_block(name);
            if block {
                out.push('\n');
            }
            collect_text(child_el, out);
            if block {
                out.push('\n');
            }
        } else if let Node::Text(text) = child.value() {
            // Source newlines inside a text node are layout, not line breaks.
            out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
        }
    }
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "li"
            | "ul"
            | "ol"
            | "table"
            | "tr"
            | "blockquote"
            | "figure"
            | "figcaption"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> RenderedPage {
        RenderedPage::from_html("test.html", html)
    }

    #[test]
    fn test_find_and_attr() {
        let p = page(r#"<div class="bib-identity"><a href="https://doi.org/10.3390/x">doi</a></div>"#);
        let link = p.find("div.bib-identity a").unwrap().unwrap();
        assert_eq!(link.attr("href"), Some("https://doi.org/10.3390/x"));
        assert_eq!(link.name(), "a");
        assert!(p.find("span.missing").unwrap().is_none());
    }

    #[test]
    fn test_lines_split_on_br_and_blocks() {
        let p = page(
            r#"<span class="ltx_personname">Alice Smith<br>Bob  Jones<br class="ltx_break"></span>
               <div id="x"><p>First</p><p>Second  para</p></div>"#,
        );
        let names = p.find(".ltx_personname").unwrap().unwrap();
        assert_eq!(names.lines(), vec!["Alice Smith", "Bob Jones"]);
        let div = p.find("#x").unwrap().unwrap();
        assert_eq!(div.text(), "First Second para");
    }

    #[test]
    fn test_lines_ignore_newlines_inside_text() {
        let p = page(
            "<span class=\"ltx_personname\">Alice\n      Smith<br class=\"ltx_break\">Bob\r\n\tJones</span>",
        );
        let names = p.find(".ltx_personname").unwrap().unwrap();
        assert_eq!(names.lines(), vec!["Alice Smith", "Bob Jones"]);
    }

    #[test]
    fn test_wait_absent_element() {
        let p = page("<p>nothing</p>");
        assert_eq!(
            p.wait_until_present("h1", Duration::from_millis(200)).unwrap_err(),
            FieldError::TimeoutWaiting {
                selector: "h1".into(),
                timeout_ms: 200
            }
        );
        assert_eq!(
            p.wait_until_all_present("h1", Duration::ZERO).unwrap_err(),
            FieldError::MissingElement {
                selector: "h1".into()
            }
        );
    }

    #[test]
    fn test_invalid_selector() {
        let p = page("<p>x</p>");
        assert!(matches!(
            p.find("p[[").unwrap_err(),
            FieldError::InvalidSelector(_)
        ));
    }

    #[test]
    fn test_preceding_sibling_heading() {
        let p = page(
            r#"<section><h2>Intro</h2><div id="Sec1-content">a</div>
               <h2>References</h2><div id="Sec2-content">b</div></section>"#,
        );
        let blocks = p.find_all("div[id^='Sec'][id$='-content']").unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].preceding_sibling("h2").unwrap().text(), "Intro");
        assert_eq!(blocks[1].preceding_sibling("h2").unwrap().text(), "References");
    }

    #[test]
    fn test_children_skip_text_nodes() {
        let p = page(r#"<div id="abstract-1"><h2>Abstract</h2> text <p>Body</p></div>"#);
        let children = p.find("#abstract-1").unwrap().unwrap().children();
        let names: Vec<_> = children.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["h2", "p"]);
    }
}
