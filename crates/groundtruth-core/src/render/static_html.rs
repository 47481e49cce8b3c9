use crate::error::GroundtruthError;
use crate::render::{PageRenderer, RenderedPage};
use std::path::Path;
use tracing::trace;

/// Rendering backend for pages that were fully rendered before storage.
///
/// Reads the stored HTML and parses it once; no scripts are executed.
pub struct StaticHtmlRenderer;

impl StaticHtmlRenderer {
    pub fn new() -> Self {
        StaticHtmlRenderer
    }
}

impl Default for StaticHtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRenderer for StaticHtmlRenderer {
    fn render(&self, path: &Path) -> Result<RenderedPage, GroundtruthError> {
        if !path.is_file() {
            return Err(GroundtruthError::InvalidPageHandle {
                path: path.to_path_buf(),
                reason: "not a readable file".into(),
            });
        }

        let bytes = std::fs::read(path).map_err(|e| GroundtruthError::InvalidPageHandle {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let html = String::from_utf8_lossy(&bytes);

        trace!(page = %path.display(), bytes = bytes.len(), "render session opened");
        Ok(RenderedPage::from_html(path, &html))
    }

    fn backend_name(&self) -> &str {
        "static-html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_stored_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.html");
        std::fs::write(&path, "<html><body><h1 id='t'>Hello</h1></body></html>").unwrap();

        let page = StaticHtmlRenderer::new().render(&path).unwrap();
        assert_eq!(page.path(), path.as_path());
        assert_eq!(page.find("#t").unwrap().unwrap().text(), "Hello");
    }

    #[test]
    fn test_missing_page_is_invalid_handle() {
        let dir = tempfile::tempdir().unwrap();
        let err = StaticHtmlRenderer::new()
            .render(&dir.path().join("nope.html"))
            .unwrap_err();
        assert!(matches!(err, GroundtruthError::InvalidPageHandle { .. }));

        // A directory is not a page either.
        let err = StaticHtmlRenderer::new().render(dir.path()).unwrap_err();
        assert!(matches!(err, GroundtruthError::InvalidPageHandle { .. }));
    }

    #[test]
    fn test_backend_name() {
        assert_eq!(StaticHtmlRenderer::new().backend_name(), "static-html");
    }
}
