//! Templates loaded from the filesystem

use super::{RenderError, TemplateEngine, TemplateRenderer};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const TEMPLATE_EXTENSION: &str = "html";

/// Renders `<content_root>/<emails_folder>/<template_id>.html`
///
/// Templates are read on every call; edits show up without a restart.
#[derive(Debug, Clone)]
pub struct FileTemplateRenderer {
    root: PathBuf,
}

impl FileTemplateRenderer {
    pub fn new(content_root: impl AsRef<Path>, emails_folder: impl AsRef<Path>) -> Self {
        Self {
            root: content_root.as_ref().join(emails_folder),
        }
    }

    /// Directory templates are looked up in
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn template_path(&self, template_id: &str) -> Result<PathBuf, RenderError> {
        let invalid = template_id.is_empty()
            || template_id.contains(['/', '\\'])
            || template_id.contains("..")
            || template_id.starts_with('.');
        if invalid {
            return Err(RenderError::InvalidTemplateId(template_id.to_string()));
        }

        Ok(self
            .root
            .join(format!("{}.{}", template_id, TEMPLATE_EXTENSION)))
    }
}

#[async_trait]
impl TemplateRenderer for FileTemplateRenderer {
    async fn render(
        &self,
        template_id: &str,
        data: &serde_json::Value,
    ) -> Result<String, RenderError> {
        let path = self.template_path(template_id)?;

        let source = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RenderError::NotFound(template_id.to_string())
            } else {
                RenderError::Io {
                    template_id: template_id.to_string(),
                    source: e,
                }
            }
        })?;

        tracing::debug!(template_id, path = %path.display(), "Rendering email template");

        Ok(TemplateEngine::from_data(data)?.render(&source))
    }
}
