//! App templates used by `gosh create app`.
//!
//! A template is the text of an app document with `{{...}}` placeholders.
//! Supported placeholders:
//!
//! - `{{name}}`: the app name
//! - `{{group}}`: the app group name
//! - `{{properties.<key>}}`: an app property, empty when the app lacks it
//!
//! Artifact tokens such as `[gosh:version]` are left untouched; they are
//! resolved when artifacts are listed.

use std::fs;
use std::sync::LazyLock;

use log::debug;
use regex::{Captures, Regex};

use super::{record_path, App, Inventory};
use crate::document;
use crate::error::{Error, Result};

/// Name reported for the built-in template.
pub const DEFAULT_TEMPLATE_NAME: &str = "default";

const DEFAULT_TEMPLATE: &str = r#"parameters:
  {{name}}:
    app_name: {{name}}
    version: latest
    ref: master
    groupId: "{{properties.groupId}}"
    artifactId: "{{properties.artifactId}}"
    artifacts:
      maven: "[gosh:repo:maven]/{{properties.groupId}}/{{properties.artifactId}}/[gosh:version]/{{properties.artifactId}}-[gosh:version].zip"
      docker: "[gosh:repo:docker]/{{name}}:[gosh:version]"
"#;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([\w.\-]+)\s*\}\}").expect("template placeholder pattern is valid")
});

/// A named app document template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppTemplate {
    pub name: String,
    pub content: String,
}

impl Default for AppTemplate {
    fn default() -> Self {
        Self {
            name: DEFAULT_TEMPLATE_NAME.to_string(),
            content: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl AppTemplate {
    /// Load `.gosh/templates/<name>.yml`, or the built-in template when no
    /// name is given.
    pub fn load(inventory: &Inventory, name: Option<&str>) -> Result<Self> {
        let name = match name.map(str::trim) {
            None | Some("") => return Ok(Self::default()),
            Some(name) => name,
        };
        let path = record_path(&inventory.templates_dir(), name);
        if !path.is_file() {
            return Err(Error::TemplateNotFound {
                name: name.to_string(),
                path,
            });
        }
        debug!("Loading app template {}", path.display());
        let content = fs::read_to_string(&path).map_err(|source| Error::FileIo {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            name: name.to_string(),
            content,
        })
    }

    /// Substitute the placeholders for `app`.
    ///
    /// The result must decode as a record document.
    pub fn render(&self, app: &App) -> Result<String> {
        let mut unknown = None;
        let rendered = PLACEHOLDER.replace_all(&self.content, |caps: &Captures| {
            let key = &caps[1];
            match key {
                "name" => app.name().to_string(),
                "group" => app.group_name().to_string(),
                _ => match key.strip_prefix("properties.") {
                    Some(property) => app.properties.get(property).cloned().unwrap_or_default(),
                    None => {
                        unknown.get_or_insert_with(|| key.to_string());
                        caps[0].to_string()
                    }
                },
            }
        });
        if let Some(placeholder) = unknown {
            return Err(Error::Template {
                name: self.name.clone(),
                message: format!("unknown placeholder '{{{{{}}}}}'", placeholder),
            });
        }
        let rendered = rendered.into_owned();
        document::decode(rendered.as_bytes()).map_err(|e| Error::Template {
            name: self.name.clone(),
            message: format!("rendered template is not a valid record document: {}", e),
        })?;
        Ok(rendered)
    }
}
