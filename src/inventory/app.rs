//! Apps: one document per application, stored inside its group folder.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::LazyLock;

use log::{debug, info, trace, warn};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use walkdir::WalkDir;

use super::release::scalar_string;
use super::{record_path, AppGroup, AppTemplate, Inventory};
use crate::config::ArtifactRepositories;
use crate::document::{Document, RECORD_EXTENSION};
use crate::error::{Error, Result};
use crate::resource::{self, Resource, ResourceKind};

/// Key of the artifact block inside an app's parameters.
pub const ARTIFACTS_KEY: &str = "artifacts";
/// Replaced by the requested version.
pub const VERSION_PLACEHOLDER: &str = "[gosh:version]";
/// Repository URL key used when no entry matches the list name.
pub const DEFAULT_REPOSITORY_KEY: &str = "default";

static REPOSITORY_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[gosh:repo:([^\]]+)\]").expect("repository placeholder pattern is valid")
});
static ANY_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[gosh:[^\]]*\]").expect("gosh placeholder pattern is valid"));

/// An application with flat properties and templated artifact URLs.
#[derive(Debug, Clone)]
pub struct App {
    inventory: Inventory,
    name: String,
    group: AppGroup,
    /// Flat string properties; nested values in the document are skipped.
    pub properties: BTreeMap<String, String>,
    /// Artifact type (`maven`, `docker`, ...) to URL template.
    pub artifacts: BTreeMap<String, String>,
    read: bool,
}

impl App {
    pub fn new(inventory: &Inventory, name: impl Into<String>, group: AppGroup) -> Self {
        Self {
            inventory: inventory.clone(),
            name: name.into(),
            group,
            properties: BTreeMap::new(),
            artifacts: BTreeMap::new(),
            read: false,
        }
    }

    /// Locate an app by name in any group.
    ///
    /// The returned app is bound to its group but not read.
    pub fn find(inventory: &Inventory, name: &str) -> Result<Self> {
        let not_found = || Error::DoesNotExist {
            resource_type: ResourceKind::App.label(),
            name: name.to_string(),
        };
        let apps_dir = inventory.apps_dir();
        if name.trim().is_empty() || !apps_dir.is_dir() {
            return Err(not_found());
        }
        let file_name = format!("{}.{}", name, RECORD_EXTENSION);
        for entry in WalkDir::new(&apps_dir).min_depth(2).max_depth(2).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() && entry.file_name() == file_name.as_str() {
                let group_name = entry
                    .path()
                    .parent()
                    .and_then(|p| p.file_name())
                    .and_then(|n| n.to_str())
                    .ok_or_else(not_found)?;
                trace!("Found app {} in group {}", name, group_name);
                return Ok(Self::new(inventory, name, AppGroup::new(inventory, group_name)));
            }
        }
        Err(not_found())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &AppGroup {
        &self.group
    }

    pub fn group_name(&self) -> &str {
        self.group.name()
    }

    /// Write the app document from this struct and register it in its group.
    pub fn create(&mut self) -> Result<()> {
        let group_created = self.prepare_create()?;
        resource::create(self)?;
        self.register_in_group(group_created)
    }

    /// Write the app document rendered from a template and register it in
    /// its group. `None` selects the built-in template.
    pub fn create_from_template(&mut self, template_name: Option<&str>) -> Result<()> {
        let group_created = self.prepare_create()?;
        let template = AppTemplate::load(&self.inventory, template_name)?;
        let rendered = template.render(self)?;
        let path = self.file_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::FileIo {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, rendered).map_err(|source| Error::FileIo {
            path: path.clone(),
            source,
        })?;
        info!("Created app '{}' from template '{}'", self.name, template.name);
        self.register_in_group(group_created)
    }

    pub fn read(&mut self) -> Result<()> {
        resource::read(self)
    }

    pub fn update(&self) -> Result<()> {
        resource::update(self)
    }

    pub fn exists(&self) -> bool {
        resource::exists(self)
    }

    /// Validate a new app and make sure its group exists.
    ///
    /// Returns whether the group was created by this call.
    fn prepare_create(&mut self) -> Result<bool> {
        trace!("Create app with input: {:?}", self);
        if !self.is_valid() {
            return Err(Error::Validation {
                resource_type: self.kind().label(),
                name: self.name.clone(),
                message: "invalid struct, use App::new with a named group".to_string(),
            });
        }
        if self.exists() {
            return Err(Error::AlreadyExists {
                resource_type: self.kind().label(),
                name: self.name.clone(),
                hint: None,
            });
        }
        match App::find(&self.inventory, &self.name) {
            Ok(existing) => {
                return Err(Error::AlreadyExists {
                    resource_type: self.kind().label(),
                    name: self.name.clone(),
                    hint: Some(format!(
                        "found in group '{}', app names must be unique across groups",
                        existing.group_name()
                    )),
                })
            }
            Err(e) if e.is_does_not_exist() => {}
            Err(e) => return Err(e),
        }
        if !self.group.exists() {
            debug!("Creating group {} for app {}", self.group.name(), self.name);
            self.group.create().map_err(|e| {
                e.context(format!(
                    "Error creating group '{}' for app '{}'",
                    self.group.name(),
                    self.name
                ))
            })?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Add the freshly written app to its group index.
    ///
    /// On failure the app file is removed again, together with the group
    /// when `group_created` is set, so that a retry starts from scratch.
    fn register_in_group(&mut self, group_created: bool) -> Result<()> {
        let name = self.name.clone();
        let group = &mut self.group;
        let registered = group.read().and_then(|()| {
            group.add_app(&name);
            group.update()
        });
        let Err(source) = registered else {
            return Ok(());
        };
        warn!(
            "Registering app '{}' in group '{}' failed, removing {}",
            self.name,
            self.group.name(),
            self.file_path().display()
        );
        self.remove_partial(group_created);
        Err(Error::GroupRegistration {
            app: name,
            group: self.group.name().to_string(),
            path: self.file_path(),
            source: Box::new(source),
        })
    }

    /// Best effort; the registration error is what the caller reports.
    fn remove_partial(&self, group_created: bool) {
        let mut leftovers = vec![self.file_path()];
        if group_created {
            leftovers.push(self.group.file_path());
        }
        for path in leftovers {
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Could not remove {}: {}", path.display(), e);
                }
            }
        }
        if group_created {
            // Only succeeds while the folder is empty.
            if let Err(e) = fs::remove_dir(self.group.folder_path()) {
                debug!(
                    "Kept group folder {}: {}",
                    self.group.folder_path().display(),
                    e
                );
            }
        }
    }

    /// Resolve the artifact URL of `artifact_type` for `version`.
    ///
    /// `[gosh:repo:<type>]` tokens take the URL configured for `<type>`
    /// under `list_name` (a stage or release name), falling back to the
    /// `default` entry. `[gosh:version]` becomes `version`. Any gosh token
    /// left afterwards is an error.
    pub fn artifact(
        &self,
        list_name: &str,
        version: &str,
        artifact_type: &str,
        repositories: &ArtifactRepositories,
    ) -> Result<String> {
        let template = self
            .artifacts
            .get(artifact_type)
            .ok_or_else(|| Error::NoSuchArtifact {
                app: self.name.clone(),
                artifact_type: artifact_type.to_string(),
            })?;

        let mut url = template.clone();
        for caps in REPOSITORY_PLACEHOLDER.captures_iter(template) {
            let repository_type = &caps[1];
            let repository = repository_url(repositories, repository_type, list_name)?;
            url = url.replace(&caps[0], repository);
        }
        url = url.replace(VERSION_PLACEHOLDER, version);

        if let Some(leftover) = ANY_PLACEHOLDER.find(&url) {
            return Err(Error::UnresolvedPlaceholder {
                app: self.name.clone(),
                placeholder: leftover.as_str().to_string(),
            });
        }
        Ok(url)
    }
}

fn repository_url<'a>(
    repositories: &'a ArtifactRepositories,
    repository_type: &str,
    list_name: &str,
) -> Result<&'a str> {
    let urls = repositories
        .iter()
        .find(|(t, _)| t.eq_ignore_ascii_case(repository_type))
        .map(|(_, urls)| urls)
        .ok_or_else(|| Error::ArtifactRepository {
            repository_type: repository_type.to_string(),
            message: "no repository configured".to_string(),
        })?;
    urls.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(list_name))
        .or_else(|| urls.iter().find(|(key, _)| key.as_str() == DEFAULT_REPOSITORY_KEY))
        .map(|(_, url)| url.as_str())
        .ok_or_else(|| Error::ArtifactRepository {
            repository_type: repository_type.to_string(),
            message: format!("no entry for '{}' and no default", list_name),
        })
}

impl Resource for App {
    fn kind(&self) -> ResourceKind {
        ResourceKind::App
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn file_path(&self) -> PathBuf {
        record_path(&self.group.folder_path(), &self.name)
    }

    fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.group.is_valid()
    }

    fn to_document(&self) -> Document {
        let mut block = Mapping::new();
        for (key, value) in &self.properties {
            block.insert(Value::String(key.clone()), Value::String(value.clone()));
        }
        let artifacts = self
            .artifacts
            .iter()
            .map(|(t, url)| (Value::String(t.clone()), Value::String(url.clone())))
            .collect::<Mapping>();
        block.insert(ARTIFACTS_KEY.into(), Value::Mapping(artifacts));
        let mut document = Document::new();
        document.set_parameter(&self.name, Value::Mapping(block));
        document
    }

    fn apply_document(&mut self, document: &Document) {
        self.properties.clear();
        self.artifacts.clear();
        let Some(block) = document.parameter_mapping(&self.name) else {
            return;
        };
        for (key, value) in block {
            let Some(key) = key.as_str() else { continue };
            if key == ARTIFACTS_KEY {
                for (artifact_type, url) in value.as_mapping().into_iter().flatten() {
                    if let (Some(t), Some(url)) = (artifact_type.as_str(), url.as_str()) {
                        self.artifacts.insert(t.to_string(), url.to_string());
                    }
                }
            } else if let Some(value) = scalar_string(value) {
                self.properties.insert(key.to_string(), value);
            } else {
                warn!(
                    "app definition '{}' has nested key '{}', not mapping",
                    self.name, key
                );
            }
        }
        trace!("Mapped app {} from document: {:?}", self.name, self);
    }

    fn initialized(&self) -> bool {
        self.read
    }

    fn mark_initialized(&mut self) {
        self.read = true;
    }
}
