//! App groups: a folder of app documents plus an index document.

use std::fs;
use std::path::PathBuf;

use log::{debug, trace};

use super::{record_path, Inventory, APP_CLASS_PREFIX};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::resource::{self, Resource, ResourceKind};

/// Class prefix written by older repositories (`app.<group>.<app>`).
const LEGACY_APP_CLASS_PREFIX: &str = "app";

/// A named group of apps.
///
/// The index document at `apps/<group>.yml` lists members as classes; the
/// app documents live in the `apps/<group>/` folder.
#[derive(Debug, Clone)]
pub struct AppGroup {
    inventory: Inventory,
    name: String,
    /// Member app names, in index order.
    pub apps: Vec<String>,
    read: bool,
}

impl AppGroup {
    pub fn new(inventory: &Inventory, name: impl Into<String>) -> Self {
        Self {
            inventory: inventory.clone(),
            name: name.into(),
            apps: Vec::new(),
            read: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Folder holding the member app documents.
    pub fn folder_path(&self) -> PathBuf {
        self.inventory.apps_dir().join(&self.name)
    }

    /// Create the group folder and its index document.
    pub fn create(&self) -> Result<()> {
        if !self.is_valid() {
            // Let the lifecycle report the validation failure.
            return resource::create(self);
        }
        if self.exists() {
            return Err(Error::AlreadyExists {
                resource_type: self.kind().label(),
                name: self.name.clone(),
                hint: None,
            });
        }
        let folder = self.folder_path();
        debug!("Creating app group folder {}", folder.display());
        fs::create_dir_all(&folder).map_err(|source| Error::FileIo {
            path: folder,
            source,
        })?;
        resource::create(self)
    }

    pub fn read(&mut self) -> Result<()> {
        resource::read(self)
    }

    pub fn update(&self) -> Result<()> {
        resource::update(self)
    }

    /// Both the folder and the index document must be present.
    pub fn exists(&self) -> bool {
        resource::exists(self)
    }

    /// Register an app by name, ignoring duplicates.
    pub fn add_app(&mut self, app_name: &str) {
        if !self.contains(app_name) {
            self.apps.push(app_name.to_string());
        }
    }

    pub fn contains(&self, app_name: &str) -> bool {
        self.apps.iter().any(|a| a == app_name)
    }

    fn app_from_class(&self, class: &str) -> String {
        for prefix in [APP_CLASS_PREFIX, LEGACY_APP_CLASS_PREFIX] {
            let full = format!("{}.{}.", prefix, self.name);
            if let Some(app) = class.strip_prefix(&full) {
                return app.to_string();
            }
        }
        class.rsplit('.').next().unwrap_or(class).to_string()
    }
}

impl Resource for AppGroup {
    fn kind(&self) -> ResourceKind {
        ResourceKind::AppGroup
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn file_path(&self) -> PathBuf {
        record_path(&self.inventory.apps_dir(), &self.name)
    }

    fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }

    fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.classes = self
            .apps
            .iter()
            .map(|app| format!("{}.{}.{}", APP_CLASS_PREFIX, self.name, app))
            .collect();
        document
    }

    fn apply_document(&mut self, document: &Document) {
        self.apps = document
            .classes
            .iter()
            .map(|class| self.app_from_class(class))
            .collect();
        trace!("Mapped app group {} from document: {:?}", self.name, self.apps);
    }

    fn initialized(&self) -> bool {
        self.read
    }

    fn mark_initialized(&mut self) {
        self.read = true;
    }

    fn exists(&self) -> bool {
        self.folder_path().is_dir() && self.file_path().is_file()
    }
}
