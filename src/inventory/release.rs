//! Releases: typed, named snapshots of app versions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::{trace, warn};
use serde_yaml::{Mapping, Value};

use super::{record_path, App, Inventory, Stage};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::resource::{self, Resource, ResourceKind};

/// The kind of release, which is also its storage subfolder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReleaseType {
    /// Reserved for the shadow release that mirrors a stage.
    Stage,
    Product,
    Hotfix,
}

impl ReleaseType {
    pub const ALL: [ReleaseType; 3] = [ReleaseType::Stage, ReleaseType::Product, ReleaseType::Hotfix];

    pub fn as_str(self) -> &'static str {
        match self {
            ReleaseType::Stage => "stage",
            ReleaseType::Product => "product",
            ReleaseType::Hotfix => "hotfix",
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "stage" => Ok(ReleaseType::Stage),
            "product" => Ok(ReleaseType::Product),
            "hotfix" => Ok(ReleaseType::Hotfix),
            _ => Err(Error::UnsupportedReleaseType {
                value: value.to_string(),
            }),
        }
    }
}

/// A release of one type, mapping app names to versions.
#[derive(Debug, Clone)]
pub struct Release {
    inventory: Inventory,
    release_type: ReleaseType,
    name: String,
    /// App name to version.
    pub versions: BTreeMap<String, String>,
    read: bool,
}

impl Release {
    pub fn new(inventory: &Inventory, name: impl Into<String>, release_type: ReleaseType) -> Self {
        Self {
            inventory: inventory.clone(),
            release_type,
            name: name.into(),
            versions: BTreeMap::new(),
            read: false,
        }
    }

    /// Parse a user-supplied `<type>/<name>`.
    ///
    /// The `stage` type is reserved for shadow releases and rejected here.
    pub fn from_full_name(inventory: &Inventory, full_name: &str) -> Result<Self> {
        let invalid = || Error::InvalidReleaseName {
            name: full_name.to_string(),
        };
        let (type_part, name) = full_name.split_once('/').ok_or_else(invalid)?;
        if name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        match type_part.parse::<ReleaseType>()? {
            ReleaseType::Stage => Err(invalid()),
            release_type => Ok(Self::new(inventory, name, release_type)),
        }
    }

    pub fn release_type(&self) -> ReleaseType {
        self.release_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<type>/<name>`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.release_type, self.name)
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn create(&self) -> Result<()> {
        resource::create(self)
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

    /// Set the version of one app and persist the release.
    ///
    /// The app must exist somewhere in the inventory.
    pub fn update_version(&mut self, app_name: &str, version: &str) -> Result<()> {
        self.read()?;
        let app = App::find(&self.inventory, app_name)?;
        self.versions
            .insert(app.name().to_string(), version.to_string());
        self.update()
    }

    /// Create this release with the versions currently in a stage.
    pub fn create_from_stage(&mut self, stage_name: &str) -> Result<()> {
        let mut stage = Stage::new(&self.inventory, stage_name);
        stage.read()?;
        self.versions = stage.versions.clone();
        self.create()
    }

    /// Create this release with the versions of another release (`<type>/<name>`).
    pub fn create_from_release(&mut self, full_name: &str) -> Result<()> {
        let mut source = Release::from_full_name(&self.inventory, full_name)?;
        source.read()?;
        self.versions = source.versions.clone();
        self.create()
    }
}

impl Resource for Release {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Release
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn file_path(&self) -> PathBuf {
        record_path(&self.inventory.releases_dir(self.release_type), &self.name)
    }

    fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }

    // Releases nest each version one level deeper than stages
    // (`app: {version: x}`); existing repositories depend on this shape.
    fn to_document(&self) -> Document {
        let mut apps = Mapping::new();
        for (app, version) in &self.versions {
            let mut entry = Mapping::new();
            entry.insert("version".into(), Value::String(version.clone()));
            apps.insert(Value::String(app.clone()), Value::Mapping(entry));
        }
        let mut document = Document::new();
        document.set_parameter(&self.name, Value::Mapping(apps));
        document
    }

    fn apply_document(&mut self, document: &Document) {
        self.versions.clear();
        if let Some(apps) = document.parameter_mapping(&self.name) {
            for (app, entry) in apps {
                let version = entry.as_mapping().and_then(|e| e.get("version"));
                let Some(app) = app.as_str() else { continue };
                if let Some(version) = version.and_then(|v| version_string(&self.name, app, v)) {
                    self.versions.insert(app.to_string(), version);
                }
            }
        }
        trace!("Mapped release {} from document: {:?}", self.name, self.versions);
    }

    fn initialized(&self) -> bool {
        self.read
    }

    fn mark_initialized(&mut self) {
        self.read = true;
    }
}

/// Scalar YAML values as strings; versions like `1.0` parse as numbers.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A version read from a stage or release.
///
/// Unquoted versions are decoded as numbers first, so `1.10` comes back as
/// `1.1`. The value is kept, and rewritten as a string on the next update.
pub(crate) fn version_string(list: &str, app: &str, value: &Value) -> Option<String> {
    let version = scalar_string(value)?;
    if !value.is_string() {
        warn!(
            "Version of app '{}' in '{}' is not quoted and was read as '{}', quote it to keep the exact text",
            app, list, version
        );
    }
    Some(version)
}
