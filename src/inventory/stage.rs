//! Stages and their shadow releases.
//!
//! Every stage `<name>` has a release of type `stage` with the same name and
//! version map. `Stage::create` and `Stage::update` write the stage first and
//! the shadow release second; when the second write fails the stage is left
//! on disk and [`Error::PartiallySynchronized`] is returned so the caller can
//! retry with an update.

use std::collections::BTreeMap;
use std::path::PathBuf;

use log::{debug, info, trace};
use serde_yaml::{Mapping, Value};

use super::release::version_string;
use super::{record_path, App, Inventory, Release, ReleaseType};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::resource::{self, Resource, ResourceKind};

/// A deployment stage mapping app names to versions.
#[derive(Debug, Clone)]
pub struct Stage {
    inventory: Inventory,
    name: String,
    /// App name to version.
    pub versions: BTreeMap<String, String>,
    read: bool,
}

impl Stage {
    pub fn new(inventory: &Inventory, name: impl Into<String>) -> Self {
        Self {
            inventory: inventory.clone(),
            name: name.into(),
            versions: BTreeMap::new(),
            read: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// The release of type `stage` kept in lockstep with this stage.
    pub fn shadow_release(&self) -> Release {
        Release::new(&self.inventory, self.name.clone(), ReleaseType::Stage)
    }

    /// Create the stage, then create or resynchronize its shadow release.
    pub fn create(&self) -> Result<()> {
        resource::create(self).map_err(|e| e.context(format!("Could not create stage {}", self.name)))?;
        self.sync_shadow_release()?;
        info!("Created stage '{}'", self.name);
        Ok(())
    }

    pub fn read(&mut self) -> Result<()> {
        resource::read(self)
    }

    /// Write the stage, then its shadow release.
    pub fn update(&self) -> Result<()> {
        resource::update(self)?;
        self.sync_shadow_release()
    }

    pub fn exists(&self) -> bool {
        resource::exists(self)
    }

    /// Set the version of one app in the stage and its shadow release.
    ///
    /// The app must exist somewhere in the inventory.
    pub fn update_version(&mut self, app_name: &str, version: &str) -> Result<()> {
        self.read()?;
        let app = App::find(&self.inventory, app_name)
            .map_err(|e| e.context(format!("Cannot set version of '{}' in stage {}", app_name, self.name)))?;
        self.versions
            .insert(app.name().to_string(), version.to_string());
        self.update()
    }

    fn sync_shadow_release(&self) -> Result<()> {
        let mut release = self.shadow_release();
        let synced = if release.exists() {
            debug!("Synchronizing shadow release of stage {}", self.name);
            release.read().and_then(|()| {
                release.versions = self.versions.clone();
                release.update()
            })
        } else {
            debug!("Creating shadow release of stage {}", self.name);
            release.versions = self.versions.clone();
            release.create()
        };
        synced.map_err(|source| Error::PartiallySynchronized {
            stage: self.name.clone(),
            source: Box::new(source),
        })
    }
}

impl Resource for Stage {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Stage
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn file_path(&self) -> PathBuf {
        record_path(&self.inventory.stages_dir(), &self.name)
    }

    fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }

    fn to_document(&self) -> Document {
        let versions = self
            .versions
            .iter()
            .map(|(app, version)| (Value::String(app.clone()), Value::String(version.clone())))
            .collect::<Mapping>();
        let mut document = Document::new();
        document.set_parameter(&self.name, Value::Mapping(versions));
        document
    }

    fn apply_document(&mut self, document: &Document) {
        self.versions.clear();
        for (app, version) in document.parameter_mapping(&self.name).into_iter().flatten() {
            let Some(app) = app.as_str() else { continue };
            if let Some(version) = version_string(&self.name, app, version) {
                self.versions.insert(app.to_string(), version);
            }
        }
        trace!("Mapped stage {} from document: {:?}", self.name, self.versions);
    }

    fn initialized(&self) -> bool {
        self.read
    }

    fn mark_initialized(&mut self) {
        self.read = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::test_support::*;
    use std::fs;

    #[test]
    fn test_read_flat_versions() {
        let (_temp, inventory) = inventory();
        write(&inventory, "inventory/classes/stages/alpha.yml", STAGE_ALPHA);
        let mut stage = Stage::new(&inventory, "alpha");
        stage.read().unwrap();
        assert_eq!(stage.versions.len(), 3);
        assert_eq!(stage.versions["app1"], "1.0.0");
    }

    #[test]
    fn test_unquoted_version_warns() {
        testing_logger::setup();
        let (_temp, inventory) = inventory();
        write(
            &inventory,
            "inventory/classes/stages/alpha.yml",
            "parameters:\n  alpha:\n    a: 1.10\n    b: \"1.10\"\n",
        );
        let mut stage = Stage::new(&inventory, "alpha");
        stage.read().unwrap();
        assert_eq!(stage.versions["a"], "1.1");
        assert_eq!(stage.versions["b"], "1.10");
        testing_logger::validate(|captured| {
            let warnings: Vec<_> = captured
                .iter()
                .filter(|l| l.level == log::Level::Warn && l.body.contains("not quoted"))
                .collect();
            assert_eq!(warnings.len(), 1);
            assert!(warnings[0].body.contains("app 'a' in 'alpha' is not quoted"));
            assert!(warnings[0].body.contains("'1.1'"));
        });
    }

    #[test]
    fn test_read_empty_parameters() {
        let (_temp, inventory) = inventory();
        write(&inventory, "inventory/classes/stages/empty.yml", "parameters:\n  empty:\n");
        let mut stage = Stage::new(&inventory, "empty");
        stage.read().unwrap();
        assert!(stage.versions.is_empty());
    }

    #[test]
    fn test_update_without_read_fails() {
        let (_temp, inventory) = inventory();
        write(&inventory, "inventory/classes/stages/alpha.yml", STAGE_ALPHA);
        let mut stage = Stage::new(&inventory, "alpha");
        stage.versions.insert("app1".to_string(), "9.9.9".to_string());
        assert!(matches!(
            stage.update(),
            Err(Error::UpdatedWithoutReading { .. })
        ));

        let mut on_disk = Stage::new(&inventory, "alpha");
        on_disk.read().unwrap();
        assert_eq!(on_disk.versions.len(), 3);
    }

    #[test]
    fn test_create_creates_shadow_release() {
        let (_temp, inventory) = inventory();
        let mut stage = Stage::new(&inventory, "mystage");
        stage.versions.insert("app1".to_string(), "1.0.0".to_string());
        stage.create().unwrap();

        let mut shadow = Release::new(&inventory, "mystage", ReleaseType::Stage);
        assert!(shadow.exists());
        shadow.read().unwrap();
        assert_eq!(shadow.versions, stage.versions);
    }

    #[test]
    fn test_create_resyncs_existing_shadow_release() {
        let (_temp, inventory) = inventory();
        let mut stale = Release::new(&inventory, "beta", ReleaseType::Stage);
        stale.versions.insert("old".to_string(), "0.1.0".to_string());
        stale.create().unwrap();

        let mut stage = Stage::new(&inventory, "beta");
        stage.versions.insert("app1".to_string(), "1.0.0".to_string());
        stage.create().unwrap();

        let mut shadow = stage.shadow_release();
        shadow.read().unwrap();
        assert_eq!(shadow.versions, stage.versions);
    }

    #[test]
    fn test_update_version_syncs_shadow_release() {
        let (_temp, inventory) = inventory();
        with_test_group(&inventory);
        let mut stage = Stage::new(&inventory, "mystage");
        stage.versions.insert("app1".to_string(), "1.0.0".to_string());
        stage.create().unwrap();

        let mut stage = Stage::new(&inventory, "mystage");
        stage.update_version("app2", "2.0.0").unwrap();

        let mut reloaded = Stage::new(&inventory, "mystage");
        reloaded.read().unwrap();
        let mut shadow = reloaded.shadow_release();
        shadow.read().unwrap();
        for versions in [&reloaded.versions, &shadow.versions] {
            assert_eq!(versions.len(), 2);
            assert_eq!(versions["app1"], "1.0.0");
            assert_eq!(versions["app2"], "2.0.0");
        }
    }

    #[test]
    fn test_update_version_unknown_app() {
        let (_temp, inventory) = inventory();
        with_test_group(&inventory);
        write(&inventory, "inventory/classes/stages/alpha.yml", STAGE_ALPHA);
        let mut stage = Stage::new(&inventory, "alpha");
        let err = stage.update_version("ghost", "1.0.0").unwrap_err();
        assert!(err.is_does_not_exist());
    }

    #[test]
    fn test_shadow_failure_is_partially_synchronized() {
        let (_temp, inventory) = inventory();
        let shadow_path = Release::new(&inventory, "gamma", ReleaseType::Stage).file_path();
        fs::create_dir_all(&shadow_path).unwrap();

        let stage = Stage::new(&inventory, "gamma");
        let err = stage.create().unwrap_err();
        assert!(matches!(err, Error::PartiallySynchronized { .. }));
        assert!(stage.exists());
    }

    #[test]
    fn test_round_trip() {
        let (_temp, inventory) = inventory();
        let mut stage = Stage::new(&inventory, "stable");
        stage.versions.insert("b".to_string(), "2".to_string());
        stage.versions.insert("a".to_string(), "1.0".to_string());
        let document = stage.to_document();

        let mut decoded = Stage::new(&inventory, "stable");
        decoded.apply_document(&crate::document::decode(&crate::document::encode(&document).unwrap()).unwrap());
        assert_eq!(decoded.versions, stage.versions);
    }

    proptest::proptest! {
        #[test]
        fn prop_document_round_trip(
            versions in proptest::collection::btree_map("[a-z][a-z0-9-]{0,8}", "[0-9]{1,2}(\\.[0-9]{1,2}){0,2}", 0..10),
        ) {
            let (_temp, inventory) = inventory();
            let mut stage = Stage::new(&inventory, "prop");
            stage.versions = versions;
            let bytes = crate::document::encode(&stage.to_document()).unwrap();

            let mut decoded = Stage::new(&inventory, "prop");
            decoded.apply_document(&crate::document::decode(&bytes).unwrap());
            proptest::prop_assert_eq!(decoded.versions, stage.versions);
        }
    }
}
