//! # Version and Artifact Queries
//!
//! Stages and releases both map app names to versions. This module filters
//! those maps by app group or app name and turns them into artifact URLs
//! using the configured artifact repositories.
//!
//! ## Filter precedence
//!
//! - app filter set: only that app (the group filter is ignored with a warning)
//! - group filter set: the group's members that have a version
//! - no filter: the whole map
//!
//! Names without a version are dropped silently.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::config::ArtifactRepositories;
use crate::error::{Error, Result};
use crate::inventory::{App, AppGroup, Inventory, Release, Stage};
use crate::resource::Resource;

/// A record holding an app-to-version map.
pub trait VersionList: Resource {
    /// The inventory the record belongs to.
    fn inventory(&self) -> &Inventory;

    /// The full, unfiltered version map.
    fn versions(&self) -> &BTreeMap<String, String>;

    /// Set one app's version and persist the record.
    fn update_version(&mut self, app: &str, version: &str) -> Result<()>;
}

impl VersionList for Stage {
    fn inventory(&self) -> &Inventory {
        Stage::inventory(self)
    }

    fn versions(&self) -> &BTreeMap<String, String> {
        &self.versions
    }

    fn update_version(&mut self, app: &str, version: &str) -> Result<()> {
        Stage::update_version(self, app, version)
    }
}

impl VersionList for Release {
    fn inventory(&self) -> &Inventory {
        Release::inventory(self)
    }

    fn versions(&self) -> &BTreeMap<String, String> {
        &self.versions
    }

    fn update_version(&mut self, app: &str, version: &str) -> Result<()> {
        Release::update_version(self, app, version)
    }
}

/// Which version list a command operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSelector {
    /// A stage by name.
    Stage(String),
    /// A release by `<type>/<name>`.
    Release(String),
}

impl ListSelector {
    /// Build a selector from mutually exclusive `--stage` / `--release` values.
    pub fn from_flags(stage: Option<&str>, release: Option<&str>) -> Result<Self> {
        match (non_empty(stage), non_empty(release)) {
            (Some(stage), None) => Ok(ListSelector::Stage(stage.to_string())),
            (None, Some(release)) => Ok(ListSelector::Release(release.to_string())),
            (Some(_), Some(_)) => Err(Error::MissingArgument {
                argument: "either --stage or --release, not both".to_string(),
            }),
            (None, None) => Err(Error::MissingArgument {
                argument: "--stage or --release".to_string(),
            }),
        }
    }

    /// Read the selected record.
    pub fn load(&self, inventory: &Inventory) -> Result<Box<dyn VersionList>> {
        match self {
            ListSelector::Stage(name) => {
                let mut stage = Stage::new(inventory, name.as_str());
                stage.read()?;
                Ok(Box::new(stage))
            }
            ListSelector::Release(full_name) => {
                let mut release = Release::from_full_name(inventory, full_name)?;
                release.read()?;
                Ok(Box::new(release))
            }
        }
    }
}

/// What to do when an app lacks the requested artifact type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArtifactPolicy {
    /// Fail the whole listing on the first missing artifact.
    #[default]
    Abort,
    /// Leave the app out of the result.
    Skip,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Filter the version map of `list` by group or app name.
pub fn get_versions<L: VersionList + ?Sized>(
    list: &L,
    group: Option<&str>,
    app: Option<&str>,
) -> BTreeMap<String, String> {
    let versions = list.versions();
    let (group, app) = (non_empty(group), non_empty(app));
    if group.is_some() && app.is_some() {
        warn!("Both group and app filters are supplied... ignoring group filter");
    }
    if let Some(app) = app {
        return versions
            .get_key_value(app)
            .map(|(k, v)| (k.clone(), v.clone()))
            .into_iter()
            .collect();
    }
    let Some(group) = group else {
        return versions.clone();
    };
    let mut app_group = AppGroup::new(list.inventory(), group);
    if let Err(e) = app_group.read() {
        warn!("Cannot filter on group '{}': {}", group, e);
        return BTreeMap::new();
    }
    app_group
        .apps
        .iter()
        .filter_map(|a| versions.get_key_value(a))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Resolve the `artifact_type` URL of every app selected by the filters.
///
/// Apps with a version but no document in the inventory are skipped with a
/// warning. Apps without the artifact type abort the listing unless
/// `policy` is [`ArtifactPolicy::Skip`].
pub fn get_artifacts<L: VersionList + ?Sized>(
    list: &L,
    group: Option<&str>,
    app: Option<&str>,
    artifact_type: &str,
    repositories: &ArtifactRepositories,
    policy: ArtifactPolicy,
) -> Result<BTreeMap<String, String>> {
    let mut artifacts = BTreeMap::new();
    for (app_name, version) in get_versions(list, group, app) {
        let mut app = match App::find(list.inventory(), &app_name) {
            Ok(app) => app,
            Err(e) if e.is_does_not_exist() => {
                warn!("App '{}' listed in {} '{}' not found, skipping", app_name, list.kind(), list.name());
                continue;
            }
            Err(e) => return Err(e),
        };
        app.read()?;
        match app.artifact(list.name(), &version, artifact_type, repositories) {
            Ok(url) => {
                artifacts.insert(app_name, url);
            }
            Err(Error::NoSuchArtifact { .. }) if policy == ArtifactPolicy::Skip => {
                debug!("App '{}' has no '{}' artifact, skipping", app_name, artifact_type);
            }
            Err(e) => {
                return Err(e.context(format!("could not get artifact for app {}", app_name)));
            }
        }
    }
    Ok(artifacts)
}
