//! # Import Plugins
//!
//! Bulk import of apps, stage versions and release versions into the
//! inventory. Every importer produces an [`ImportManifest`], which is applied
//! by [`apply_manifest`] exclusively through the entity constructors and their
//! create, read, update and exists operations.
//!
//! ## Plugins
//!
//! - **Built-in**: [`ManifestImporter`] (`manifest`) reads a manifest file,
//!   by default `.gosh/import.yml` in the working directory.
//! - **External**: any executable file in the plugin directory
//!   (`~/.gosh/plugins` by default). It is run as
//!   `<plugin> [--apps] [--stages] [--releases]` with `GOSH_WORKING_DIR` set,
//!   must exit with status 0 and print a manifest on stdout.
//!
//! ## Manifest format
//!
//! ```yaml
//! apps:
//!   - name: app1
//!     group: platform
//!     template: default        # optional
//!     properties:
//!       groupId: com/example
//!       artifactId: app1-dist
//! stages:
//!   alpha:
//!     app1: 1.0.0
//! releases:
//!   product/2024.R1:
//!     app1: 1.0.0
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::inventory::{App, AppGroup, Inventory, Release, Stage};

/// Name of the built-in manifest importer.
pub const MANIFEST_PLUGIN: &str = "manifest";

/// Names of the importers compiled into gosh.
pub const BUILTIN_PLUGINS: &[&str] = &[MANIFEST_PLUGIN];

/// Which parts of a manifest to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSelection {
    pub apps: bool,
    pub stages: bool,
    pub releases: bool,
}

impl Default for ImportSelection {
    fn default() -> Self {
        Self::all()
    }
}

/// Words accepted by [`ImportSelection::from_args`].
pub const IMPORT_PARTS: &[&str] = &["all", "apps", "stages", "releases"];

impl ImportSelection {
    pub fn all() -> Self {
        Self {
            apps: true,
            stages: true,
            releases: true,
        }
    }

    /// Parse `all|apps|stages|releases` words; no words selects everything.
    ///
    /// Any other word is rejected.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        if args.is_empty() {
            return Ok(Self::all());
        }
        let mut selection = Self {
            apps: false,
            stages: false,
            releases: false,
        };
        for arg in args {
            match arg.as_ref().to_ascii_lowercase().as_str() {
                "all" => selection = Self::all(),
                "apps" => selection.apps = true,
                "stages" => selection.stages = true,
                "releases" => selection.releases = true,
                _ => {
                    return Err(Error::UnsupportedImportPart {
                        value: arg.as_ref().to_string(),
                    })
                }
            }
        }
        Ok(selection)
    }
}

/// One app to import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestApp {
    pub name: String,
    pub group: String,
    /// App template name; the built-in template when absent.
    pub template: Option<String>,
    pub properties: BTreeMap<String, String>,
}

/// Data produced by an importer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportManifest {
    pub apps: Vec<ManifestApp>,
    /// Stage name to app versions.
    pub stages: BTreeMap<String, BTreeMap<String, String>>,
    /// Release full name (`<type>/<name>`) to app versions.
    pub releases: BTreeMap<String, BTreeMap<String, String>>,
}

impl ImportManifest {
    pub fn from_yaml(origin: &str, content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| Error::Parse {
            origin: origin.to_string(),
            source,
        })
    }
}

/// Settings shared by every importer run.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub selection: ImportSelection,
    /// Template for apps that do not name one.
    pub template: Option<String>,
    /// Manifest file for the built-in importer.
    pub source: Option<PathBuf>,
}

/// Counts of what an import changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub apps_created: usize,
    pub apps_skipped: usize,
    pub stages_created: usize,
    pub releases_created: usize,
    pub versions_updated: usize,
    pub versions_skipped: usize,
}

/// A named source of import data.
pub trait Importer {
    fn name(&self) -> &str;

    /// Produce the manifest to apply.
    fn load(&self, inventory: &Inventory, options: &ImportOptions) -> Result<ImportManifest>;
}

/// Built-in importer reading a manifest file.
#[derive(Debug, Default)]
pub struct ManifestImporter;

impl Importer for ManifestImporter {
    fn name(&self) -> &str {
        MANIFEST_PLUGIN
    }

    fn load(&self, inventory: &Inventory, options: &ImportOptions) -> Result<ImportManifest> {
        let path = options
            .source
            .clone()
            .unwrap_or_else(|| defaults::import_manifest_file(inventory.root()));
        debug!("Reading import manifest {}", path.display());
        let content = fs::read_to_string(&path).map_err(|source| Error::FileIo {
            path: path.clone(),
            source,
        })?;
        ImportManifest::from_yaml(&path.display().to_string(), &content)
    }
}

/// An executable in the plugin directory.
#[derive(Debug, Clone)]
pub struct ExternalImporter {
    name: String,
    path: PathBuf,
}

impl ExternalImporter {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn plugin_error(&self, message: impl Into<String>) -> Error {
        Error::Plugin {
            name: self.name.clone(),
            message: message.into(),
        }
    }
}

impl Importer for ExternalImporter {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self, inventory: &Inventory, options: &ImportOptions) -> Result<ImportManifest> {
        let mut command = Command::new(&self.path);
        let selection = options.selection;
        for (flag, selected) in [
            ("--apps", selection.apps),
            ("--stages", selection.stages),
            ("--releases", selection.releases),
        ] {
            if selected {
                command.arg(flag);
            }
        }
        command.env("GOSH_WORKING_DIR", inventory.root());
        info!("Running import plugin {}", self.name);
        let output = command
            .output()
            .map_err(|e| self.plugin_error(format!("could not run {}: {}", self.path.display(), e)))?;
        if !output.status.success() {
            return Err(self.plugin_error(format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        ImportManifest::from_yaml(&format!("output of plugin {}", self.name), &stdout)
    }
}

/// Find an importer by name: built-in first, then the plugin directory.
pub fn resolve(name: &str, plugin_dir: &Path) -> Result<Box<dyn Importer>> {
    if name == MANIFEST_PLUGIN {
        return Ok(Box::new(ManifestImporter));
    }
    let path = plugin_dir.join(name);
    if !name.is_empty() && !name.contains(['/', '\\']) && path.is_file() {
        debug!("Using external import plugin {}", path.display());
        return Ok(Box::new(ExternalImporter::new(name, path)));
    }
    Err(Error::PluginNotFound {
        name: name.to_string(),
        path: plugin_dir.to_path_buf(),
    })
}

/// Names of the installed external plugins, sorted.
pub fn list_plugins(plugin_dir: &Path) -> Result<Vec<String>> {
    if !plugin_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut plugins = Vec::new();
    for entry in fs::read_dir(plugin_dir).map_err(|source| Error::FileIo {
        path: plugin_dir.to_path_buf(),
        source,
    })? {
        let entry = entry?;
        if entry.path().is_file() {
            plugins.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    plugins.sort();
    Ok(plugins)
}

/// Load the manifest from `importer` and apply it.
pub fn run(
    importer: &dyn Importer,
    inventory: &Inventory,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    let manifest = importer
        .load(inventory, options)
        .map_err(|e| e.context(format!("Import with plugin {} failed", importer.name())))?;
    let summary = apply_manifest(inventory, &manifest, options)?;
    info!("Import with plugin {} successful", importer.name());
    Ok(summary)
}

/// Apply the selected parts of `manifest` to the inventory.
///
/// Existing apps are skipped with a warning. Stages and releases are created
/// when missing; versions of apps unknown to the inventory are skipped.
pub fn apply_manifest(
    inventory: &Inventory,
    manifest: &ImportManifest,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    if options.selection.apps {
        import_apps(inventory, &manifest.apps, options.template.as_deref(), &mut summary)?;
    }
    if options.selection.stages {
        for (stage_name, versions) in &manifest.stages {
            let mut stage = Stage::new(inventory, stage_name.as_str());
            if !stage.exists() {
                stage.create()?;
                summary.stages_created += 1;
            }
            stage.read()?;
            info!("Importing stage {}", stage_name);
            for (app, version) in versions {
                record_version(stage.update_version(app, version), app, version, &mut summary)?;
            }
        }
    }
    if options.selection.releases {
        for (full_name, versions) in &manifest.releases {
            let mut release = Release::from_full_name(inventory, full_name)?;
            if !release.exists() {
                release.create()?;
                summary.releases_created += 1;
            }
            release.read()?;
            info!("Importing release {}", full_name);
            for (app, version) in versions {
                record_version(release.update_version(app, version), app, version, &mut summary)?;
            }
        }
    }
    Ok(summary)
}

fn import_apps(
    inventory: &Inventory,
    apps: &[ManifestApp],
    default_template: Option<&str>,
    summary: &mut ImportSummary,
) -> Result<()> {
    for entry in apps {
        let group = AppGroup::new(inventory, entry.group.as_str());
        let mut app = App::new(inventory, entry.name.as_str(), group);
        if app.exists() {
            warn!("App {} already exists... skipping", entry.name);
            summary.apps_skipped += 1;
            continue;
        }
        app.properties = entry.properties.clone();
        let template = entry.template.as_deref().or(default_template);
        match app.create_from_template(template) {
            Ok(()) => {
                info!("Imported app {} in group {}", entry.name, entry.group);
                summary.apps_created += 1;
            }
            Err(e) if e.is_already_exists() => {
                warn!("App {} already exists... skipping: {}", entry.name, e);
                summary.apps_skipped += 1;
            }
            Err(e) => return Err(e.context(format!("Error importing app {}", entry.name))),
        }
    }
    Ok(())
}

fn record_version(
    result: Result<()>,
    app: &str,
    version: &str,
    summary: &mut ImportSummary,
) -> Result<()> {
    match result {
        Ok(()) => {
            info!("Updated version: {} = {}", app, version);
            summary.versions_updated += 1;
            Ok(())
        }
        Err(e) if e.is_does_not_exist() => {
            warn!("Could not update version for {} = {}: {}", app, version, e);
            summary.versions_skipped += 1;
            Ok(())
        }
        Err(e) => Err(e),
    }
}
