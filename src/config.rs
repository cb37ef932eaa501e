//! # Configuration
//!
//! gosh reads its configuration from three places, later ones winning:
//!
//! 1. `~/.gosh/config.yml` in the home directory
//! 2. `<working dir>/.gosh/config.yml` (project specific, deep-merged over 1)
//! 3. `GOSH_*` environment variables
//!
//! Keys are case-insensitive: `Auth.Private_Key_File`, `auth.private_key_file`
//! and `ArtifactRepositories` are all accepted. Because of that, the
//! stage and release keys under `artifact_repositories` are stored in lower
//! case and matched case-insensitively.
//!
//! ```yaml
//! repository:
//!   url: https://git.example/deploy.git
//! auth:
//!   type: basic            # or ssh
//!   user: me
//!   pass: bXktcGFzcw==     # base64
//! artifact_repositories:
//!   maven:
//!     default: https://repo.example/released
//!     alpha: https://repo.example/tested
//! output:
//!   default_format: properties
//!   versions_key_suffix: version
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use log::{debug, trace};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::defaults;
use crate::error::{Error, Result};

/// Artifact type to (stage or release name, or `default`) to repository URL.
pub type ArtifactRepositories = BTreeMap<String, BTreeMap<String, String>>;

/// Environment variables mapped onto configuration keys.
pub const ENV_OVERRIDES: &[(&str, &[&str])] = &[
    ("GOSH_REPOSITORY_URL", &["repository", "url"]),
    ("GOSH_AUTH_TYPE", &["auth", "type"]),
    ("GOSH_AUTH_USER", &["auth", "user"]),
    ("GOSH_AUTH_PASS", &["auth", "pass"]),
    ("GOSH_AUTH_PRIVATE_KEY_FILE", &["auth", "private_key_file"]),
    ("GOSH_AUTH_PRIVATE_KEY_PASS", &["auth", "private_key_pass"]),
    ("GOSH_OUTPUT_DEFAULT_FORMAT", &["output", "default_format"]),
    ("GOSH_OUTPUT_VERSIONS_KEY_SUFFIX", &["output", "versions_key_suffix"]),
    ("GOSH_OUTPUT_ARTIFACTS_KEY_SUFFIX", &["output", "artifacts_key_suffix"]),
];

/// Loaded gosh configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The deployment repository.
    #[serde(alias = "deploymentrepository", alias = "deployment_repository")]
    pub repository: RepositoryConfig,

    /// Git credentials.
    pub auth: Option<AuthConfig>,

    /// URL tables used to resolve `[gosh:repo:<type>]` placeholders.
    #[serde(alias = "artifactrepositories")]
    pub artifact_repositories: ArtifactRepositories,

    /// Settings for `gosh list`.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Remote URL the working directory must be a clone of.
    pub url: Option<String>,
    /// Legacy SSH key setting, used when `auth` is not configured.
    #[serde(alias = "sshkey")]
    pub ssh_key: Option<String>,
    /// Legacy base64 passphrase for `ssh_key`.
    #[serde(alias = "sshprivatekeypass")]
    pub ssh_private_key_pass: Option<String>,
}

/// How gosh authenticates against the deployment repository remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    Basic,
    Ssh,
}

impl FromStr for AuthType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(AuthType::Basic),
            "ssh" => Ok(AuthType::Ssh),
            other => Err(Error::Config {
                message: format!("unsupported git auth type '{}'", other),
                hint: Some("use auth.type 'basic' or 'ssh'".to_string()),
            }),
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthType::Basic => f.write_str("basic"),
            AuthType::Ssh => f.write_str("ssh"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(rename = "type")]
    pub auth_type: String,
    pub user: Option<String>,
    /// Base64 encoded password or token.
    pub pass: Option<String>,
    #[serde(alias = "privatekeyfile")]
    pub private_key_file: Option<String>,
    /// Base64 encoded key passphrase.
    #[serde(alias = "privatekeypass")]
    pub private_key_pass: Option<String>,
}

impl AuthConfig {
    pub fn kind(&self) -> Result<AuthType> {
        self.auth_type.parse()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format used by `gosh list` when `--output` is not given.
    #[serde(alias = "defaultformat")]
    pub default_format: Option<String>,
    #[serde(alias = "versionskeysuffix")]
    pub versions_key_suffix: String,
    #[serde(alias = "artifactskeysuffix")]
    pub artifacts_key_suffix: String,
}

impl Config {
    /// Load the configuration for `working_dir` from the home directory,
    /// the project and the process environment.
    pub fn load(working_dir: &Path) -> Result<Self> {
        let home_file = defaults::home_config_file();
        let project_file = defaults::project_config_file(working_dir);
        Self::from_sources(home_file.as_deref(), Some(&project_file), &|key| {
            std::env::var(key).ok()
        })
    }

    /// Load from explicit files and an environment lookup.
    ///
    /// Missing files are skipped.
    pub fn from_sources(
        home_file: Option<&Path>,
        project_file: Option<&Path>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut merged = Value::Mapping(Mapping::new());
        for file in [home_file, project_file].into_iter().flatten() {
            if let Some(value) = read_config_file(file)? {
                merge_values(&mut merged, &value);
            }
        }
        for (var, path) in ENV_OVERRIDES {
            if let Some(value) = env(var) {
                trace!("Configuration override from {}", var);
                set_path(&mut merged, path, Value::String(value));
            }
        }

        let mut config: Config = serde_yaml::from_value(merged).map_err(|e| Error::Config {
            message: format!("invalid configuration: {}", e),
            hint: Some("run 'gosh config' to see the supported options".to_string()),
        })?;
        if let Some(auth) = &config.auth {
            auth.kind()?;
        }
        config.expand_paths(env);
        debug!("Loaded configuration {:?}", config.redacted());
        Ok(config)
    }

    /// The auth settings in effect: `auth`, else the legacy repository SSH key.
    pub fn effective_auth(&self) -> Option<AuthConfig> {
        if let Some(auth) = &self.auth {
            return Some(auth.clone());
        }
        self.repository.ssh_key.as_ref().map(|key| AuthConfig {
            auth_type: AuthType::Ssh.to_string(),
            private_key_file: Some(key.clone()),
            private_key_pass: self.repository.ssh_private_key_pass.clone(),
            ..AuthConfig::default()
        })
    }

    fn expand_paths(&mut self, env: &dyn Fn(&str) -> Option<String>) {
        if let Some(key) = self.repository.ssh_key.as_mut() {
            *key = expand_path(key, env);
        }
        if let Some(key) = self.auth.as_mut().and_then(|a| a.private_key_file.as_mut()) {
            *key = expand_path(key, env);
        }
    }

    fn redacted(&self) -> Self {
        let mut copy = self.clone();
        let mask = |s: &mut Option<String>| {
            if s.is_some() {
                *s = Some("***".to_string());
            }
        };
        mask(&mut copy.repository.ssh_private_key_pass);
        if let Some(auth) = copy.auth.as_mut() {
            mask(&mut auth.pass);
            mask(&mut auth.private_key_pass);
        }
        copy
    }
}

fn read_config_file(path: &Path) -> Result<Option<Value>> {
    if !path.is_file() {
        debug!("No configuration file at {}, skipping", path.display());
        return Ok(None);
    }
    debug!("Reading configuration {}", path.display());
    let content = fs::read_to_string(path).map_err(|source| Error::FileIo {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = serde_yaml::from_str(&content).map_err(|e| Error::Config {
        message: format!("could not parse {}: {}", path.display(), e),
        hint: None,
    })?;
    Ok(Some(lowercase_keys(value)))
}

fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .into_iter()
                .map(|(k, v)| {
                    let key = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (key, lowercase_keys(v))
                })
                .collect(),
        ),
        other => other,
    }
}

/// Recursively merge `source` into `target`; mappings merge key by key,
/// anything else in `source` replaces the target value.
pub fn merge_values(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Mapping(target_map), Value::Mapping(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(key) {
                    Some(existing) if existing.is_mapping() && value.is_mapping() => {
                        merge_values(existing, value);
                    }
                    _ => {
                        target_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

fn set_path(target: &mut Value, path: &[&str], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        *target = value;
        return;
    };
    if !target.is_mapping() {
        *target = Value::Mapping(Mapping::new());
    }
    if let Value::Mapping(map) = target {
        let entry = map
            .entry(Value::String(first.to_string()))
            .or_insert(Value::Null);
        set_path(entry, rest, value);
    }
}

/// `$VAR` or `${VAR}`.
static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("environment reference pattern is valid")
});

/// Expand a leading `~` and `$VAR` / `${VAR}` references.
///
/// Unknown variables expand to an empty string.
pub fn expand_path(path: &str, env: &dyn Fn(&str) -> Option<String>) -> String {
    let expanded = ENV_REFERENCE
        .replace_all(path, |caps: &Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            env(name).unwrap_or_default()
        })
        .into_owned();
    if expanded == "~" || expanded.starts_with("~/") {
        if let Some(home) = env("HOME").map(PathBuf::from).or_else(dirs::home_dir) {
            return home.join(expanded.trim_start_matches('~').trim_start_matches('/')).display().to_string();
        }
    }
    expanded
}

/// The working directory: the flag value (already merged with
/// `GOSH_WORKING_DIR` by the CLI), else the current directory.
pub fn resolve_working_dir(flag: Option<&str>) -> Result<PathBuf> {
    match flag.map(str::trim).filter(|s| !s.is_empty()) {
        Some(dir) => Ok(PathBuf::from(expand_path(dir, &|key| std::env::var(key).ok()))),
        None => Ok(std::env::current_dir()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_no_sources_is_default() {
        let config = Config::from_sources(None, None, &env_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.effective_auth().is_none());
    }

    #[test]
    fn test_project_config_merges_over_home() {
        let dir = TempDir::new().unwrap();
        let home = write(
            &dir,
            "home.yml",
            r#"
auth:
  type: basic
  user: alice
  pass: c2VjcmV0
artifact_repositories:
  maven:
    default: https://repo.example/released
output:
  default_format: yaml
"#,
        );
        let project = write(
            &dir,
            "project.yml",
            r#"
artifact_repositories:
  maven:
    alpha: https://repo.example/tested
  docker:
    default: reg.example
output:
  default_format: properties
"#,
        );
        let config = Config::from_sources(Some(&home), Some(&project), &env_from(&[])).unwrap();
        assert_eq!(config.auth.as_ref().unwrap().user.as_deref(), Some("alice"));
        assert_eq!(config.artifact_repositories["maven"].len(), 2);
        assert_eq!(config.artifact_repositories["docker"]["default"], "reg.example");
        assert_eq!(config.output.default_format.as_deref(), Some("properties"));
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let file = write(
            &dir,
            "config.yml",
            r#"
Auth:
  Type: SSH
  Private_Key_File: /keys/id_rsa
ArtifactRepositories:
  maven:
    default: https://repo.example/released
    Alpha: https://repo.example/tested
Output:
  Versions_Key_Suffix: version
"#,
        );
        let config = Config::from_sources(Some(&file), None, &env_from(&[])).unwrap();
        let auth = config.auth.unwrap();
        assert_eq!(auth.kind().unwrap(), AuthType::Ssh);
        assert_eq!(auth.private_key_file.as_deref(), Some("/keys/id_rsa"));
        assert!(config.artifact_repositories["maven"].contains_key("alpha"));
        assert_eq!(config.output.versions_key_suffix, "version");
    }

    #[test]
    fn test_env_overrides_files() {
        let dir = TempDir::new().unwrap();
        let file = write(
            &dir,
            "config.yml",
            "repository:\n  url: https://old.example/deploy.git\n",
        );
        let env = env_from(&[
            ("GOSH_REPOSITORY_URL", "https://git.example/deploy.git"),
            ("GOSH_AUTH_TYPE", "basic"),
            ("GOSH_AUTH_USER", "bob"),
            ("GOSH_OUTPUT_ARTIFACTS_KEY_SUFFIX", "url"),
        ]);
        let config = Config::from_sources(Some(&file), None, &env).unwrap();
        assert_eq!(
            config.repository.url.as_deref(),
            Some("https://git.example/deploy.git")
        );
        assert_eq!(config.auth.unwrap().user.as_deref(), Some("bob"));
        assert_eq!(config.output.artifacts_key_suffix, "url");
    }

    #[test]
    fn test_unknown_auth_type_is_config_error() {
        let env = env_from(&[("GOSH_AUTH_TYPE", "kerberos")]);
        let err = Config::from_sources(None, None, &env).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(format!("{}", err).contains("kerberos"));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "config.yml", "auth: [unclosed");
        assert!(matches!(
            Config::from_sources(Some(&file), None, &env_from(&[])),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_legacy_repository_key_implies_ssh() {
        let dir = TempDir::new().unwrap();
        let file = write(
            &dir,
            "config.yml",
            "DeploymentRepository:\n  SshKey: ${KEYS}/id_rsa\n  SshPrivateKeyPass: cGFzcw==\n",
        );
        let env = env_from(&[("KEYS", "/secure")]);
        let config = Config::from_sources(Some(&file), None, &env).unwrap();
        let auth = config.effective_auth().unwrap();
        assert_eq!(auth.kind().unwrap(), AuthType::Ssh);
        assert_eq!(auth.private_key_file.as_deref(), Some("/secure/id_rsa"));
        assert_eq!(auth.private_key_pass.as_deref(), Some("cGFzcw=="));
    }

    #[test]
    fn test_expand_path() {
        let env = env_from(&[("HOME", "/home/dev"), ("KEY", "id_ed25519")]);
        assert_eq!(expand_path("~/.ssh/$KEY", &env), "/home/dev/.ssh/id_ed25519");
        assert_eq!(expand_path("/k/${KEY}.pub", &env), "/k/id_ed25519.pub");
        assert_eq!(expand_path("/k/$MISSING/x", &env), "/k//x");
        assert_eq!(expand_path("plain", &env), "plain");
    }

    #[test]
    fn test_merge_values_replaces_scalars_and_merges_maps() {
        let mut target: Value = serde_yaml::from_str("a:\n  b: 1\n  c: 2\nd: x\n").unwrap();
        let source: Value = serde_yaml::from_str("a:\n  c: 3\nd:\n  e: y\n").unwrap();
        merge_values(&mut target, &source);
        let expected: Value = serde_yaml::from_str("a:\n  b: 1\n  c: 3\nd:\n  e: y\n").unwrap();
        assert_eq!(target, expected);
    }

    #[test]
    #[serial]
    fn test_resolve_working_dir() {
        let dir = TempDir::new().unwrap();
        let flag = dir.path().display().to_string();
        assert_eq!(resolve_working_dir(Some(&flag)).unwrap(), dir.path());
        assert_eq!(
            resolve_working_dir(None).unwrap(),
            std::env::current_dir().unwrap()
        );
    }
}
