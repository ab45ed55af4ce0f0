//! Loading and validation of `parameters.yaml`.
//!
//! The file has four sections: `azure_devops` (service identity and
//! credentials), `file_paths` (plan and optional template documents),
//! `formatting` (markdown rendering toggle), and `environment` (which
//! values may be overridden from environment variables). All sections use
//! serde defaults so a partially-specified file deserializes cleanly;
//! validation afterwards reports every missing required value at once.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding the personal access token.
pub const PAT_ENV: &str = "AZURE_DEVOPS_PAT";
/// Environment variable overriding the plan file path.
pub const PLAN_FILE_ENV: &str = "PLAN_FILE";
/// Environment variable overriding the template file path.
pub const TEMPLATE_FILE_ENV: &str = "TEMPLATE_FILE";

/// Errors that can occur while loading run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parameters file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read parameters file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse parameters file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One or more required values are absent after env overrides.
    #[error("missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Azure DevOps service identity and credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AzureDevOpsConfig {
    /// Organization URL, e.g. `https://dev.azure.com/myorg`.
    #[serde(default)]
    pub organization_url: String,

    #[serde(default)]
    pub project: String,

    /// Area path applied to every created item unless a template sets one.
    #[serde(default)]
    pub area_path: String,

    /// Iteration path applied to every created item unless a template sets one.
    #[serde(default)]
    pub iteration_path: String,

    /// Personal access token with work item read/write scope.
    #[serde(default)]
    pub personal_access_token: String,
}

/// Input document locations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FilePathsConfig {
    /// The backlog plan document.
    #[serde(default)]
    pub plan_file: String,

    /// Optional template document; absent means built-in field mappings.
    #[serde(default)]
    pub template_file: Option<String>,
}

/// Output formatting options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FormattingConfig {
    /// Render markdown in rich-text fields (Description, Acceptance
    /// Criteria) to HTML before submission.
    #[serde(default)]
    pub enable_markdown: bool,
}

/// Which values may be overridden from the environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub use_env_for_pat: bool,

    #[serde(default)]
    pub use_env_for_plan_path: bool,

    #[serde(default)]
    pub use_env_for_template_path: bool,
}

/// The full run configuration, corresponding to `parameters.yaml`.
///
/// Loaded once before the run starts and treated as read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Parameters {
    #[serde(default)]
    pub azure_devops: AzureDevOpsConfig,

    #[serde(default)]
    pub file_paths: FilePathsConfig,

    #[serde(default)]
    pub formatting: FormattingConfig,

    #[serde(default)]
    pub environment: EnvironmentConfig,
}

impl Parameters {
    /// Parses parameters from YAML text. No overrides or validation.
    pub fn from_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies environment variable overrides via the given lookup.
    ///
    /// The PAT is taken from `AZURE_DEVOPS_PAT` when `use_env_for_pat` is
    /// set or the configured token is empty; plan and template paths are
    /// only overridden when explicitly enabled.
    pub fn apply_env_with(&mut self, get: impl Fn(&str) -> Option<String>) {
        let pat_missing = self.azure_devops.personal_access_token.trim().is_empty();
        if self.environment.use_env_for_pat || pat_missing {
            if let Some(pat) = get(PAT_ENV).filter(|v| !v.is_empty()) {
                self.azure_devops.personal_access_token = pat;
            }
        }
        if self.environment.use_env_for_plan_path {
            if let Some(path) = get(PLAN_FILE_ENV).filter(|v| !v.is_empty()) {
                self.file_paths.plan_file = path;
            }
        }
        if self.environment.use_env_for_template_path {
            if let Some(path) = get(TEMPLATE_FILE_ENV).filter(|v| !v.is_empty()) {
                self.file_paths.template_file = Some(path);
            }
        }
    }

    /// Applies environment variable overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Resolves relative plan/template paths against `base` (the directory
    /// containing the parameters file).
    pub fn resolve_paths(&mut self, base: &Path) {
        if !self.file_paths.plan_file.is_empty() {
            self.file_paths.plan_file = resolve(base, &self.file_paths.plan_file);
        }
        if let Some(ref template) = self.file_paths.template_file {
            self.file_paths.template_file = Some(resolve(base, template));
        }
    }

    /// Checks that every required value is present, reporting all missing
    /// keys at once.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("azure_devops.organization_url", &self.azure_devops.organization_url),
            ("azure_devops.project", &self.azure_devops.project),
            ("azure_devops.area_path", &self.azure_devops.area_path),
            ("azure_devops.iteration_path", &self.azure_devops.iteration_path),
            (
                "azure_devops.personal_access_token",
                &self.azure_devops.personal_access_token,
            ),
            ("file_paths.plan_file", &self.file_paths.plan_file),
        ];

        let missing: Vec<String> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(key, _)| (*key).to_owned())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingParameters(missing))
        }
    }

    /// The token with all but the last four characters masked, for display.
    pub fn masked_token(&self) -> String {
        let token = &self.azure_devops.personal_access_token;
        if token.len() <= 4 {
            "*".repeat(token.len())
        } else {
            format!("{}{}", "*".repeat(token.len() - 4), &token[token.len() - 4..])
        }
    }
}

fn resolve(base: &Path, path: &str) -> String {
    let p = Path::new(path);
    if p.is_absolute() {
        path.to_owned()
    } else {
        base.join(p).to_string_lossy().into_owned()
    }
}

/// Loads, overrides, resolves, and validates parameters from a file.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] when the file does not exist,
/// [`ConfigError::Parse`] on invalid YAML, and
/// [`ConfigError::MissingParameters`] listing every absent required value.
pub fn load_parameters(path: &Path) -> Result<Parameters> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let mut params = Parameters::from_str(&content)?;
    params.apply_env();
    if let Some(base) = path.parent() {
        params.resolve_paths(base);
    }
    params.validate()?;
    Ok(params)
}
