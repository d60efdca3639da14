use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::describe::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TEMPLATE, DIFF_PLACEHOLDER};

pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const OPENAI_TOKEN_VAR: &str = "OPENAI_TOKEN";
pub const OWNER_VAR: &str = "OWNER";
pub const REPO_VAR: &str = "REPO";

pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_SETTINGS_FILE: &str = ".pr-describer.toml";

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load env file {path}: {source}")]
    EnvFileLoad {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Failed to read settings file: {0}")]
    SettingsRead(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    SettingsParse(#[from] toml::de::Error),

    #[error("Prompt template must contain the {{diff}} placeholder")]
    InvalidTemplate,
}

/// Key/value lookup backing [`Config::from_env`].
///
/// Process environment variables take precedence over values read from an
/// env file, so a `.env` never shadows something already exported.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    process: bool,
    file_vars: HashMap<String, String>,
}

impl EnvSource {
    /// Lookups that consult the real process environment.
    pub fn process() -> Self {
        Self {
            process: true,
            file_vars: HashMap::new(),
        }
    }

    /// Lookups served only from the given pairs.
    #[cfg(test)]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            process: false,
            file_vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Layer the contents of a dotenv-style file underneath this source.
    ///
    /// A missing file is skipped unless `required` is set. Anything else that
    /// goes wrong while reading or parsing the file is an error.
    pub fn with_env_file(mut self, path: &Path, required: bool) -> Result<Self, ConfigError> {
        let load_err = |source: dotenvy::Error| ConfigError::EnvFileLoad {
            path: path.to_path_buf(),
            source,
        };

        let iter = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(err) if err.not_found() && !required => {
                debug!(path = %path.display(), "env file not found, skipping");
                return Ok(self);
            }
            Err(err) => return Err(load_err(err)),
        };

        for item in iter {
            let (key, value) = item.map_err(load_err)?;
            self.file_vars.entry(key).or_insert(value);
        }
        debug!(path = %path.display(), vars = self.file_vars.len(), "loaded env file");
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if self.process {
            if let Ok(value) = std::env::var(key) {
                return Some(value);
            }
        }
        self.file_vars.get(key).cloned()
    }
}

/// Everything a run needs, resolved up front.
///
/// The four environment-backed fields are kept as plain strings; an unset
/// variable becomes an empty string and is rejected later by client setup
/// (tokens) or by the GitHub API itself (owner/repo).
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub github_token: String,
    pub openai_token: String,
    pub owner: String,
    pub repo: String,
    pub settings: Settings,
}

impl Config {
    /// Load configuration from the process environment, an env file and the
    /// TOML settings file.
    ///
    /// `None` paths fall back to `.env` and `.pr-describer.toml` in the
    /// current directory, both of which may be absent. Explicit paths must
    /// exist.
    pub fn load(env_file: Option<&Path>, settings_file: Option<&Path>) -> Result<Config, ConfigError> {
        let env = match env_file {
            Some(path) => EnvSource::process().with_env_file(path, true)?,
            None => EnvSource::process().with_env_file(Path::new(DEFAULT_ENV_FILE), false)?,
        };
        let settings = Settings::load(settings_file)?;
        Ok(Self::from_env(&env, settings))
    }

    pub fn from_env(env: &EnvSource, settings: Settings) -> Config {
        let var = |key: &str| env.get(key).unwrap_or_default();
        Config {
            github_token: var(GITHUB_TOKEN_VAR),
            openai_token: var(OPENAI_TOKEN_VAR),
            owner: var(OWNER_VAR),
            repo: var(REPO_VAR),
            settings,
        }
    }
}

/// Optional tuning loaded from `.pr-describer.toml`.
/// All fields have defaults, the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub github: GitHubSettings,
    pub openai: OpenAiSettings,
    pub prompt: PromptSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    /// REST API root, override for GitHub Enterprise
    pub api_url: String,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    /// Base URL of an OpenAI-compatible API
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_OPENAI_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Instruction template, `{diff}` is replaced with the PR diff
    pub template: String,
    /// Cut the diff to this many characters before prompting. Unset sends it whole.
    pub max_diff_chars: Option<usize>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            max_diff_chars: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from `.pr-describer.toml` when it exists.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Path::new(DEFAULT_SETTINGS_FILE);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    Ok(Settings::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let settings = Self::parse(&contents)?;
        debug!(path = %path.display(), "loaded settings file");
        Ok(settings)
    }

    pub fn parse(contents: &str) -> Result<Settings, ConfigError> {
        let settings: Settings = toml::from_str(contents)?;
        if !settings.prompt.template.contains(DIFF_PLACEHOLDER) {
            return Err(ConfigError::InvalidTemplate);
        }
        Ok(settings)
    }
}
