use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use dirs::home_dir;
use log::error;
use serde::{Deserialize, Serialize};

const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// What a single locator widget shows. All fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorConfig {
  /// The feature layer endpoint, e.g. `https://host/arcgis/rest/services/X/FeatureServer/0`
  /// or `file://features.geojson`.
  pub query_url: String,
  /// Widget label.
  pub label: String,
  /// Attribute identifying a feature.
  pub id_field: String,
  /// Attribute shown in the list.
  pub label_field: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("cannot read {path}: {source}")]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("invalid config {path}: {source}")]
  Parse {
    path: PathBuf,
    source: serde_json::Error,
  },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
  pub config_path: Option<PathBuf>,
  #[serde(default)]
  pub locators: Vec<LocatorConfig>,
  #[serde(default)]
  pub query_timeout_secs: Option<u64>,
}

impl Config {
  /// Environment first, then the config file, then defaults.
  #[must_use]
  pub fn new() -> Self {
    let from_env = Self::from_env();
    let from_file = Self::from_file();
    let default = Self::default_paths();

    let mut merged = from_env;
    if let Some(from_file) = &from_file {
      merged = merged.merge(from_file);
    }
    merged = merged.merge(&default);

    if merged.config_path.is_some() && from_file.is_none() {
      merged.init_cfg_file();
    }

    merged
  }

  #[must_use]
  pub fn query_timeout(&self) -> Duration {
    Duration::from_secs(
      self
        .query_timeout_secs
        .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS),
    )
  }

  fn from_env() -> Self {
    let config_path = std::env::var("LAYER_LOCATOR_CONFIG")
      .ok()
      .map(PathBuf::from);

    let var = |name: &str| std::env::var(format!("LAYER_LOCATOR_{name}")).ok();
    let locators = match (
      var("URL"),
      var("LABEL"),
      var("ID_FIELD"),
      var("LABEL_FIELD"),
    ) {
      (Some(query_url), Some(label), Some(id_field), Some(label_field)) => vec![LocatorConfig {
        query_url,
        label,
        id_field,
        label_field,
      }],
      (Some(url), ..) => {
        error!(
          "LAYER_LOCATOR_URL={url} needs LAYER_LOCATOR_LABEL, LAYER_LOCATOR_ID_FIELD and LAYER_LOCATOR_LABEL_FIELD"
        );
        Vec::new()
      }
      _ => Vec::new(),
    };

    let query_timeout_secs = var("TIMEOUT_SECS").and_then(|v| {
      v.parse()
        .inspect_err(|e| error!("Invalid LAYER_LOCATOR_TIMEOUT_SECS '{v}': {e}"))
        .ok()
    });

    Self {
      config_path,
      locators,
      query_timeout_secs,
    }
  }

  /// Values already set win, locators are appended without duplicates.
  #[must_use]
  pub fn merge(mut self, other: &Self) -> Self {
    self.config_path = self.config_path.or(other.config_path.clone());
    for locator in &other.locators {
      if !self.locators.contains(locator) {
        self.locators.push(locator.clone());
      }
    }
    self.query_timeout_secs = self.query_timeout_secs.or(other.query_timeout_secs);
    self
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  fn from_file() -> Option<Self> {
    let config_path = std::env::var("LAYER_LOCATOR_CONFIG")
      .ok()
      .map(PathBuf::from)
      .or_else(|| home_dir().map(|p| p.join(".config").join("layer-locator")))?;
    let config_path = config_path.join("config.json");
    if !config_path.exists() {
      return None;
    }

    Self::load(&config_path)
      .inspect_err(|e| error!("Failed to read config file: {e}"))
      .ok()
  }

  fn default_paths() -> Self {
    Self {
      config_path: home_dir().map(|p| p.join(".config").join("layer-locator")),
      ..Self::default()
    }
  }

  fn init_cfg_file(&self) {
    if let Some(path) = &self.config_path {
      if !path.exists() {
        let _ = std::fs::create_dir_all(path).inspect_err(|e| {
          error!("Failed to create config directory: {e}");
        });
      }

      let path = path.join("config.json");
      if !path.exists() {
        let config = serde_json::to_string_pretty(self);
        if let Ok(config) = config {
          let _ = std::fs::write(path, config).inspect_err(|e| {
            error!("Failed to write config file: {e}");
          });
        } else {
          error!("Failed to serialize config");
        }
      }
    }
  }
}
