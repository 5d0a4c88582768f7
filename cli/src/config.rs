use std::path::{Path, PathBuf};

use serde::Deserialize;

use gritbook::Options;

/// Looked up next to the input file when `--config` is not given.
pub const CONFIG_FILE: &str = "gritbook.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub translate: TranslateConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslateConfig {
    /// Treat unknown tags as errors.
    #[serde(default)]
    pub strict: Option<bool>,

    /// Prefix of thumbnail file names. Defaults to `thumb_`.
    #[serde(default)]
    pub thumbnail_prefix: Option<String>,

    /// Image directory, relative to the input file's directory.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
}

/// Command-line values that win over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub strict: bool,
    pub base_dir: Option<PathBuf>,
}

impl Config {
    /// Read `explicit`, or `gritbook.toml` in `input_dir` if it exists.
    pub fn load(explicit: Option<&Path>, input_dir: &Path) -> Result<Config, String> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = input_dir.join(CONFIG_FILE);
                if !candidate.is_file() {
                    return Ok(Config::default());
                }
                candidate
            }
        };

        tracing::debug!(path = %path.display(), "loading config");
        let text = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        toml::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn options(&self, input_dir: &Path, overrides: &Overrides) -> Options {
        let defaults = Options::default();
        let base_dir = match (&overrides.base_dir, &self.translate.base_dir) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) => input_dir.join(dir),
            (None, None) => input_dir.to_path_buf(),
        };

        Options {
            base_dir,
            thumbnail_prefix: self
                .translate
                .thumbnail_prefix
                .clone()
                .unwrap_or(defaults.thumbnail_prefix),
            strict: overrides.strict || self.translate.strict.unwrap_or(defaults.strict),
        }
    }
}
