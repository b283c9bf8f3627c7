//! Runner configuration loaded from `config.toml`.

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

/// What to print once the script has finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Values,
    Texts,
    None,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "values" => Ok(OutputMode::Values),
            "texts" => Ok(OutputMode::Texts),
            "none" => Ok(OutputMode::None),
            other => Err(format!(
                "Unknown output mode '{}' (expected values, texts or none)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub output: OutputMode,
    pub stop_on_error: bool,
}

/// Load the config from `config_file`, or from the user config dir.
///
/// Never fails: problems are returned as warnings and defaults are used.
pub fn load_config(config_file: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let Some(path) = config_file.map(Path::to_path_buf).or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => match parse_config(&content) {
                Ok(config) => return (config, warnings),
                Err(err) => warnings.push(format!("Failed to parse {}: {}", path.display(), err)),
            },
            Err(err) => warnings.push(format!("Failed to read {}: {}", path.display(), err)),
        },
        Err(err) => warnings.push(format!(
            "Failed to read metadata for {}: {}",
            path.display(),
            err
        )),
    }

    (Config::default(), warnings)
}

pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(content)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "cellgraph")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}
