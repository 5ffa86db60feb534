use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DIRECTORY_NAME: &str = "Logs";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "directory", default)]
    pub directories: Vec<DirectoryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub name: String,
    pub path: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.normalize();

        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let toml = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, toml).with_context(|| format!("Failed to write config file: {}", path))?;
        Ok(())
    }

    pub fn load_or_create(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for directory in &self.directories {
            let root = Path::new(&directory.path);
            if !root.exists() {
                fs::create_dir_all(root).with_context(|| {
                    format!(
                        "Failed to create directory for '{}': {:?}",
                        directory.name, root
                    )
                })?;
            }
        }
        Ok(())
    }

    fn normalize(&mut self) {
        for directory in &mut self.directories {
            directory.name = directory.name.trim().to_string();
            directory.path = expand_env_vars(directory.path.trim());
        }
        self.directories
            .retain(|d| !d.name.is_empty() && !d.path.is_empty());

        if self.directories.is_empty() {
            self.directories = Self::default().directories;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            directories: vec![DirectoryConfig {
                name: DEFAULT_DIRECTORY_NAME.to_string(),
                path: default_root().to_string_lossy().into_owned(),
            }],
        }
    }
}

fn default_root() -> PathBuf {
    std::env::temp_dir().join("logjack-files")
}

/// Expands `{VAR}` references against the process environment. Unknown or
/// empty variables leave the reference in place verbatim.
fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        match rest[start + 1..].find('}') {
            Some(offset) => {
                let name = &rest[start + 1..start + 1 + offset];
                match std::env::var(name) {
                    Ok(value) if !value.is_empty() => out.push_str(&value),
                    _ => out.push_str(&rest[start..start + offset + 2]),
                }
                rest = &rest[start + offset + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}
