use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config/data directory.
pub const CONFIG_DIR_ENV: &str = "BOXREFINE_CONFIG_DIR";

/// Files whose presence in the working directory makes it the config dir.
const LOCAL_MARKERS: [&str; 2] = ["boxrefine.json", "boxrefine.log"];

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args -> ENV var (BOXREFINE_CONFIG_DIR) -> None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        Self { config_dir }
    }
}

/// Path to a configuration file.
///
/// Priority:
/// 1. CLI --config-dir argument
/// 2. BOXREFINE_CONFIG_DIR environment variable
/// 3. Working directory IF boxrefine.json or boxrefine.log exist there
/// 4. Platform config directory from dirs-next (`~/.config/boxrefine` on Linux)
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::config_dir()).join(name)
}

/// Path to a data file (logs, eframe storage). Same priority as
/// `config_file`, falling back to the platform data directory.
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::data_dir()).join(name)
}

/// Create config and data directories if missing.
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = resolve_dir(config, dirs_next::config_dir());
    let data_dir = resolve_dir(config, dirs_next::data_dir());
    for dir in [&config_dir, &data_dir] {
        if !dir.exists() {
            std::fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
    }
    Ok(())
}

fn has_local_config_files(dir: &Path) -> bool {
    LOCAL_MARKERS.iter().any(|f| dir.join(f).exists())
}

fn resolve_dir(config: &PathConfig, platform: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    if let Ok(current_dir) = std::env::current_dir()
        && has_local_config_files(&current_dir)
    {
        return current_dir;
    }
    platform.map(|d| d.join("boxrefine")).unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_with_custom_dir() {
        let config = PathConfig { config_dir: Some(PathBuf::from("/custom")) };
        assert_eq!(config_file("boxrefine.json", &config), PathBuf::from("/custom/boxrefine.json"));
        assert_eq!(data_file("boxrefine.log", &config), PathBuf::from("/custom/boxrefine.log"));
    }

    #[test]
    fn test_cli_wins_over_env() {
        let config = PathConfig::from_env_and_cli(Some(PathBuf::from("/from/cli")));
        assert_eq!(config.config_dir, Some(PathBuf::from("/from/cli")));
    }

    #[test]
    fn test_ensure_dirs_creates() {
        let dir = std::env::temp_dir().join(format!("boxrefine_paths_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let config = PathConfig { config_dir: Some(dir.clone()) };
        ensure_dirs(&config).expect("create dirs");
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
