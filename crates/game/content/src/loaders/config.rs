//! Simulation configuration loader.

use std::path::Path;

use sim_core::SimConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for simulation configuration from TOML files.
///
/// Missing keys keep their defaults, so a file only needs the values it
/// changes.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    pub fn load(path: &Path) -> LoadResult<SimConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<SimConfig> {
        let config: SimConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        if config.loop_limit == 0 {
            anyhow::bail!("loop_limit must be at least 1");
        }
        if config.despawn_margin_divisor <= 0 {
            anyhow::bail!(
                "despawn_margin_divisor must be positive, got {}",
                config.despawn_margin_divisor
            );
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::ZLevelMode;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = ConfigLoader::parse(
            r#"
            seed = 42
            z_levels = "stacked"
            autosave_turns = 600
            "#,
        )
        .expect("valid config");
        assert_eq!(config.seed, 42);
        assert_eq!(config.z_levels, ZLevelMode::Stacked);
        assert_eq!(config.autosave_turns, Some(600));
        assert_eq!(config.loop_limit, SimConfig::DEFAULT_LOOP_LIMIT);
        assert_eq!(config.despawn_margin(), 22);
    }

    #[test]
    fn zero_loop_limit_is_rejected() {
        let err = ConfigLoader::parse("loop_limit = 0").unwrap_err();
        assert!(err.to_string().contains("loop_limit"));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "scent_radius = 12\n").expect("write config");
        assert_eq!(ConfigLoader::load(&path).expect("load").scent_radius, 12);
        assert!(ConfigLoader::load(&dir.path().join("missing.toml")).is_err());
    }
}
