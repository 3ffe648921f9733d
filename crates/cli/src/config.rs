use anyhow::{Context, Result};
use feats_filter::FilterConfig;
use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "FEATS_CONFIG";
pub const CATALOG_ENV: &str = "FEATS_CATALOG";
const DEFAULT_CATALOG: &str = "feats.json";

/// Filter config plus the file it came from, if any
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub config: FilterConfig,
    pub path: Option<PathBuf>,
}

/// `--config`, then `FEATS_CONFIG`, then `<config_dir>/feats/config.toml` when
/// it exists, else built-in defaults. An explicitly named file must exist.
pub fn resolve_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let named = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

    let path = match named {
        Some(path) => path,
        None => match user_config_path().filter(|p| p.is_file()) {
            Some(path) => path,
            None => {
                log::debug!("no filter config found; using defaults");
                return Ok(ResolvedConfig::default());
            }
        },
    };

    let config = FilterConfig::from_path(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    log::debug!("filter config loaded from {}", path.display());
    Ok(ResolvedConfig {
        config,
        path: Some(path),
    })
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("feats").join("config.toml"))
}

/// `--catalog`, then `FEATS_CATALOG`, then `feats.json` in the working directory
pub fn resolve_catalog_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CATALOG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG))
}
