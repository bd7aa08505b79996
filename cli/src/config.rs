use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use snapcal_core::analysis::{AnalysisFailureMode, DEFAULT_MODEL};

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug)]
pub struct Config {
    pub db_path: PathBuf,
    pub api_key: Option<String>,
    pub model: String,
    pub gemini_url: String,
    pub failure_mode: AnalysisFailureMode,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "snapcal").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Self::resolve(&data_dir, |name| std::env::var(name).ok())
    }

    /// Build the config from `data_dir` defaults plus overrides looked up by name.
    fn resolve(data_dir: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let db_path = var("SNAPCAL_DB_PATH")
            .map_or_else(|| data_dir.join("snapcal.db"), PathBuf::from);
        let api_key = var("GEMINI_API_KEY").or_else(|| var("API_KEY"));
        let model = var("SNAPCAL_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let gemini_url = var("SNAPCAL_GEMINI_URL").map_or_else(
            || DEFAULT_GEMINI_URL.to_string(),
            |u| u.trim_end_matches('/').to_string(),
        );
        let failure_mode = match var("SNAPCAL_ANALYSIS_ERRORS") {
            Some(mode) => mode.parse().context("Invalid SNAPCAL_ANALYSIS_ERRORS")?,
            None => AnalysisFailureMode::default(),
        };

        Ok(Config {
            db_path,
            api_key,
            model,
            gemini_url,
            failure_mode,
        })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) => Ok(key),
            None => bail!("No Gemini API key configured. Set GEMINI_API_KEY (or API_KEY)"),
        }
    }
}
