use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const API_URL_ENV: &str = "ATLAS_API_URL";

/// How dates and date-times are shown in record lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayOptions {
    pub date_format: String,
    pub datetime_format: String,
    /// Offset applied before formatting, in minutes east of UTC.
    pub utc_offset_minutes: i32,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            date_format: "%Y-%m-%d".into(),
            datetime_format: "%Y-%m-%d %H:%M".into(),
            utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub default_page_size: u32,
    pub page_size_options: Vec<u32>,
    pub plan_record_limit: u64,
    /// File backing the session token and workspace id. `None` keeps them in memory.
    pub storage_path: Option<PathBuf>,
    pub display: DisplayOptions,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.into(),
            request_timeout_secs: 30,
            default_page_size: 10,
            page_size_options: vec![10, 20, 50],
            plan_record_limit: 500,
            storage_path: None,
            display: DisplayOptions::default(),
        }
    }
}

impl ClientSettings {
    /// Applies `ATLAS_API_URL` on top of whatever was loaded.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.api_base_url = url.to_string();
            }
        }
        self
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<ClientSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings at {}: {}", path.display(), err);
                ClientSettings::default()
            })
        } else {
            ClientSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> ClientSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, settings: ClientSettings) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &ClientSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
