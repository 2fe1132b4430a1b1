use crate::calc::StayRule;
use crate::data::persistence::Persistable;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub allowance_days: i64,
    pub window_days: i64,
    /// How long a notification stays on screen.
    pub toast_seconds: u64,
    /// `tracing` filter directive, overridden by `SCHENGEN_LOG`.
    pub log_filter: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        let rule = StayRule::default();
        AppSettings {
            allowance_days: rule.allowance_days,
            window_days: rule.window_days,
            toast_seconds: 4,
            log_filter: "info".to_string(),
        }
    }
}

/// Reads the `settings` key of config.yaml.
#[derive(Serialize, Deserialize, Default, Debug)]
struct SettingsWrapper {
    #[serde(default)]
    settings: AppSettings,
}

impl Persistable for SettingsWrapper {
    fn filename() -> &'static str {
        "config.yaml"
    }
    fn is_json() -> bool {
        false
    }
}

impl AppSettings {
    pub fn load_from(dir: &Path) -> Result<Self> {
        Ok(SettingsWrapper::load_from(dir)?.settings)
    }

    pub fn save_to(&self, dir: &Path) -> Result<()> {
        SettingsWrapper {
            settings: self.clone(),
        }
        .save_to(dir)
    }

    pub fn stay_rule(&self) -> StayRule {
        StayRule {
            allowance_days: self.allowance_days,
            window_days: self.window_days,
        }
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.toast_seconds)
    }
}
