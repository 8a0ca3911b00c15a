use crate::models::QrConfig;
use serde::{Deserialize, Serialize};

/// Host settings from `qrstudio.yaml`.
///
/// These are read-only inputs for a session: where logs and exported artifacts go, and the
/// configuration a new session starts from. The session configuration itself is never written
/// back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub logging: LoggingSettings,
    pub export: ExportSettings,
    pub defaults: QrConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub directory: String,
    pub prefix: String,
    pub debug: bool,
    pub console: bool,
    /// Write the log file as JSON lines instead of plain text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            prefix: "qrstudio".to_string(),
            debug: false,
            console: true,
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub directory: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            directory: "exports".to_string(),
        }
    }
}
