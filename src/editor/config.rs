use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::foundation::error::{StrataError, StrataResult};
use crate::text::raster::TextRasterOptions;
use crate::upload::coordinator::DEFAULT_DEBOUNCE;

/// Editor settings, loadable from JSON. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Study the layer configuration is saved under.
    pub study_id: String,
    /// Key of the interim draft snapshot.
    pub draft_key: String,
    /// Single-file upload debounce window in milliseconds.
    pub debounce_ms: u64,
    /// Text measuring and padding.
    pub text: TextRasterOptions,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            study_id: String::new(),
            draft_key: "layer-editor".to_string(),
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            text: TextRasterOptions::default(),
        }
    }
}

impl EditorConfig {
    /// Set the study id.
    pub fn with_study_id(mut self, study_id: impl Into<String>) -> Self {
        self.study_id = study_id.into();
        self
    }

    /// Set the draft snapshot key.
    pub fn with_draft_key(mut self, key: impl Into<String>) -> Self {
        self.draft_key = key.into();
        self
    }

    /// Set the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = debounce.as_millis() as u64;
        self
    }

    /// Set the text measuring options.
    pub fn with_text_options(mut self, text: TextRasterOptions) -> Self {
        self.text = text;
        self
    }

    /// Debounce window as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Parse from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> StrataResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| StrataError::validation(format!("parse editor config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> StrataResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            StrataError::validation(format!("open editor config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Reject settings the editor cannot run with.
    pub fn validate(&self) -> StrataResult<()> {
        if self.draft_key.trim().is_empty() {
            return Err(StrataError::validation("draft_key must not be empty"));
        }
        let t = &self.text;
        if !t.max_offscreen_px.is_finite() || t.max_offscreen_px < 1.0 {
            return Err(StrataError::validation("text.max_offscreen_px must be >= 1"));
        }
        if !(t.background_padding_x_em >= 0.0 && t.background_padding_y_em >= 0.0) {
            return Err(StrataError::validation("text padding must be >= 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/config.rs"]
mod tests;
