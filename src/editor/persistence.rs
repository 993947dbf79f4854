//! Persistence boundaries: the layer configuration handed to the study backend, and interim
//! draft snapshots of the whole editing session.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::core::{ImageId, LayerId, RemoteRef, Size};
use crate::foundation::error::{StrataError, StrataResult};
use crate::geometry::fit::PercentRect;
use crate::layers::model::{CapturedSize, LayerKind, SourceKind};
use crate::layers::store::LayerStore;
use crate::text::style::TextStyle;

/// Background entry of a [`LayerConfiguration`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BackgroundRecord {
    /// Durable reference.
    pub remote: Option<RemoteRef>,
    /// File name shown to the designer.
    pub display_name: String,
    /// Intrinsic pixel size.
    pub intrinsic_size: Option<Size>,
}

/// Image entry of a [`LayerRecord`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageRecord {
    /// Image id.
    pub id: ImageId,
    /// Display name.
    pub name: String,
    /// Upload or text capture.
    pub source_kind: SourceKind,
    /// Durable reference.
    pub remote: Option<RemoteRef>,
    /// Style record (text images).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
    /// Captured pixel size (text images).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_size: Option<CapturedSize>,
}

/// Layer entry of a [`LayerConfiguration`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerRecord {
    /// Layer id.
    pub id: LayerId,
    /// Unique name.
    pub name: String,
    /// Free text.
    pub description: String,
    /// Stack position.
    pub z_index: u32,
    /// Derived kind.
    #[serde(rename = "type")]
    pub kind: LayerKind,
    /// Visibility.
    pub visible: bool,
    /// Percent placement.
    pub transform: PercentRect,
    /// Image of the layer shown on the canvas.
    pub active_image: Option<ImageId>,
    /// Image variants.
    pub images: Vec<ImageRecord>,
}

/// What the study backend stores for the layer editor.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerConfiguration {
    /// Background, if set.
    pub background: Option<BackgroundRecord>,
    /// Layers in z-order.
    pub layers: Vec<LayerRecord>,
}

impl LayerConfiguration {
    /// Build the payload from the current store.
    pub fn from_store(store: &LayerStore) -> Self {
        Self {
            background: store.background().map(|bg| BackgroundRecord {
                remote: bg.remote.clone(),
                display_name: bg.display_name.clone(),
                intrinsic_size: bg.intrinsic_size,
            }),
            layers: store
                .layers()
                .iter()
                .map(|l| LayerRecord {
                    id: l.id,
                    name: l.name.clone(),
                    description: l.description.clone(),
                    z_index: l.z_index,
                    kind: l.kind(),
                    visible: l.visible,
                    transform: l.transform,
                    active_image: l.active_image,
                    images: l
                        .images
                        .iter()
                        .map(|i| ImageRecord {
                            id: i.id,
                            name: i.name.clone(),
                            source_kind: i.source_kind,
                            remote: i.remote.clone(),
                            style: i.style.clone(),
                            captured_size: i.captured_size,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Study backend boundary.
pub trait PersistenceBridge {
    /// Store the layer configuration of `study_id`.
    fn save_layer_configuration(
        &mut self,
        study_id: &str,
        config: &LayerConfiguration,
    ) -> StrataResult<()>;
}

/// In-memory [`PersistenceBridge`] that records every save.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    saves: Vec<(String, LayerConfiguration)>,
    fail_next: usize,
}

impl MemoryPersistence {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `n` saves.
    pub fn fail_next(&mut self, n: usize) {
        self.fail_next = n;
    }

    /// Every accepted save in order.
    pub fn saves(&self) -> &[(String, LayerConfiguration)] {
        &self.saves
    }

    /// The most recent accepted save.
    pub fn last(&self) -> Option<&LayerConfiguration> {
        self.saves.last().map(|(_, c)| c)
    }
}

impl PersistenceBridge for MemoryPersistence {
    fn save_layer_configuration(
        &mut self,
        study_id: &str,
        config: &LayerConfiguration,
    ) -> StrataResult<()> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(StrataError::persistence("backend rejected the layer configuration"));
        }
        self.saves.push((study_id.to_string(), config.clone()));
        Ok(())
    }
}

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Interim state of one editing session.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionSnapshot {
    /// Format version.
    pub version: u32,
    /// Study the session belongs to.
    pub study_id: String,
    /// Background and layers.
    pub store: LayerStore,
}

impl SessionSnapshot {
    /// Snapshot `store` for `study_id`.
    pub fn new(study_id: impl Into<String>, store: LayerStore) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            study_id: study_id.into(),
            store,
        }
    }

    /// Parse from a JSON reader, rejecting unknown versions.
    pub fn from_reader<R: std::io::Read>(r: R) -> StrataResult<Self> {
        let snap: Self = serde_json::from_reader(r)
            .map_err(|e| StrataError::serde(format!("parse session snapshot JSON: {e}")))?;
        if snap.version != SNAPSHOT_VERSION {
            return Err(StrataError::validation(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snap.version
            )));
        }
        Ok(snap)
    }

    /// Parse from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> StrataResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .with_context(|| format!("open session snapshot '{}'", path.display()))?;
        Self::from_reader(BufReader::new(f))
    }
}

/// Interim draft storage, keyed by a draft-scope key.
pub trait DraftPersistence {
    /// Store `snapshot` under `key`, replacing what was there.
    fn save_draft(&mut self, key: &str, snapshot: &SessionSnapshot) -> StrataResult<()>;
    /// Load the snapshot under `key`, if any.
    fn load_draft(&self, key: &str) -> StrataResult<Option<SessionSnapshot>>;
    /// Forget the snapshot under `key`.
    fn clear_draft(&mut self, key: &str) -> StrataResult<()>;
}

/// In-memory [`DraftPersistence`].
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    drafts: HashMap<String, SessionSnapshot>,
    writes: usize,
}

impl MemoryDraftStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saves so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl DraftPersistence for MemoryDraftStore {
    fn save_draft(&mut self, key: &str, snapshot: &SessionSnapshot) -> StrataResult<()> {
        self.drafts.insert(key.to_string(), snapshot.clone());
        self.writes += 1;
        Ok(())
    }

    fn load_draft(&self, key: &str) -> StrataResult<Option<SessionSnapshot>> {
        Ok(self.drafts.get(key).cloned())
    }

    fn clear_draft(&mut self, key: &str) -> StrataResult<()> {
        self.drafts.remove(key);
        Ok(())
    }
}

/// [`DraftPersistence`] with one pretty-printed JSON file per key.
#[derive(Clone, Debug)]
pub struct JsonFileDraftStore {
    dir: PathBuf,
}

impl JsonFileDraftStore {
    /// Store drafts under `dir` (created on first save).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing `key`. Characters outside `[A-Za-z0-9_-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl DraftPersistence for JsonFileDraftStore {
    fn save_draft(&mut self, key: &str, snapshot: &SessionSnapshot) -> StrataResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create draft dir '{}'", self.dir.display()))?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(snapshot)?;
        std::fs::write(&tmp, json).with_context(|| format!("write '{}'", tmp.display()))?;
        std::fs::rename(&tmp, &path).with_context(|| format!("replace '{}'", path.display()))?;
        Ok(())
    }

    fn load_draft(&self, key: &str) -> StrataResult<Option<SessionSnapshot>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        SessionSnapshot::from_path(&path).map(Some)
    }

    fn clear_draft(&mut self, key: &str) -> StrataResult<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StrataError::persistence(format!(
                "remove '{}': {e}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/persistence.rs"]
mod tests;
