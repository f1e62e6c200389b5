//! Best-effort persistence of an unsaved diagram.
//!
//! Drafts capture the full editable state, including diagrams that could not
//! be submitted yet, in a compact binary encoding. Storage is allowed to be
//! full or to hand back garbage; both come back as recoverable [`DraftError`]s.

use crate::canvas::CanvasState;
use crate::error::DraftError;
use crate::geometry::Point;
use crate::model::{MagnetRef, NodeKind};
use ahash::AHashMap;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShapeSnapshot {
    pub kind: NodeKind,
    /// Normalized like the wire format.
    pub x: f64,
    pub y: f64,
}

/// A cable by shape position in the snapshot and magnet index.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CableSnapshot {
    pub source_shape: usize,
    pub source_index: usize,
    pub dest_shape: usize,
    pub dest_index: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CanvasSnapshot {
    pub shapes: Vec<ShapeSnapshot>,
    pub cables: Vec<CableSnapshot>,
}

impl CanvasSnapshot {
    pub fn capture(canvas: &CanvasState) -> Self {
        let (width, height) = (canvas.width(), canvas.height());
        let shapes = canvas
            .shapes()
            .map(|s| {
                let p = s.position.normalize(width, height);
                ShapeSnapshot {
                    kind: s.kind().clone(),
                    x: p.x,
                    y: p.y,
                }
            })
            .collect();
        let cables = canvas
            .connectors()
            .filter_map(|c| {
                Some(CableSnapshot {
                    source_shape: canvas.z_index(c.source.shape)?,
                    source_index: c.source.index,
                    dest_shape: canvas.z_index(c.dest.shape)?,
                    dest_index: c.dest.index,
                })
            })
            .collect();
        Self { shapes, cables }
    }

    /// Replaces the canvas contents with the snapshot. The canvas is untouched on error.
    pub fn restore_into(&self, canvas: &mut CanvasState) -> Result<(), DraftError> {
        let mut staged = canvas.clone();
        staged.clear();
        let (width, height) = (staged.width(), staged.height());

        let ids: Vec<_> = self
            .shapes
            .iter()
            .map(|s| {
                let position = Point::new(s.x, s.y).denormalize(width, height);
                staged.add_shape(s.kind.clone(), position)
            })
            .collect();

        for cable in &self.cables {
            let (Some(source), Some(dest)) = (ids.get(cable.source_shape), ids.get(cable.dest_shape))
            else {
                return Err(DraftError::InvalidSnapshot(format!(
                    "cable references shape {} or {} of {}",
                    cable.source_shape,
                    cable.dest_shape,
                    ids.len()
                )));
            };
            staged
                .connect(
                    MagnetRef::output(*source, cable.source_index),
                    MagnetRef::input(*dest, cable.dest_index),
                )
                .map_err(|e| DraftError::InvalidSnapshot(e.to_string()))?;
        }

        *canvas = staged;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DraftError> {
        encode_to_vec(self, standard())
            .map_err(|e| DraftError::InvalidSnapshot(format!("Serialization failed: {}", e)))
    }

    pub fn from_bytes(key: &str, bytes: &[u8]) -> Result<Self, DraftError> {
        decode_from_slice(bytes, standard())
            .map(|(snapshot, _)| snapshot)
            .map_err(|e| DraftError::Corrupted {
                key: key.to_string(),
                message: e.to_string(),
            })
    }
}

/// Somewhere drafts can be kept, e.g. browser storage or a directory.
pub trait DraftStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, DraftError>;
    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), DraftError>;
    fn remove(&mut self, key: &str) -> Result<(), DraftError>;
}

/// In-memory storage with a total byte quota, like a browser's local storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: AHashMap<String, Vec<u8>>,
    quota: usize,
}

impl MemoryStorage {
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: AHashMap::new(),
            quota,
        }
    }

    pub fn used(&self) -> usize {
        self.entries.values().map(|v| v.len()).sum()
    }

    /// Overwrites an entry without any checks, for simulating foreign writes.
    pub fn insert_raw(&mut self, key: &str, bytes: Vec<u8>) {
        self.entries.insert(key.to_string(), bytes);
    }
}

impl DraftStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, DraftError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), DraftError> {
        let others = self.used() - self.entries.get(key).map_or(0, |v| v.len());
        if others + bytes.len() > self.quota {
            return Err(DraftError::QuotaExceeded {
                size: bytes.len(),
                quota: self.quota.saturating_sub(others),
            });
        }
        self.entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), DraftError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per draft inside a directory.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
    max_file_size: Option<usize>,
}

impl DirectoryStorage {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, DraftError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            DraftError::Io(format!("Could not create '{}': {}", root.display(), e))
        })?;
        Ok(Self {
            root,
            max_file_size: None,
        })
    }

    pub fn with_max_file_size(mut self, bytes: usize) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(format!("{}.draft", file))
    }
}

impl DraftStorage for DirectoryStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, DraftError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read(&path)
            .map(Some)
            .map_err(|e| DraftError::Io(format!("Could not read '{}': {}", path.display(), e)))
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), DraftError> {
        if let Some(quota) = self.max_file_size {
            if bytes.len() > quota {
                return Err(DraftError::QuotaExceeded {
                    size: bytes.len(),
                    quota,
                });
            }
        }
        let path = self.path_for(key);
        fs::write(&path, bytes)
            .map_err(|e| DraftError::Io(format!("Could not write '{}': {}", path.display(), e)))
    }

    fn remove(&mut self, key: &str) -> Result<(), DraftError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DraftError::Io(format!(
                "Could not remove '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}

pub struct DraftStore<S: DraftStorage> {
    storage: S,
}

impl<S: DraftStorage> DraftStore<S> {
    const PREFIX: &'static str = "drydock-draft-";

    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn key(name: &str) -> String {
        format!("{}{}", Self::PREFIX, name)
    }

    /// Stores a snapshot of the canvas. Returns the encoded size.
    pub fn save(&mut self, name: &str, canvas: &CanvasState) -> Result<usize, DraftError> {
        let bytes = CanvasSnapshot::capture(canvas).to_bytes()?;
        match self.storage.write(&Self::key(name), &bytes) {
            Ok(()) => {
                info!("Saved draft '{}' ({} bytes)", name, bytes.len());
                Ok(bytes.len())
            }
            Err(e) => {
                warn!("Could not save draft '{}': {}", name, e);
                Err(e)
            }
        }
    }

    /// Restores a draft into the canvas. `Ok(false)` when there is none.
    pub fn restore(&self, name: &str, canvas: &mut CanvasState) -> Result<bool, DraftError> {
        let key = Self::key(name);
        let Some(bytes) = self.storage.read(&key)? else {
            return Ok(false);
        };
        let snapshot = CanvasSnapshot::from_bytes(&key, &bytes).inspect_err(|e| {
            warn!("Discarding unreadable draft '{}': {}", name, e);
        })?;
        snapshot.restore_into(canvas)?;
        info!("Restored draft '{}'", name);
        Ok(true)
    }

    pub fn discard(&mut self, name: &str) -> Result<(), DraftError> {
        self.storage.remove(&Self::key(name))
    }
}
