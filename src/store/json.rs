//! File-backed store: one pretty-printed JSON file per conversation.
//!
//! Layout:
//! - <dir>/<conversation id>.json

use std::fs;
use std::path::PathBuf;

use crate::core::{ConversationId, ConversationState};
use crate::error::Result;

use super::StateStore;

pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            tracing::debug!("Created store directory: {}", dir.display());
        }
        Ok(Self { dir })
    }

    fn path_for(&self, id: ConversationId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, id: ConversationId) -> Result<Option<ConversationState>> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, id: ConversationId, state: &ConversationState) -> Result<()> {
        let path = self.path_for(id);
        let tmp = path.with_extension("json.tmp");

        // Write aside then rename, so readers never see half a file.
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!("Saved conversation {} to {}", id, path.display());
        Ok(())
    }

    fn delete(&self, id: ConversationId) -> Result<bool> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        tracing::debug!("Deleted conversation {}", id);
        Ok(true)
    }

    fn list(&self) -> Result<Vec<ConversationId>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                if let Some(id) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse::<ConversationId>().ok())
                {
                    ids.push(id);
                }
            }
        }

        ids.sort();
        Ok(ids)
    }
}
