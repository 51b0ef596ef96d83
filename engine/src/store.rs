use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::encounter::Encounter;
use crate::persist;

/// Fixed key (file name) of the local encounter blob.
pub const STORE_FILE: &str = "encounter-state.json";

/// The single-slot local store read at startup and overwritten on export.
pub trait EncounterStore {
    fn load(&self) -> Result<Option<Encounter>>;
    fn save(&mut self, encounter: &Encounter) -> Result<()>;
}

/// Keeps the blob in a JSON file inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STORE_FILE)
    }
}

impl EncounterStore for FileStore {
    fn load(&self) -> Result<Option<Encounter>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read encounter store: {}", path.display()))?;
        let encounter = persist::from_json(&text)
            .with_context(|| format!("failed to parse encounter store: {}", path.display()))?;
        Ok(Some(encounter))
    }

    fn save(&mut self, encounter: &Encounter) -> Result<()> {
        let json = persist::to_json(encounter)?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create data dir: {}", self.dir.display()))?;
        let path = self.path();
        write_replacing(&path, &json)?;
        debug!(path = %path.display(), "encounter stored");
        Ok(())
    }
}

/// In-memory slot, for hosts without a filesystem and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blob: Option<String>,
}

impl MemoryStore {
    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl EncounterStore for MemoryStore {
    fn load(&self) -> Result<Option<Encounter>> {
        match &self.blob {
            Some(text) => Ok(Some(persist::from_json(text)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, encounter: &Encounter) -> Result<()> {
        self.blob = Some(persist::to_json(encounter)?);
        Ok(())
    }
}

/// `<name>_encounter.json`, lower-cased, with every character that is not
/// an ASCII letter or digit replaced by `_`.
pub fn export_file_name(name: &str) -> String {
    format!("{}_encounter.json", sanitize(name))
}

pub fn party_file_name(name: &str) -> String {
    format!("{}_party.json", sanitize(name))
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned
    }
}

/// Write the encounter file into `dir` and return its path.
pub fn write_export(dir: &Path, encounter: &Encounter) -> Result<PathBuf> {
    let path = dir.join(export_file_name(&encounter.name));
    write_replacing(&path, &persist::to_json(encounter)?)?;
    Ok(path)
}

pub fn write_party_export(dir: &Path, encounter: &Encounter) -> Result<PathBuf> {
    let path = dir.join(party_file_name(&encounter.name));
    write_replacing(&path, &persist::party_to_json(encounter)?)?;
    Ok(path)
}

// Write beside the target and rename, so a failed write leaves the old
// file intact.
fn write_replacing(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
