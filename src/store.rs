//! Roster provider and grouping sink backed by plain files.
//!
//! Classes live in one `classes.json` object keyed by class name. Groupings
//! are exported as rendered text.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::roster::{Roster, Student};

pub const CLASSES_FILE: &str = "classes.json";

/// Supplies the roster of a named class.
pub trait RosterSource {
    fn load_roster(&self, class: &str) -> Result<Roster, StoreError>;
}

/// Receives an exported grouping.
pub trait GroupingSink {
    fn save_grouping(&mut self, text: &str) -> Result<(), StoreError>;
}

/// Unknown keys (timestamps written by other tools) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClassRecord {
    name: String,
    #[serde(default)]
    students: Vec<Student>,
}

/// `classes.json` inside a data directory.
#[derive(Debug, Clone)]
pub struct JsonClassStore {
    path: PathBuf,
}

impl JsonClassStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        JsonClassStore {
            path: data_dir.as_ref().join(CLASSES_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Class names in sorted order. A missing file means no classes.
    pub fn class_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read_all()?.into_keys().collect())
    }

    /// Inserts or replaces a class.
    pub fn save_class(&self, class: &str, roster: &Roster) -> Result<(), StoreError> {
        let mut all = self.read_all()?;
        all.insert(
            class.to_string(),
            ClassRecord {
                name: class.to_string(),
                students: roster.students().to_vec(),
            },
        );
        self.write_all(&all)?;
        info!(class, students = roster.len(), "class saved");
        Ok(())
    }

    /// Adds an empty class and returns its trimmed name. An existing class
    /// of that name is left alone and reported as [`StoreError::ClassExists`].
    pub fn create_class(&self, name: &str) -> Result<String, StoreError> {
        let name = class_name(name)?;
        let mut all = self.read_all()?;
        if all.contains_key(&name) {
            return Err(StoreError::ClassExists(name));
        }
        all.insert(
            name.clone(),
            ClassRecord {
                name: name.clone(),
                students: Vec::new(),
            },
        );
        self.write_all(&all)?;
        info!(class = %name, "class created");
        Ok(name)
    }

    /// Copies `from` under a new name, which must not be taken yet.
    pub fn duplicate_class(&self, from: &str, to: &str) -> Result<String, StoreError> {
        let to = class_name(to)?;
        let mut all = self.read_all()?;
        let mut copy = all
            .get(from)
            .cloned()
            .ok_or_else(|| StoreError::ClassNotFound(from.to_string()))?;
        if all.contains_key(&to) {
            return Err(StoreError::ClassExists(to));
        }
        copy.name = to.clone();
        all.insert(to.clone(), copy);
        self.write_all(&all)?;
        info!(from, to = %to, "class duplicated");
        Ok(to)
    }

    /// Returns whether the class existed.
    pub fn delete_class(&self, class: &str) -> Result<bool, StoreError> {
        let mut all = self.read_all()?;
        let existed = all.remove(class).is_some();
        if existed {
            self.write_all(&all)?;
            info!(class, "class deleted");
        }
        Ok(existed)
    }

    fn read_all(&self) -> Result<BTreeMap<String, ClassRecord>, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no class file yet");
            return Ok(BTreeMap::new());
        }
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn write_all(&self, all: &BTreeMap<String, ClassRecord>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(all)?)?;
        Ok(())
    }
}

fn class_name(name: &str) -> Result<String, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::EmptyClassName);
    }
    Ok(name.to_string())
}

impl RosterSource for JsonClassStore {
    fn load_roster(&self, class: &str) -> Result<Roster, StoreError> {
        let record = self
            .read_all()?
            .remove(class)
            .ok_or_else(|| StoreError::ClassNotFound(class.to_string()))?;
        let roster = Roster::new(record.students).map_err(|source| StoreError::InvalidClass {
            class: class.to_string(),
            source,
        })?;
        debug!(class, students = roster.len(), "roster loaded");
        Ok(roster)
    }
}

/// Writes the exported text to a file, replacing it.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSink { path: path.into() }
    }
}

impl GroupingSink for FileSink {
    fn save_grouping(&mut self, text: &str) -> Result<(), StoreError> {
        fs::write(&self.path, text)?;
        info!(path = %self.path.display(), "grouping exported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::roster::Sex;

    fn roster() -> Roster {
        Roster::new(vec![
            Student::new("Ann", 90, Sex::F).unwrap(),
            Student::new("Bob", 70, Sex::M).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_save_and_load_class() {
        let dir = TempDir::new().unwrap();
        let store = JsonClassStore::new(dir.path().join("data"));

        store.save_class("7B", &roster()).unwrap();
        assert_eq!(store.load_roster("7B").unwrap(), roster());
        assert_eq!(store.class_names().unwrap(), vec!["7B".to_string()]);
    }

    #[test]
    fn test_missing_class() {
        let dir = TempDir::new().unwrap();
        let store = JsonClassStore::new(dir.path());
        assert!(matches!(
            store.load_roster("nope"),
            Err(StoreError::ClassNotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_invalid_class_data_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CLASSES_FILE),
            r#"{"9A": {"name": "9A", "students": [
                {"name": "Ann", "score": 90, "sex": "F"},
                {"name": "ann", "score": 80, "sex": "F"}
            ]}}"#,
        )
        .unwrap();
        let store = JsonClassStore::new(dir.path());
        assert!(matches!(
            store.load_roster("9A"),
            Err(StoreError::InvalidClass { .. })
        ));
    }

    #[test]
    fn test_delete_class() {
        let dir = TempDir::new().unwrap();
        let store = JsonClassStore::new(dir.path());
        store.save_class("7B", &roster()).unwrap();
        assert!(store.delete_class("7B").unwrap());
        assert!(!store.delete_class("7B").unwrap());
        assert!(store.class_names().unwrap().is_empty());
    }

    #[test]
    fn test_create_class() {
        let dir = TempDir::new().unwrap();
        let store = JsonClassStore::new(dir.path());

        assert_eq!(store.create_class("  8C ").unwrap(), "8C");
        assert!(store.load_roster("8C").unwrap().is_empty());
        assert!(matches!(
            store.create_class("8C"),
            Err(StoreError::ClassExists(name)) if name == "8C"
        ));
        assert!(matches!(store.create_class("   "), Err(StoreError::EmptyClassName)));
    }

    #[test]
    fn test_duplicate_class() {
        let dir = TempDir::new().unwrap();
        let store = JsonClassStore::new(dir.path());
        store.save_class("7B", &roster()).unwrap();

        store.duplicate_class("7B", "7B copy").unwrap();
        assert_eq!(store.load_roster("7B copy").unwrap(), roster());
        assert_eq!(store.class_names().unwrap(), vec!["7B", "7B copy"]);

        assert!(matches!(
            store.duplicate_class("7B", "7B copy"),
            Err(StoreError::ClassExists(_))
        ));
        assert!(matches!(
            store.duplicate_class("9Z", "9Y"),
            Err(StoreError::ClassNotFound(name)) if name == "9Z"
        ));
    }

    #[test]
    fn test_file_sink_writes_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("teams.txt");
        let mut sink = FileSink::new(&path);
        sink.save_grouping("Team 1\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "Team 1\n");
    }
}
