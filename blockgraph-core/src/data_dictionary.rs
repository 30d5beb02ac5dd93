use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use blockgraph_types::{DataType, Identifier, Value};

use crate::error::{ModelError, ModelResult};
use crate::library::{LibraryManager, ModelLibrary, StandardLibrary};

/// A named `Identifier -> Value` table, independent of any particular
/// [`crate::model::Model`] — a parameter sheet a UI or a batch job can swap
/// underneath a model without touching its block graph.
#[derive(Debug, Default, Clone)]
pub struct DataDictionary {
    values: HashMap<Identifier, Value>,
}

impl DataDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: Identifier, value: Value) {
        self.values.insert(id, value);
    }

    /// `None` on miss rather than an error — a dictionary is a sparse
    /// overlay, and "not set" is an ordinary outcome for a caller to handle.
    pub fn get(&self, id: &Identifier) -> Option<Value> {
        self.values.get(id).copied()
    }

    pub fn enumerate(&self) -> Vec<&Identifier> {
        let mut ids: Vec<&Identifier> = self.values.keys().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> ModelResult<()> {
        let file = DictFile::from_dictionary(self);
        let json = serde_json::to_string_pretty(&file).map_err(|e| ModelError::IoError(e.to_string()))?;
        fs::write(path, json).map_err(|e| ModelError::IoError(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> ModelResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| ModelError::IoError(e.to_string()))?;
        let file: DictFile = serde_json::from_str(&json).map_err(|e| ModelError::IoError(e.to_string()))?;
        file.into_dictionary()
    }
}

/// `{"value": "...", "dtype": "..."}`, the same per-entry shape
/// [`crate::model::Model`] uses for block parameters.
#[derive(Debug, Serialize, Deserialize)]
struct ValueFile {
    value: String,
    dtype: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ParametersFile {
    parameters: HashMap<String, ValueFile>,
}

/// `{"dict": {"parameters": {"<id>": {"value": ..., "dtype": ...}}}}`.
#[derive(Debug, Serialize, Deserialize)]
struct DictFile {
    dict: ParametersFile,
}

impl DictFile {
    fn from_dictionary(dict: &DataDictionary) -> Self {
        let mut parameters = HashMap::new();
        for (id, value) in &dict.values {
            parameters.insert(
                id.as_str().to_string(),
                ValueFile {
                    value: value.render(),
                    dtype: value.data_type().to_string(),
                },
            );
        }
        Self {
            dict: ParametersFile { parameters },
        }
    }

    fn into_dictionary(self) -> ModelResult<DataDictionary> {
        let mut dict = DataDictionary::new();
        for (id, vf) in self.dict.parameters {
            let dt: DataType = vf
                .dtype
                .parse()
                .map_err(|_| ModelError::UnsupportedType(vf.dtype.clone()))?;
            let value = Value::from_string(&vf.value, dt)?;
            dict.add(Identifier::new(&id)?, value);
        }
        Ok(dict)
    }
}

/// The process-wide registry: the block libraries every model compiles
/// against, plus whatever named [`DataDictionary`] instances an application
/// has loaded.
///
/// Library registration and dictionary registration share one failure mode
/// (`Duplicate` on name clash) and one lifetime — both live as long as the
/// manager itself, not scoped to any one model.
pub struct ModelManager {
    libraries: LibraryManager,
    dictionaries: HashMap<String, DataDictionary>,
}

impl ModelManager {
    /// A manager pre-seeded with the standard library and an empty model
    /// library, matching what every model needs to resolve its blocks.
    pub fn new() -> Self {
        let mut libraries = LibraryManager::new();
        libraries
            .register_library(Box::new(StandardLibrary::new()))
            .expect("fresh manager: stdlib cannot already be registered");
        libraries
            .register_library(Box::new(ModelLibrary::new()))
            .expect("fresh manager: model library cannot already be registered");
        Self {
            libraries,
            dictionaries: HashMap::new(),
        }
    }

    pub fn libraries(&self) -> &LibraryManager {
        &self.libraries
    }

    pub fn libraries_mut(&mut self) -> &mut LibraryManager {
        &mut self.libraries
    }

    /// Fails with [`ModelError::Duplicate`] if `name` is already registered.
    pub fn register_dictionary(&mut self, name: impl Into<String>, dict: DataDictionary) -> ModelResult<()> {
        let name = name.into();
        if self.dictionaries.contains_key(&name) {
            return Err(ModelError::Duplicate(format!("data dictionary '{name}'")));
        }
        self.dictionaries.insert(name, dict);
        Ok(())
    }

    pub fn deregister_dictionary(&mut self, name: &str) {
        self.dictionaries.remove(name);
    }

    pub fn get_dictionary(&self, name: &str) -> Option<&DataDictionary> {
        self.dictionaries.get(name)
    }

    pub fn get_dictionary_mut(&mut self, name: &str) -> Option<&mut DataDictionary> {
        self.dictionaries.get_mut(name)
    }

    pub fn dictionary_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.dictionaries.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_get_round_trip() {
        let mut dict = DataDictionary::new();
        let id = Identifier::new("gain").unwrap();
        dict.add(id.clone(), Value::F64(2.5));
        assert_eq!(dict.get(&id), Some(Value::F64(2.5)));
    }

    #[test]
    fn get_on_a_miss_is_none_not_an_error() {
        let dict = DataDictionary::new();
        let id = Identifier::new("missing").unwrap();
        assert_eq!(dict.get(&id), None);
    }

    #[test]
    fn enumerate_is_sorted() {
        let mut dict = DataDictionary::new();
        dict.add(Identifier::new("zeta").unwrap(), Value::F64(1.0));
        dict.add(Identifier::new("alpha").unwrap(), Value::Bool(true));
        let names: Vec<&str> = dict.enumerate().iter().map(|id| id.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn save_and_load_round_trip_through_json() {
        let mut dict = DataDictionary::new();
        dict.add(Identifier::new("gain").unwrap(), Value::F64(2.5));
        dict.add(Identifier::new("enabled").unwrap(), Value::Bool(true));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.json");
        dict.save_to(&path).unwrap();

        let loaded = DataDictionary::load(&path).unwrap();
        assert_eq!(loaded.get(&Identifier::new("gain").unwrap()), Some(Value::F64(2.5)));
        assert_eq!(loaded.get(&Identifier::new("enabled").unwrap()), Some(Value::Bool(true)));
    }

    #[test]
    fn model_manager_seeds_the_standard_library() {
        let manager = ModelManager::new();
        assert!(manager.libraries().has_block("stdlib", "Add"));
    }

    #[test]
    fn duplicate_dictionary_registration_is_rejected() {
        let mut manager = ModelManager::new();
        manager.register_dictionary("params", DataDictionary::new()).unwrap();
        assert!(matches!(
            manager.register_dictionary("params", DataDictionary::new()),
            Err(ModelError::Duplicate(_))
        ));
    }

    #[test]
    fn dictionary_names_are_sorted() {
        let mut manager = ModelManager::new();
        manager.register_dictionary("zeta", DataDictionary::new()).unwrap();
        manager.register_dictionary("alpha", DataDictionary::new()).unwrap();
        assert_eq!(manager.dictionary_names(), vec!["alpha", "zeta"]);
    }
}
