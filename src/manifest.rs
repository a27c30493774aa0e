//! JSON module manifests.
//!
//! A manifest describes a module's imported and local globals and the host
//! numbers its imports resolve to:
//!
//! ```json
//! {
//!   "name": "demo",
//!   "imports": [{ "module": "env", "name": "base", "type": "f64" }],
//!   "globals": [
//!     { "type": "i32", "export": "i32", "init": 4711 },
//!     { "type": "f64", "export": "copy", "init_global": 0 }
//!   ],
//!   "host": { "env.base": 0.5 }
//! }
//! ```
//!
//! Host keys are `<module>.<name>`; the module part ends at the first `.`.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::builder::{BuildError, ModuleBuilder};
use crate::parser::module::ValueType;
use crate::runtime::ImportObject;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown value type \"{0}\"")]
    UnknownType(String),
    #[error("global {0} sets both init and init_global")]
    ConflictingInit(usize),
    #[error("host key \"{0}\" is not of the form <module>.<name>")]
    HostKey(String),
    #[error(transparent)]
    Build(#[from] BuildError),
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub imports: Vec<ImportEntry>,
    #[serde(default)]
    pub globals: Vec<GlobalEntry>,
    #[serde(default)]
    pub host: BTreeMap<String, f64>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ImportEntry {
    pub module: String,
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: String,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct GlobalEntry {
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default)]
    pub mutable: bool,
    #[serde(default)]
    pub export: Option<String>,
    #[serde(default)]
    pub init: Option<f64>,
    #[serde(default)]
    pub init_global: Option<u32>,
}

fn value_type(name: &str) -> Result<ValueType, ManifestError> {
    ValueType::from_name(name).ok_or_else(|| ManifestError::UnknownType(name.to_string()))
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replays the manifest's declarations on a fresh builder.
    pub fn to_builder(&self) -> Result<ModuleBuilder, ManifestError> {
        let mut builder = match &self.name {
            Some(name) => ModuleBuilder::with_name(name),
            None => ModuleBuilder::new(),
        };

        for import in &self.imports {
            builder.add_imported_global(&import.module, &import.name, value_type(&import.value_type)?)?;
        }

        for (i, entry) in self.globals.iter().enumerate() {
            let mut global = builder.add_global(value_type(&entry.value_type)?, entry.mutable);
            global = match (entry.init, entry.init_global) {
                (Some(_), Some(_)) => return Err(ManifestError::ConflictingInit(i)),
                (Some(n), None) => global.init(n),
                (None, Some(index)) => global.init_from_global(index),
                (None, None) => global,
            };
            if let Some(name) = &entry.export {
                global.export_as(name);
            }
        }

        Ok(builder)
    }

    pub fn import_object(&self) -> Result<ImportObject, ManifestError> {
        let mut imports = ImportObject::new();
        for (key, value) in &self.host {
            let (module, name) = key
                .split_once('.')
                .ok_or_else(|| ManifestError::HostKey(key.clone()))?;
            imports.add_global(module, name, *value);
        }
        Ok(imports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = r#"{
        "name": "demo",
        "imports": [{ "module": "env", "name": "base", "type": "f64" }],
        "globals": [
            { "type": "i32", "export": "i32", "init": 4711 },
            { "type": "f64", "export": "copy", "init_global": 0 },
            { "type": "f32", "mutable": true }
        ],
        "host": { "env.base": 0.5 }
    }"#;

    #[test]
    fn demo_manifest_instantiates() {
        let manifest = Manifest::from_json(DEMO).unwrap();
        let builder = manifest.to_builder().unwrap();
        let instance = builder.instantiate_with(&manifest.import_object().unwrap()).unwrap();
        assert_eq!(instance.module_name(), "demo");
        assert_eq!(instance.exports(), vec![("i32", 4711.0), ("copy", 0.5)]);
    }

    #[test]
    fn bad_manifests() {
        assert!(matches!(Manifest::from_json("{\"globals\": 3}"), Err(ManifestError::Json(_))));
        assert!(matches!(Manifest::from_json("{\"extra\": 1}"), Err(ManifestError::Json(_))));

        let m = Manifest::from_json(r#"{"globals": [{"type": "v128"}]}"#).unwrap();
        assert!(matches!(m.to_builder(), Err(ManifestError::UnknownType(t)) if t == "v128"));

        let m = Manifest::from_json(r#"{"globals": [{"type": "i32", "init": 1, "init_global": 0}]}"#).unwrap();
        assert!(matches!(m.to_builder(), Err(ManifestError::ConflictingInit(0))));

        let m = Manifest::from_json(r#"{"host": {"nodot": 1}}"#).unwrap();
        assert!(matches!(m.import_object(), Err(ManifestError::HostKey(_))));
    }

    #[test]
    fn host_key_splits_at_first_dot() {
        let m = Manifest::from_json(r#"{"host": {"env.a.b": 2}}"#).unwrap();
        let imports = m.import_object().unwrap();
        assert_eq!(imports.get_global("env", "a.b"), Some(2.0));
    }
}
