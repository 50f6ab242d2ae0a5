//! Architecture descriptions.
use crate::{ErrorKind, Result};
use serde_json::{self, Map as JsonMap, Value as JsonValue};
use std::io::Read;

/// A neural architecture whose modules and parameters can be enumerated.
pub trait Architecture {
    /// Returns the named modules of this architecture in enumeration order.
    ///
    /// The root module may be named `""`.
    fn named_modules(&self) -> Vec<ModuleRecord>;

    /// Returns the names of the learnable parameters in declaration order.
    fn parameter_names(&self) -> Vec<String>;
}

/// A named module and its textual configuration (e.g., `"Linear(in_features=10, out_features=10)"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRecord {
    /// Dotted module path.
    pub name: String,

    /// Module class and constructor arguments.
    pub descriptor: String,
}

/// An owned, read-only snapshot of an architecture.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArchSnapshot {
    modules: Vec<ModuleRecord>,
    parameters: Vec<String>,
}
impl ArchSnapshot {
    /// Makes a new empty `ArchSnapshot` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a module.
    pub fn module(mut self, name: &str, descriptor: &str) -> Self {
        self.modules.push(ModuleRecord {
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
        });
        self
    }

    /// Appends a parameter.
    pub fn parameter(mut self, name: &str) -> Self {
        self.parameters.push(name.to_owned());
        self
    }

    /// Deserializes an `ArchSnapshot` instance from the given JSON reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let json: JsonValue = track_invalid!(serde_json::from_reader(reader))?;
        track!(Self::from_json(&json))
    }

    /// Makes an `ArchSnapshot` instance from the given JSON value.
    ///
    /// The expected form is
    /// `{"modules": [{"name": "...", "descriptor": "..."}, ...], "parameters": ["...", ...]}`.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        let object = track_assert_some!(json.as_object(), ErrorKind::InvalidInput);

        let mut modules = Vec::new();
        if let Some(raw_modules) = object.get("modules") {
            let raw_modules = track_assert_some!(
                raw_modules.as_array(),
                ErrorKind::InvalidInput,
                "`modules` must be an array"
            );
            for m in raw_modules {
                let name = track_assert_some!(
                    m.get("name").and_then(JsonValue::as_str),
                    ErrorKind::InvalidInput,
                    "Module without name: {}",
                    m
                );
                let descriptor = track_assert_some!(
                    m.get("descriptor").and_then(JsonValue::as_str),
                    ErrorKind::InvalidInput,
                    "Module without descriptor: {}",
                    m
                );
                modules.push(ModuleRecord {
                    name: name.to_owned(),
                    descriptor: descriptor.to_owned(),
                });
            }
        }

        let raw_parameters = track_assert_some!(
            object.get("parameters").and_then(JsonValue::as_array),
            ErrorKind::InvalidInput,
            "`parameters` array is required"
        );
        let mut parameters = Vec::with_capacity(raw_parameters.len());
        for p in raw_parameters {
            let name = track_assert_some!(
                p.as_str(),
                ErrorKind::InvalidInput,
                "Parameter name must be a string: {}",
                p
            );
            parameters.push(name.to_owned());
        }

        Ok(Self {
            modules,
            parameters,
        })
    }
}
impl Architecture for ArchSnapshot {
    fn named_modules(&self) -> Vec<ModuleRecord> {
        self.modules.clone()
    }

    fn parameter_names(&self) -> Vec<String> {
        self.parameters.clone()
    }
}

/// An architecture paired with free-form metadata (e.g., the sampled configuration).
#[derive(Debug, Clone)]
pub struct ArchWithMetadata<A> {
    arch: A,
    metadata: JsonMap<String, JsonValue>,
}
impl<A: Architecture> ArchWithMetadata<A> {
    /// Makes a new `ArchWithMetadata` instance.
    ///
    /// `metadata` must be a JSON object.
    pub fn new(arch: A, metadata: JsonValue) -> Result<Self> {
        let metadata = match metadata {
            JsonValue::Object(m) => m,
            other => track_panic!(
                ErrorKind::InvalidInput,
                "Metadata must be a JSON object: {}",
                other
            ),
        };
        Ok(Self { arch, metadata })
    }

    /// Returns a reference to the architecture.
    pub fn arch(&self) -> &A {
        &self.arch
    }

    /// Returns a reference to the metadata.
    pub fn metadata(&self) -> &JsonMap<String, JsonValue> {
        &self.metadata
    }

    /// Returns a mutable reference to the metadata.
    pub fn metadata_mut(&mut self) -> &mut JsonMap<String, JsonValue> {
        &mut self.metadata
    }

    /// Replaces the architecture, keeping the metadata.
    pub fn set_arch(&mut self, arch: A) {
        self.arch = arch;
    }
}
impl<A: Architecture> Architecture for ArchWithMetadata<A> {
    fn named_modules(&self) -> Vec<ModuleRecord> {
        self.arch.named_modules()
    }

    fn parameter_names(&self) -> Vec<String> {
        self.arch.parameter_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trackable::result::TopLevelResult;

    #[test]
    fn from_reader_works() -> TopLevelResult {
        let text = r#"{
            "modules": [
                {"name": "", "descriptor": "Net(...)"},
                {"name": "fc", "descriptor": "Linear(4,2)"}
            ],
            "parameters": ["fc.weight", "fc.bias"]
        }"#;
        let arch = track!(ArchSnapshot::from_reader(text.as_bytes()))?;
        assert_eq!(
            arch,
            ArchSnapshot::new()
                .module("", "Net(...)")
                .module("fc", "Linear(4,2)")
                .parameter("fc.weight")
                .parameter("fc.bias")
        );
        Ok(())
    }

    #[test]
    fn modules_are_optional() -> TopLevelResult {
        let arch = track!(ArchSnapshot::from_json(&json!({"parameters": ["x"]})))?;
        assert!(arch.named_modules().is_empty());
        assert_eq!(arch.parameter_names(), vec!["x".to_owned()]);
        Ok(())
    }

    #[test]
    fn malformed_json_is_rejected() {
        let inputs = vec![
            json!([]),
            json!({"modules": []}),
            json!({"parameters": [1]}),
            json!({"modules": [{"name": "a"}], "parameters": []}),
        ];
        for input in inputs {
            let e = ArchSnapshot::from_json(&input).err().unwrap();
            assert_eq!(*e.kind(), ErrorKind::InvalidInput);
        }

        let e = ArchSnapshot::from_reader(&b"{"[..]).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn arch_with_metadata_works() -> TopLevelResult {
        let arch = ArchSnapshot::new().parameter("w");
        let mut wrapped = track!(ArchWithMetadata::new(arch, json!({"n_layer": 2})))?;
        assert_eq!(wrapped.metadata()["n_layer"], json!(2));
        assert_eq!(wrapped.parameter_names(), vec!["w".to_owned()]);

        wrapped.metadata_mut().insert("d_model".to_owned(), json!(256));
        wrapped.set_arch(ArchSnapshot::new().parameter("v"));
        assert_eq!(wrapped.arch().parameter_names(), vec!["v".to_owned()]);
        assert_eq!(wrapped.metadata().len(), 2);

        let e = ArchWithMetadata::new(ArchSnapshot::new(), json!([1])).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::InvalidInput);
        Ok(())
    }
}
