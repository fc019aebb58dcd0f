use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use crate::definition::CircuitDefinition;
use crate::error::LoadError;
use crate::parser;

/// Resolves a subcircuit type name to its definition.
///
/// Every call must return a fresh definition; instances built from it are
/// mutated with synthetic inputs.
pub trait DefinitionLoader {
    fn load(&self, type_name: &str) -> Result<CircuitDefinition, LoadError>;
}

impl<L: DefinitionLoader + ?Sized> DefinitionLoader for &L {
    fn load(&self, type_name: &str) -> Result<CircuitDefinition, LoadError> {
        (**self).load(type_name)
    }
}

/// Loads `<root>/<type_name>.<extension>` files.
#[derive(Clone, Debug)]
pub struct DirectoryLoader {
    pub root: PathBuf,
    pub extension: String,
}

impl Default for DirectoryLoader {
    fn default() -> Self {
        Self {
            root: PathBuf::from("components"),
            extension: "txt".to_string(),
        }
    }
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn path_for(&self, type_name: &str) -> Result<PathBuf, LoadError> {
        let invalid = type_name.is_empty()
            || type_name == "."
            || type_name.contains("..")
            || type_name.contains(['/', '\\'])
            || Path::new(type_name).is_absolute();
        if invalid {
            return Err(LoadError::InvalidName(type_name.to_string()));
        }
        Ok(self.root.join(format!("{type_name}.{}", self.extension)))
    }
}

impl DefinitionLoader for DirectoryLoader {
    fn load(&self, type_name: &str) -> Result<CircuitDefinition, LoadError> {
        let path = self.path_for(type_name)?;
        log::debug!("loading `{type_name}` from {}", path.display());
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound(type_name.to_string()))
            }
            Err(source) => return Err(LoadError::Io { path, source }),
        };
        parser::parse_definition(&text).map_err(|source| LoadError::Parse {
            type_name: type_name.to_string(),
            source,
        })
    }
}

/// An in-memory registry of definitions.
#[derive(Clone, Debug, Default)]
pub struct MemoryLoader {
    definitions: HashMap<String, CircuitDefinition>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `definition` under `type_name`, returning the one it replaced.
    pub fn insert(
        &mut self,
        type_name: impl Into<String>,
        definition: CircuitDefinition,
    ) -> Option<CircuitDefinition> {
        self.definitions.insert(type_name.into(), definition)
    }

    pub fn with(mut self, type_name: impl Into<String>, definition: CircuitDefinition) -> Self {
        self.insert(type_name, definition);
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.definitions.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl DefinitionLoader for MemoryLoader {
    fn load(&self, type_name: &str) -> Result<CircuitDefinition, LoadError> {
        self.definitions
            .get(type_name)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(type_name.to_string()))
    }
}
