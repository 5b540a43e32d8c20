//! Function registry and positional dispatch

use super::definition::FunctionSpec;
use crate::protocol::FunctionDefinition;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Namespace prefix some models put in front of function names
pub const FUNCTION_NAMESPACE_PREFIX: &str = "functions.";

/// Error type returned by registered callables
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A registered callable, invoked with positionally resolved arguments
pub type FunctionCallback = Box<dyn Fn(&Arguments) -> Result<Value, BoxError> + Send + Sync>;

/// Errors raised while dispatching a function call
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Undefined function '{0}'")]
    UndefinedFunction(String),

    #[error("Missing required parameter '{parameter}' for function '{function}'")]
    MissingParameter { function: String, parameter: String },

    /// The callable itself failed; its error is passed through unchanged
    #[error(transparent)]
    Failed(BoxError),
}

/// Error converting a positional argument into a concrete type
#[derive(Debug, Error)]
#[error("Invalid argument at position {index}: {message}")]
pub struct ArgumentError {
    pub index: usize,
    pub message: String,
}

/// Resolved arguments in parameter declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arguments {
    values: Vec<Value>,
}

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Deserialize the argument at `index`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, ArgumentError> {
        let value = self.values.get(index).ok_or_else(|| ArgumentError {
            index,
            message: "no such argument".to_string(),
        })?;
        serde_json::from_value(value.clone()).map_err(|e| ArgumentError {
            index,
            message: e.to_string(),
        })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

struct FunctionEntry {
    spec: FunctionSpec,
    definition: FunctionDefinition,
    callback: FunctionCallback,
}

/// A group of functions registered together, e.g. the methods of a service object
pub trait FunctionSet: Send + Sync + 'static {
    /// Register every function of this set into `registry`.
    fn register_functions(self: Arc<Self>, registry: &mut FunctionRegistry);
}

/// Name to callable map with the definitions advertised to the model
#[derive(Default)]
pub struct FunctionRegistry {
    entries: Vec<FunctionEntry>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.index.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function. A second registration under the same name replaces the first.
    pub fn register<F>(&mut self, spec: FunctionSpec, callback: F)
    where
        F: Fn(&Arguments) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        let entry = FunctionEntry {
            definition: spec.to_definition(),
            spec,
            callback: Box::new(callback),
        };
        let existing = self.index.get(&entry.spec.name).copied();
        match existing {
            Some(position) => {
                debug!("Replacing function '{}'", entry.spec.name);
                self.entries[position] = entry;
            }
            None => {
                self.index
                    .insert(entry.spec.name.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Register all functions of a set.
    pub fn register_all<S: FunctionSet>(&mut self, set: Arc<S>) {
        set.register_functions(self);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(strip_namespace(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definitions in registration order
    pub fn definitions(&self) -> Vec<FunctionDefinition> {
        self.entries.iter().map(|e| e.definition.clone()).collect()
    }

    /// Resolve arguments against the declared parameters and invoke the callable.
    pub fn dispatch(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value, DispatchError> {
        let name = strip_namespace(name);
        let entry = self
            .index
            .get(name)
            .map(|&position| &self.entries[position])
            .ok_or_else(|| DispatchError::UndefinedFunction(name.to_string()))?;

        let mut values = Vec::with_capacity(entry.spec.parameters.len());
        for param in &entry.spec.parameters {
            // An explicit null counts as not supplied.
            match arguments.get(&param.name).filter(|v| !v.is_null()) {
                Some(value) => values.push(value.clone()),
                None => match &param.default {
                    Some(default) => values.push(default.clone()),
                    None => {
                        return Err(DispatchError::MissingParameter {
                            function: name.to_string(),
                            parameter: param.name.clone(),
                        })
                    }
                },
            }
        }

        (entry.callback)(&Arguments::new(values)).map_err(DispatchError::Failed)
    }
}

/// Remove a leading `functions.` namespace from a model-supplied name.
pub fn strip_namespace(name: &str) -> &str {
    name.strip_prefix(FUNCTION_NAMESPACE_PREFIX).unwrap_or(name)
}
