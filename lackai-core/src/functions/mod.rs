//! Locally registered functions the model may call
//!
//! Callers describe each function with an explicit [`FunctionSpec`]; the
//! registry turns it into the JSON schema advertised to the model and
//! resolves model-supplied arguments back into positional values.

pub mod definition;
pub mod registry;

pub use definition::{FunctionSpec, ParameterSpec, ParameterType};
pub use registry::{
    strip_namespace, ArgumentError, Arguments, BoxError, DispatchError, FunctionCallback,
    FunctionRegistry, FunctionSet, FUNCTION_NAMESPACE_PREFIX,
};
