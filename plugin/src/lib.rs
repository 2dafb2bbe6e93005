pub mod builtin;
pub mod op;
pub mod serial;
pub mod types;

pub use builtin::{LeakyRelu, LeakyReluCreator};
pub use op::{Plugin, PluginCreator};
pub use types::{FieldValue, PluginError, PluginField, PluginFieldType, PluginFieldValue};
