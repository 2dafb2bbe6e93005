use thiserror::Error;

/// Declared type of one creation field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PluginFieldType {
    Float32,
    Int32,
}

/// Schema entry: one named creation-time parameter accepted by a creator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PluginField {
    pub name: &'static str,
    pub ty: PluginFieldType,
    pub len: usize,
}

/// A concrete value supplied for a schema field at creation time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue {
    Float32(f32),
    Int32(i32),
}

impl FieldValue {
    pub fn ty(self) -> PluginFieldType {
        match self {
            FieldValue::Float32(_) => PluginFieldType::Float32,
            FieldValue::Int32(_) => PluginFieldType::Int32,
        }
    }
}

/// One named value handed to `PluginCreator::create_plugin`.
#[derive(Clone, Debug, PartialEq)]
pub struct PluginFieldValue {
    pub name: String,
    pub value: FieldValue,
}

impl PluginFieldValue {
    pub fn float32(name: &str, value: f32) -> Self {
        Self { name: name.to_string(), value: FieldValue::Float32(value) }
    }

    pub fn int32(name: &str, value: i32) -> Self {
        Self { name: name.to_string(), value: FieldValue::Int32(value) }
    }
}

/// Errors raised while constructing a plugin. Kernel launch failures are not
/// represented here: `Plugin::enqueue` returns the kernel's status verbatim.
#[derive(Debug, Error, PartialEq)]
pub enum PluginError {
    #[error("serialized payload is {found} bytes, expected {expected}")]
    MalformedPayload { expected: usize, found: usize },
    #[error("expected {expected} creation field(s), found {found}")]
    FieldCountMismatch { expected: usize, found: usize },
    #[error("unknown creation field `{0}`")]
    UnknownField(String),
    #[error("field `{name}`: expected {expected:?}, found {found:?}")]
    FieldTypeMismatch {
        name: String,
        expected: PluginFieldType,
        found: PluginFieldType,
    },
}
