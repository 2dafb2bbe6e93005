pub use core_types::{
    DataType, DimExpr, Dims, DynamicTensorDesc, Element, TensorDesc, TensorFormat, MAX_DIMS,
};
pub use kernel::{ContextResources, DeviceBuffer, KernelStatus, Stream};
pub use opkit_plugin::{
    FieldValue, LeakyRelu, LeakyReluCreator, Plugin, PluginCreator, PluginError, PluginField,
    PluginFieldType, PluginFieldValue,
};
