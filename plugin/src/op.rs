use core_types::{DataType, Dims, DynamicTensorDesc, TensorDesc};
use kernel::{ContextResources, DeviceBuffer, KernelStatus, Stream};

use crate::types::{PluginError, PluginField, PluginFieldValue};

/// Lifecycle contract every custom operator node honors, from graph build
/// through repeated execution. The host drives it in a fixed order:
/// shape/type inference, format negotiation, `configure`, `initialize`,
/// zero or more `enqueue` calls, `terminate`. Dropping the node is its
/// destruction.
pub trait Plugin: Send + Sync + std::fmt::Debug {
    /// Number of output tensors this operator produces.
    fn num_outputs(&self) -> usize;

    /// Shape of output `output_index` given the input shapes. Symbolic
    /// dimensions pass through untouched.
    fn output_dimensions(&self, output_index: usize, input_dims: &[Dims]) -> Dims;

    /// Element type of output `output_index` given the input types.
    fn output_data_type(&self, output_index: usize, input_types: &[DataType]) -> DataType;

    /// Whether the descriptor at `pos` is acceptable, given every descriptor
    /// chosen so far. `in_out` holds the inputs followed by the outputs;
    /// `pos` indexes into it. Positions this operator does not have return
    /// `false`.
    fn supports_format_combination(
        &self,
        pos: usize,
        in_out: &[TensorDesc],
        nb_inputs: usize,
    ) -> bool;

    /// Called once after negotiation converges, before the first execution.
    fn configure(&mut self, inputs: &[DynamicTensorDesc], outputs: &[DynamicTensorDesc]);

    /// Resource-acquisition hook, paired with `terminate`.
    fn initialize(&mut self) -> KernelStatus;

    /// Resource-release hook.
    fn terminate(&mut self);

    /// Scratch device memory the host must allocate for one execution.
    fn workspace_size(&self, inputs: &[TensorDesc], outputs: &[TensorDesc]) -> usize;

    /// Queue this operator's device work on `stream` and return without
    /// waiting for it. The status of the kernel launch is propagated
    /// verbatim.
    fn enqueue(
        &self,
        input_descs: &[TensorDesc],
        output_descs: &[TensorDesc],
        inputs: &[DeviceBuffer],
        outputs: &[DeviceBuffer],
        workspace: Option<&DeviceBuffer>,
        stream: &Stream,
    ) -> KernelStatus;

    /// Exact number of bytes `serialize` writes.
    fn serialization_size(&self) -> usize;

    /// Write this node's parameters into `buffer`, which the host sizes via
    /// `serialization_size`.
    fn serialize(&self, buffer: &mut [u8]);

    /// Type tag matching this node back to its creator on plan reload.
    fn plugin_type(&self) -> &'static str;

    fn plugin_version(&self) -> &'static str;

    /// Independent copy with the same creation parameters, already
    /// initialized. Used to reuse one operator across multiple graphs.
    fn clone_plugin(&self) -> Box<dyn Plugin>;

    /// Opaque grouping label set by the host; not used on the compute path.
    fn set_namespace(&mut self, namespace: &str);

    fn namespace(&self) -> &str;

    /// Grant access to shared library handles for one execution context.
    fn attach_to_context(&mut self, resources: &ContextResources);

    fn detach_from_context(&mut self);
}

/// Registry-facing constructor for one plugin type. Advertises identity and
/// the accepted creation fields, and builds nodes either from explicit field
/// values or from a serialized payload. Ownership of every produced node
/// passes to the caller.
pub trait PluginCreator: Send + Sync {
    fn plugin_name(&self) -> &'static str;

    fn plugin_version(&self) -> &'static str;

    /// Static schema of accepted creation fields, shared process-wide.
    fn field_names(&self) -> &'static [PluginField];

    /// Build a node from explicit field values.
    fn create_plugin(
        &self,
        name: &str,
        fields: &[PluginFieldValue],
    ) -> Result<Box<dyn Plugin>, PluginError>;

    /// Rebuild a node from a serialized payload on plan reload.
    fn deserialize_plugin(&self, name: &str, data: &[u8]) -> Result<Box<dyn Plugin>, PluginError>;

    fn set_namespace(&mut self, namespace: &str);

    fn namespace(&self) -> &str;
}
