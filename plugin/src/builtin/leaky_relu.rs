use std::sync::OnceLock;

use core_types::{DataType, Dims, DynamicTensorDesc, TensorDesc, TensorFormat};
use kernel::{ContextResources, DeviceBuffer, KernelStatus, Stream};

use crate::op::{Plugin, PluginCreator};
use crate::serial::{Reader, Writer};
use crate::types::{FieldValue, PluginError, PluginField, PluginFieldType, PluginFieldValue};

const LEAKY_RELU_NAME: &str = "LeakyRelu";
const LEAKY_RELU_VERSION: &str = "1";

/// Leaky rectifier node: one input, one output, shape- and type-preserving.
/// `neg_slope` is the multiplier for the negative region, fixed at
/// construction; `batch_dim` is a reserved dimension parameter, always 1 on
/// the fresh-construction path.
#[derive(Debug)]
pub struct LeakyRelu {
    neg_slope: f32,
    batch_dim: i32,
    namespace: String,
}

impl LeakyRelu {
    /// Fresh graph-build construction.
    pub fn new(neg_slope: f32) -> Self {
        Self {
            neg_slope,
            batch_dim: 1,
            namespace: String::new(),
        }
    }

    /// Plan-reload construction: `neg_slope` then `batch_dim`, 8 bytes total.
    pub fn from_bytes(data: &[u8]) -> Result<Self, PluginError> {
        let mut r = Reader::new(data);
        let neg_slope = r.take_f32()?;
        let batch_dim = r.take_i32()?;
        r.finish()?;
        Ok(Self {
            neg_slope,
            batch_dim,
            namespace: String::new(),
        })
    }

    pub fn neg_slope(&self) -> f32 {
        self.neg_slope
    }

    pub fn batch_dim(&self) -> i32 {
        self.batch_dim
    }
}

impl Plugin for LeakyRelu {
    fn num_outputs(&self) -> usize {
        1
    }

    fn output_dimensions(&self, output_index: usize, input_dims: &[Dims]) -> Dims {
        assert_eq!(output_index, 0, "operator has exactly one output");
        input_dims[0]
    }

    fn output_data_type(&self, output_index: usize, input_types: &[DataType]) -> DataType {
        assert!(!input_types.is_empty() && output_index == 0);
        input_types[0]
    }

    fn supports_format_combination(
        &self,
        pos: usize,
        in_out: &[TensorDesc],
        nb_inputs: usize,
    ) -> bool {
        match pos {
            0 => {
                let input = &in_out[0];
                input.dtype == DataType::F32 && input.format == TensorFormat::Linear
            }
            1 => {
                let input = &in_out[0];
                let out = &in_out[nb_inputs];
                out.dtype == input.dtype && out.format == input.format
            }
            // single-input single-output operator: no other position exists
            _ => false,
        }
    }

    fn configure(&mut self, inputs: &[DynamicTensorDesc], _outputs: &[DynamicTensorDesc]) {
        // dynamic shape in the C dimension is not supported
        assert_eq!(inputs.len(), 1, "operator takes exactly one input");
        let dims = &inputs[0].desc.dims;
        assert!(
            dims.nb_dims() >= 2 && dims.expr(1).is_constant(),
            "channel dimension must be statically known"
        );
    }

    fn initialize(&mut self) -> KernelStatus {
        KernelStatus::Success
    }

    fn terminate(&mut self) {}

    fn workspace_size(&self, _inputs: &[TensorDesc], _outputs: &[TensorDesc]) -> usize {
        0
    }

    fn enqueue(
        &self,
        _input_descs: &[TensorDesc],
        _output_descs: &[TensorDesc],
        inputs: &[DeviceBuffer],
        outputs: &[DeviceBuffer],
        _workspace: Option<&DeviceBuffer>,
        stream: &Stream,
    ) -> KernelStatus {
        kernel::leaky_relu(stream, self.batch_dim, self.neg_slope, &inputs[0], &outputs[0])
    }

    fn serialization_size(&self) -> usize {
        // neg_slope, batch_dim
        std::mem::size_of::<f32>() + std::mem::size_of::<i32>()
    }

    fn serialize(&self, buffer: &mut [u8]) {
        let mut w = Writer::new(buffer);
        w.put_f32(self.neg_slope);
        w.put_i32(self.batch_dim);
        w.finish();
    }

    fn plugin_type(&self) -> &'static str {
        LEAKY_RELU_NAME
    }

    fn plugin_version(&self) -> &'static str {
        LEAKY_RELU_VERSION
    }

    fn clone_plugin(&self) -> Box<dyn Plugin> {
        // clones go through the creation path, so batch_dim resets to its
        // default rather than being copied from the source
        let mut plugin = LeakyRelu::new(self.neg_slope);
        plugin.set_namespace(&self.namespace);
        plugin.initialize();
        Box::new(plugin)
    }

    fn set_namespace(&mut self, namespace: &str) {
        self.namespace = namespace.to_string();
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn attach_to_context(&mut self, _resources: &ContextResources) {}

    fn detach_from_context(&mut self) {}
}

/// Creator for [`LeakyRelu`]: advertises the one-field schema and builds
/// nodes from field values or serialized payloads.
#[derive(Default)]
pub struct LeakyReluCreator {
    namespace: String,
}

impl LeakyReluCreator {
    pub fn new() -> Self {
        Self::default()
    }
}

static FIELD_SCHEMA: OnceLock<Vec<PluginField>> = OnceLock::new();

impl PluginCreator for LeakyReluCreator {
    fn plugin_name(&self) -> &'static str {
        LEAKY_RELU_NAME
    }

    fn plugin_version(&self) -> &'static str {
        LEAKY_RELU_VERSION
    }

    fn field_names(&self) -> &'static [PluginField] {
        FIELD_SCHEMA.get_or_init(|| {
            vec![PluginField {
                name: "negSlope",
                ty: PluginFieldType::Float32,
                len: 1,
            }]
        })
    }

    fn create_plugin(
        &self,
        _name: &str,
        fields: &[PluginFieldValue],
    ) -> Result<Box<dyn Plugin>, PluginError> {
        if fields.len() != 1 {
            return Err(PluginError::FieldCountMismatch {
                expected: 1,
                found: fields.len(),
            });
        }
        let field = &fields[0];
        if field.name != "negSlope" {
            return Err(PluginError::UnknownField(field.name.clone()));
        }
        let neg_slope = match field.value {
            FieldValue::Float32(v) => v,
            other => {
                return Err(PluginError::FieldTypeMismatch {
                    name: field.name.clone(),
                    expected: PluginFieldType::Float32,
                    found: other.ty(),
                })
            }
        };

        let mut plugin = LeakyRelu::new(neg_slope);
        plugin.set_namespace(&self.namespace);
        plugin.initialize();
        Ok(Box::new(plugin))
    }

    fn deserialize_plugin(&self, _name: &str, data: &[u8]) -> Result<Box<dyn Plugin>, PluginError> {
        let mut plugin = LeakyRelu::from_bytes(data)?;
        plugin.set_namespace(&self.namespace);
        plugin.initialize();
        Ok(Box::new(plugin))
    }

    fn set_namespace(&mut self, namespace: &str) {
        self.namespace = namespace.to_string();
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}

/* ------------------------------------------------------------------------- */
/*                                     Tests                                 */
/* ------------------------------------------------------------------------- */
#[cfg(test)]
mod tests {
    use super::*;
    use core_types::DimExpr;

    fn desc(dtype: DataType, format: TensorFormat) -> TensorDesc {
        TensorDesc {
            dims: Dims::constant(&[1, 3, 4, 4]),
            dtype,
            format,
        }
    }

    #[test]
    fn serialize_round_trip() {
        let plugin = LeakyRelu::new(0.17);
        let mut buf = vec![0u8; plugin.serialization_size()];
        assert_eq!(buf.len(), 8);
        plugin.serialize(&mut buf);

        let back = LeakyRelu::from_bytes(&buf).unwrap();
        assert_eq!(back.neg_slope(), 0.17);
        assert_eq!(back.batch_dim(), 1);
    }

    #[test]
    fn from_bytes_preserves_batch_dim() {
        let mut buf = vec![0u8; 8];
        let mut w = Writer::new(&mut buf);
        w.put_f32(0.2);
        w.put_i32(7);
        w.finish();

        let plugin = LeakyRelu::from_bytes(&buf).unwrap();
        assert_eq!(plugin.batch_dim(), 7);
    }

    #[test]
    fn short_payload_is_rejected() {
        let err = LeakyRelu::from_bytes(&[0u8; 5]).unwrap_err();
        assert!(matches!(err, PluginError::MalformedPayload { found: 5, .. }));
    }

    #[test]
    fn long_payload_is_rejected() {
        let err = LeakyRelu::from_bytes(&[0u8; 12]).unwrap_err();
        assert!(matches!(err, PluginError::MalformedPayload { found: 12, .. }));
    }

    #[test]
    fn output_shape_matches_input_including_symbolic_dims() {
        let plugin = LeakyRelu::new(0.01);
        let dims = Dims::new(&[
            DimExpr::Symbolic(0),
            DimExpr::Constant(64),
            DimExpr::Symbolic(1),
            DimExpr::Constant(8),
        ]);
        assert_eq!(plugin.output_dimensions(0, &[dims]), dims);
    }

    #[test]
    #[should_panic(expected = "exactly one output")]
    fn second_output_shape_is_a_contract_violation() {
        let plugin = LeakyRelu::new(0.01);
        plugin.output_dimensions(1, &[Dims::constant(&[2, 3])]);
    }

    #[test]
    fn output_type_matches_input() {
        let plugin = LeakyRelu::new(0.01);
        assert_eq!(plugin.output_data_type(0, &[DataType::F32]), DataType::F32);
        assert_eq!(plugin.output_data_type(0, &[DataType::I32]), DataType::I32);
    }

    #[test]
    fn format_combination_truth_table() {
        let plugin = LeakyRelu::new(0.01);
        let linear_f32 = desc(DataType::F32, TensorFormat::Linear);
        let chw4_f32 = desc(DataType::F32, TensorFormat::Chw4);
        let linear_i32 = desc(DataType::I32, TensorFormat::Linear);

        // input leg: f32 + linear only
        assert!(plugin.supports_format_combination(0, &[linear_f32, linear_f32], 1));
        assert!(!plugin.supports_format_combination(0, &[chw4_f32, linear_f32], 1));
        assert!(!plugin.supports_format_combination(0, &[linear_i32, linear_f32], 1));

        // output leg: must match the input exactly
        assert!(plugin.supports_format_combination(1, &[linear_f32, linear_f32], 1));
        assert!(!plugin.supports_format_combination(1, &[linear_f32, chw4_f32], 1));
        assert!(!plugin.supports_format_combination(1, &[linear_f32, linear_i32], 1));

        // positions this operator does not have
        assert!(!plugin.supports_format_combination(2, &[linear_f32, linear_f32], 1));
    }

    #[test]
    fn out_of_range_position_is_false_even_without_descriptors() {
        let plugin = LeakyRelu::new(0.01);
        assert!(!plugin.supports_format_combination(2, &[], 1));
        assert!(!plugin.supports_format_combination(usize::MAX, &[], 1));
    }

    #[test]
    fn configure_accepts_static_channel_dim() {
        let mut plugin = LeakyRelu::new(0.01);
        let dims = Dims::new(&[DimExpr::Symbolic(0), DimExpr::Constant(3)]);
        let d = DynamicTensorDesc {
            desc: TensorDesc { dims, dtype: DataType::F32, format: TensorFormat::Linear },
            min: Dims::constant(&[1, 3]),
            max: Dims::constant(&[8, 3]),
        };
        plugin.configure(&[d], &[d]);
    }

    #[test]
    #[should_panic(expected = "channel dimension")]
    fn configure_rejects_symbolic_channel_dim() {
        let mut plugin = LeakyRelu::new(0.01);
        let dims = Dims::new(&[DimExpr::Constant(1), DimExpr::Symbolic(0)]);
        let d = DynamicTensorDesc {
            desc: TensorDesc { dims, dtype: DataType::F32, format: TensorFormat::Linear },
            min: Dims::constant(&[1, 1]),
            max: Dims::constant(&[1, 16]),
        };
        plugin.configure(&[d], &[d]);
    }

    #[test]
    fn workspace_is_always_zero() {
        let plugin = LeakyRelu::new(0.5);
        let d = desc(DataType::F32, TensorFormat::Linear);
        assert_eq!(plugin.workspace_size(&[d], &[d]), 0);
    }

    #[test]
    fn clone_is_independent_and_resets_batch_dim() {
        // source with a non-default batch_dim, via the payload path
        let mut buf = vec![0u8; 8];
        let mut w = Writer::new(&mut buf);
        w.put_f32(0.3);
        w.put_i32(5);
        w.finish();
        let mut original = LeakyRelu::from_bytes(&buf).unwrap();
        original.set_namespace("graph0");

        let clone = original.clone_plugin();
        assert_eq!(clone.namespace(), "graph0");

        // destroying the original leaves the clone usable
        original.terminate();
        drop(original);

        let mut out = vec![0u8; clone.serialization_size()];
        clone.serialize(&mut out);
        let back = LeakyRelu::from_bytes(&out).unwrap();
        assert_eq!(back.neg_slope(), 0.3);
        assert_eq!(back.batch_dim(), 1);
    }

    #[test]
    fn enqueue_runs_the_activation() {
        let plugin = LeakyRelu::new(0.01);
        let stream = Stream::new();
        let input = DeviceBuffer::from_slice(&[-2.0f32, 3.0]);
        let output = DeviceBuffer::zeroed(DataType::F32, 2);
        let d = desc(DataType::F32, TensorFormat::Linear);

        let status = plugin.enqueue(&[d], &[d], &[input], &[output.clone()], None, &stream);
        assert!(status.is_success());

        stream.synchronize();
        assert_eq!(output.to_vec::<f32>(), vec![-0.02, 3.0]);
    }

    #[test]
    fn enqueue_propagates_kernel_status() {
        let plugin = LeakyRelu::new(0.01);
        let stream = Stream::new();
        let input = DeviceBuffer::from_slice(&[1i32, 2]);
        let output = DeviceBuffer::zeroed(DataType::F32, 2);
        let d = desc(DataType::F32, TensorFormat::Linear);

        let status = plugin.enqueue(&[d], &[d], &[input], &[output], None, &stream);
        assert_eq!(status, KernelStatus::NotSupported);
    }

    #[test]
    fn creator_identity_matches_node() {
        let creator = LeakyReluCreator::new();
        let plugin = LeakyRelu::new(0.1);
        assert_eq!(creator.plugin_name(), plugin.plugin_type());
        assert_eq!(creator.plugin_version(), plugin.plugin_version());
    }

    #[test]
    fn creator_schema_is_one_float_field() {
        let creator = LeakyReluCreator::new();
        let schema = creator.field_names();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema[0].name, "negSlope");
        assert_eq!(schema[0].ty, PluginFieldType::Float32);
        assert_eq!(schema[0].len, 1);

        // the table is shared across creator instances
        let other = LeakyReluCreator::new();
        assert_eq!(other.field_names().as_ptr(), schema.as_ptr());
    }

    #[test]
    fn create_plugin_stamps_namespace() {
        let mut creator = LeakyReluCreator::new();
        creator.set_namespace("engine");
        let plugin = creator
            .create_plugin("leaky", &[PluginFieldValue::float32("negSlope", 0.01)])
            .unwrap();
        assert_eq!(plugin.namespace(), "engine");
    }

    #[test]
    fn create_plugin_rejects_extra_fields() {
        let creator = LeakyReluCreator::new();
        let fields = [
            PluginFieldValue::float32("negSlope", 0.01),
            PluginFieldValue::float32("negSlope", 0.02),
        ];
        let err = creator.create_plugin("leaky", &fields).unwrap_err();
        assert_eq!(err, PluginError::FieldCountMismatch { expected: 1, found: 2 });
    }

    #[test]
    fn create_plugin_rejects_wrong_type() {
        let creator = LeakyReluCreator::new();
        let err = creator
            .create_plugin("leaky", &[PluginFieldValue::int32("negSlope", 1)])
            .unwrap_err();
        assert_eq!(
            err,
            PluginError::FieldTypeMismatch {
                name: "negSlope".to_string(),
                expected: PluginFieldType::Float32,
                found: PluginFieldType::Int32,
            }
        );
    }

    #[test]
    fn create_plugin_rejects_unknown_field() {
        let creator = LeakyReluCreator::new();
        let err = creator
            .create_plugin("leaky", &[PluginFieldValue::float32("alpha", 0.01)])
            .unwrap_err();
        assert_eq!(err, PluginError::UnknownField("alpha".to_string()));
    }

    #[test]
    fn deserialize_plugin_round_trips() {
        let mut creator = LeakyReluCreator::new();
        creator.set_namespace("engine");

        let built = creator
            .create_plugin("leaky", &[PluginFieldValue::float32("negSlope", 0.125)])
            .unwrap();
        let mut buf = vec![0u8; built.serialization_size()];
        built.serialize(&mut buf);

        let reloaded = creator.deserialize_plugin("leaky", &buf).unwrap();
        assert_eq!(reloaded.namespace(), "engine");
        let mut buf2 = vec![0u8; reloaded.serialization_size()];
        reloaded.serialize(&mut buf2);
        assert_eq!(buf, buf2);
    }
}
