mod stream;

pub use stream::Stream;

use std::sync::Arc;

use bytemuck::cast_slice;
use core_types::{DataType, Element};
use parking_lot::RwLock;

/// Status codes returned by kernel entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelStatus {
    Success,
    BadParam,
    NotSupported,
    Failure,
}

impl KernelStatus {
    pub fn is_success(self) -> bool {
        self == KernelStatus::Success
    }
}

/// Shared library handles the host lends a plugin for the lifetime of an
/// execution context.
#[derive(Debug, Default)]
pub struct ContextResources {
    _priv: (),
}

/// Reference-counted linear device allocation, host-visible in this reference
/// backend. Cloning shares the underlying storage.
#[derive(Clone)]
pub struct DeviceBuffer {
    data: Arc<RwLock<Vec<u8>>>,
    dtype: DataType,
}

impl DeviceBuffer {
    /// Allocate and upload a host slice.
    pub fn from_slice<T: Element>(data: &[T]) -> Self {
        Self {
            data: Arc::new(RwLock::new(cast_slice(data).to_vec())),
            dtype: T::DTYPE,
        }
    }

    /// Allocate `elem_count` zeroed elements of `dtype`.
    pub fn zeroed(dtype: DataType, elem_count: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(vec![0u8; elem_count * dtype.size_in_bytes()])),
            dtype,
        }
    }

    /// Download the buffer contents into a `Vec<T>`.
    pub fn to_vec<T: Element>(&self) -> Vec<T> {
        assert_eq!(T::DTYPE, self.dtype, "element type mismatch on download");
        cast_slice(&self.data.read()).to_vec()
    }

    pub fn len_bytes(&self) -> usize {
        self.data.read().len()
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    fn write_with<F>(&self, f: F)
    where
        F: FnOnce(&mut [u8]),
    {
        f(&mut self.data.write());
    }

    fn read_with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[u8]) -> R,
    {
        f(&self.data.read())
    }
}

/// Elementwise leaky rectifier: `x >= 0 ? x : x * neg_slope`.
///
/// Validates its arguments, queues the map on `stream`, and returns before
/// the work runs. The caller synchronizes the stream to observe results.
pub fn leaky_relu(
    stream: &Stream,
    batch_dim: i32,
    neg_slope: f32,
    input: &DeviceBuffer,
    output: &DeviceBuffer,
) -> KernelStatus {
    if batch_dim < 1 {
        return KernelStatus::BadParam;
    }
    if input.dtype() != DataType::F32 || output.dtype() != DataType::F32 {
        return KernelStatus::NotSupported;
    }
    if input.len_bytes() != output.len_bytes() {
        return KernelStatus::BadParam;
    }

    let map = move |x: f32| if x >= 0.0 { x } else { x * neg_slope };

    // in-place call: one lock, the locks are not reentrant
    if Arc::ptr_eq(&input.data, &output.data) {
        let buf = output.clone();
        stream.enqueue(move || {
            buf.write_with(|dst| {
                let dst: &mut [f32] = bytemuck::cast_slice_mut(dst);
                for d in dst.iter_mut() {
                    *d = map(*d);
                }
            });
        });
        return KernelStatus::Success;
    }

    let input = input.clone();
    let output = output.clone();
    stream.enqueue(move || {
        input.read_with(|src| {
            output.write_with(|dst| {
                let src: &[f32] = cast_slice(src);
                let dst: &mut [f32] = bytemuck::cast_slice_mut(dst);
                for (d, &x) in dst.iter_mut().zip(src) {
                    *d = map(x);
                }
            });
        });
    });
    KernelStatus::Success
}

/* ------------------------------------------------------------------------- */
/*                                  Tests                                    */
/* ------------------------------------------------------------------------- */
