//! Backend selection
//!
//! The served classifier and the training loop both run on the backend chosen
//! by Cargo feature: `cuda` for GPU, `ndarray` (default) for CPU.

use burn::backend::Autodiff;
use burn::tensor::backend::Backend;

#[cfg(feature = "cuda")]
pub type DefaultBackend = burn_cuda::Cuda;

#[cfg(all(not(feature = "cuda"), feature = "ndarray"))]
pub type DefaultBackend = burn_ndarray::NdArray;

#[cfg(all(not(feature = "cuda"), not(feature = "ndarray")))]
compile_error!("Enable either the `cuda` or the `ndarray` feature to select a backend");

/// Backend used by the HTTP service and the `predict` command
pub type InferenceBackend = DefaultBackend;

/// Autodiff backend used by `train`
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Default device of the selected backend
pub fn default_device() -> <DefaultBackend as Backend>::Device {
    <DefaultBackend as Backend>::Device::default()
}

/// Human-readable backend name for startup logs
pub fn backend_name() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA (GPU)"
    } else {
        "NdArray (CPU)"
    }
}
