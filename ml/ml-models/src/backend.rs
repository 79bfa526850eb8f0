//! Backends the pipeline runs on.
//!
//! Everything is CPU-bound through `NdArray`; training wraps it in
//! `Autodiff` so gradients are tracked for the dense head.

use burn::backend::{Autodiff, NdArray};
use burn::prelude::Backend;

/// Backend for evaluation and prediction.
pub type InferenceBackend = NdArray<f32>;

/// Backend for the training loop.
pub type TrainingBackend = Autodiff<InferenceBackend>;

/// The CPU device shared by both backends.
#[must_use]
pub fn default_device() -> <InferenceBackend as Backend>::Device {
    <InferenceBackend as Backend>::Device::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Tensor;

    #[test]
    fn devices_are_interchangeable() {
        let device = default_device();
        let a = Tensor::<InferenceBackend, 1>::ones([3], &device);
        let b = Tensor::<TrainingBackend, 1>::ones([3], &device);
        assert_eq!(a.dims(), b.dims());
    }
}
