#![warn(clippy::all)]

/*!
Inferers are the seam between our pipeline and the network itself. The pipeline treats the network as a black box
from one input tensor to one score vector: anything that can do that forward pass can stand in for the real model,
which is how the runtime tests drive the pipeline without shipping weights.

The production implementation is [`TractInferer`], an optimized tract plan. It is loaded through an
[`InfererProvider`] (see `lesion-onnx` and `lesion-nnef`) and can be pinned to the input shape a [`ModelSpec`]
declares, which lets tract fold the shapes at load time instead of per call.

Inferers take `&self` for the forward pass. A loaded model is read-only and can be shared between every prediction
in flight.
 */

use anyhow::Result;
use tract_core::prelude::Tensor;

mod helpers;
mod tract;

pub use self::tract::TractInferer;

use crate::spec::ModelSpec;

/// A black-box forward pass.
pub trait Inferer: Send + Sync {
    /// Run the model on `input` and return the first output, flattened.
    ///
    /// # Errors
    ///
    /// Any failure from the engine, including an input shape the model doesn't accept.
    fn infer(&self, input: Tensor) -> Result<Vec<f32>>;

    /// Retrieve the name and shapes of the model inputs.
    fn input_shapes(&self) -> &[(String, Vec<usize>)];

    /// Retrieve the name and shapes of the model outputs.
    fn output_shapes(&self) -> &[(String, Vec<usize>)];
}

/// Helper trait to provide helper functions for loadable models.
pub trait InfererProvider {
    /// Build a [`TractInferer`] using the input shape declared by the model.
    fn build_basic(self) -> Result<TractInferer>;

    /// Build a [`TractInferer`] with the input pinned to `dims`. `None` marks a dimension left symbolic.
    fn build_pinned(self, dims: &[Option<usize>]) -> Result<TractInferer>;
}

/// Builder for inferers.
pub struct InfererBuilder<P: InfererProvider> {
    provider: P,
}

impl<P> InfererBuilder<P>
where
    P: InfererProvider,
{
    /// Begin the building process from the provided model provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Build a [`TractInferer`] as declared by the model.
    pub fn build_basic(self) -> Result<TractInferer> {
        self.provider.build_basic()
    }

    /// Build a [`TractInferer`] with the input the `spec` expects.
    pub fn build_for_spec(self, spec: &ModelSpec) -> Result<TractInferer> {
        self.provider.build_pinned(&spec.input_dims())
    }
}
