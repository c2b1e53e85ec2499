//! Contains utilities for loading lesion classifiers stored as ONNX.

use anyhow::Result;
use lesion_core::prelude::{InfererBuilder, InfererProvider, TractInferer};
use std::io::Read;
use tract_onnx::prelude::*;

pub use tract_onnx;

fn model_for_reader(reader: &mut dyn Read) -> Result<InferenceModel> {
    let onnx = tract_onnx::onnx();
    onnx.model_for_read(reader)
}

/// Wrapper for a reader providing ONNX data.
pub struct OnnxData<T: Read>(pub T);

impl<T> OnnxData<T>
where
    T: Read,
{
    fn load(&mut self) -> Result<InferenceModel> {
        model_for_reader(&mut self.0)
    }
}

impl<T> InfererProvider for OnnxData<T>
where
    T: Read,
{
    /// Build a [`TractInferer`] with the input the ONNX graph declares.
    fn build_basic(mut self) -> Result<TractInferer> {
        let model = self.load()?;
        TractInferer::from_model(model)
    }

    /// Build a [`TractInferer`] with the input pinned to `dims`.
    fn build_pinned(mut self, dims: &[Option<usize>]) -> Result<TractInferer> {
        let model = self.load()?;
        TractInferer::from_model_pinned(model, dims)
    }
}

/// Utility function for creating an [`InfererBuilder`] for [`OnnxData`].
pub fn builder<T: Read>(read: T) -> InfererBuilder<OnnxData<T>> {
    InfererBuilder::new(OnnxData(read))
}
