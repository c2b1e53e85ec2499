/*!
The tract-backed inferer used for every bundled model.
 */
use super::{helpers, Inferer};
use crate::model_api::ModelApi;
use anyhow::{bail, Result};
use tract_core::{
    model::{TypedModel, TypedRunnableModel},
    prelude::{tvec, Tensor, TractResult},
};
use tract_hir::prelude::InferenceModel;

/// Runs a single image through an optimized tract plan.
///
/// The plan is immutable after loading so a single instance can serve
/// concurrent callers.
pub struct TractInferer {
    model: TypedRunnableModel<TypedModel>,
    model_api: ModelApi,
}

impl TractInferer {
    /// Create an inferer for the provided `inference` model, keeping its declared input.
    ///
    /// # Errors
    ///
    /// Will only forward errors from the [`tract_core::model::Graph`] optimization and graph building steps.
    pub fn from_model(model: InferenceModel) -> TractResult<Self> {
        let (typed, model) = helpers::build_model(model, None)?;
        let model_api = ModelApi::for_typed_model(&typed)?;

        Ok(Self { model, model_api })
    }

    /// Create an inferer for the provided `inference` model, with the
    /// first input pinned to `dims`.
    ///
    /// # Errors
    ///
    /// Fails if the model can't be analysed with that input, e.g. when
    /// the spec describes a different model.
    pub fn from_model_pinned(model: InferenceModel, dims: &[Option<usize>]) -> TractResult<Self> {
        let (typed, model) = helpers::build_model(model, Some(dims))?;
        let model_api = ModelApi::for_typed_model(&typed)?;
        log::debug!("pinned model input to {:?}", dims);

        Ok(Self { model, model_api })
    }

    /// Create an inferer for an already typed model. Typed models carry
    /// their own input facts; those are kept.
    pub fn from_typed(model: TypedModel) -> TractResult<Self> {
        let (typed, model) = helpers::build_typed(model)?;
        let model_api = ModelApi::for_typed_model(&typed)?;

        Ok(Self { model, model_api })
    }
}

impl Inferer for TractInferer {
    fn infer(&self, input: Tensor) -> Result<Vec<f32>> {
        if self.model_api.inputs.len() != 1 {
            bail!(
                "expected a model with a single input, found {}",
                self.model_api.inputs.len()
            );
        }

        let result = self.model.run(tvec!(input.into()))?;
        match result.first() {
            Some(scores) => Ok(scores.as_slice::<f32>()?.to_vec()),
            None => bail!("model produced no outputs"),
        }
    }

    fn input_shapes(&self) -> &[(String, Vec<usize>)] {
        &self.model_api.inputs
    }

    fn output_shapes(&self) -> &[(String, Vec<usize>)] {
        &self.model_api.outputs
    }
}
