/*!
A loaded model together with the pipeline its spec describes.
*/

use crate::{
    error::{ClassifyError, PostprocessError, PreprocessError, SpecError},
    inferer::Inferer,
    postprocess::Prediction,
    preprocess::Preprocessor,
    spec::ModelSpec,
};
use image::RgbImage;
use rand::Rng;
use tract_core::prelude::Tensor;

/// Preprocessing, forward pass and postprocessing for one model.
///
/// The stages are also exposed one by one so callers can bail out
/// between them, e.g. when a newer request made the current one moot.
pub struct Classifier {
    spec: ModelSpec,
    preprocessor: Preprocessor,
    inferer: Box<dyn Inferer>,
}

impl Classifier {
    /// Combine a `spec` with the model it describes.
    ///
    /// # Errors
    ///
    /// Fails if the spec is inconsistent in itself.
    pub fn new(spec: ModelSpec, inferer: impl Inferer + 'static) -> Result<Self, SpecError> {
        let preprocessor = Preprocessor::new(&spec)?;

        Ok(Self {
            spec,
            preprocessor,
            inferer: Box::new(inferer),
        })
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn inferer(&self) -> &dyn Inferer {
        self.inferer.as_ref()
    }

    pub fn preprocess<R: Rng + ?Sized>(
        &self,
        image: &RgbImage,
        rng: &mut R,
    ) -> Result<Tensor, PreprocessError> {
        self.preprocessor.preprocess(image, rng)
    }

    pub fn infer(&self, input: Tensor) -> Result<Vec<f32>, ClassifyError> {
        self.inferer.infer(input).map_err(|e| {
            log::debug!("{} inference failed: {:#}", self.spec.name, e);
            ClassifyError::Inference(e)
        })
    }

    pub fn postprocess(&self, scores: &[f32]) -> Result<Prediction, PostprocessError> {
        self.spec.postprocess.apply(scores, &self.spec.labels)
    }

    /// Run the whole pipeline on `image`.
    pub fn classify<R: Rng + ?Sized>(
        &self,
        image: &RgbImage,
        rng: &mut R,
    ) -> Result<Prediction, ClassifyError> {
        let input = self.preprocess(image, rng)?;
        let scores = self.infer(input)?;
        Ok(self.postprocess(&scores)?)
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("spec", &self.spec)
            .field("inputs", &self.inferer.input_shapes())
            .finish()
    }
}
