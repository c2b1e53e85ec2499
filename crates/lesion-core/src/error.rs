/*!
Error types for the classification pipeline.
*/

use thiserror::Error;

/// Errors for a [`ModelSpec`](crate::spec::ModelSpec) that can never
/// match a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecError {
    #[error("normalization has {mean} means but {std} standard deviations")]
    NormalizationArity { mean: usize, std: usize },

    #[error("expected 1 to 3 normalized channels, got {0}")]
    ChannelCount(usize),

    #[error("standard deviation for channel {0} must be positive")]
    NonPositiveStd(usize),

    #[error("the class label table is empty")]
    NoLabels,

    #[error("patch size {patch} must be non-zero and smaller than the image size {image}")]
    PatchSize { patch: u32, image: u32 },

    #[error("declared input shape {shape:?} holds {capacity} values but {required} are sampled")]
    PatchCapacity {
        shape: Vec<usize>,
        capacity: usize,
        required: usize,
    },

    #[error("resize target must be non-zero")]
    EmptyResize,
}

/// Errors while turning an image into a tensor.
#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("failed building tensor: {0}")]
    Tensor(anyhow::Error),
}

/// Errors while turning scores into a prediction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PostprocessError {
    #[error("the model produced no usable scores")]
    NoScores,

    #[error("model produced {scores} scores but the label table has {labels} entries")]
    LabelMismatch { scores: usize, labels: usize },
}

/// Failure of a single classification attempt.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    /// The engine's own message, kept verbatim.
    #[error("{0:#}")]
    Inference(anyhow::Error),

    #[error(transparent)]
    Postprocess(#[from] PostprocessError),
}
