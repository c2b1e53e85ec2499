use lesion_core::prelude::ClassifyError;
use thiserror::Error;

/// Errors that can be returned by the lesion runtime.
#[derive(Error, Debug)]
pub enum LesionError {
    #[error("the model is not loaded")]
    NotReady,

    #[error("a model load is already in progress")]
    AlreadyLoading,

    #[error("too many predictions in flight (limit {limit})")]
    Busy { limit: usize },

    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error("internal error occurred: {0}")]
    Internal(anyhow::Error),
}
