use lesion_core::prelude::SpecError;
use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors from reading, caching or loading model assets.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("invalid asset name {0:?}")]
    InvalidName(String),

    #[error("failed reading bundled asset {name:?}: {source}")]
    Bundled { name: String, source: io::Error },

    #[error("failed copying {name:?} to local storage: {source}")]
    Copy { name: String, source: io::Error },

    #[error("failed writing {path:?}: {source}")]
    Cache { path: PathBuf, source: io::Error },

    #[error("invalid asset: {0}")]
    Format(String),

    #[error("invalid model metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("failed loading network: {0:#}")]
    Model(anyhow::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
