use lesion_core::prelude::Prediction;
use std::fmt;

pub const ANALYZING: &str = "Analyzing…";
pub const LOADING: &str = "Loading model...";
pub const READY: &str = "Ready";

/// Where the display currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing loaded or requested yet.
    Idle,
    Loading,
    Ready,
    Analyzing,
    Success,

    /// The latest prediction failed.
    Failed,

    /// The model failed to load. Predictions are rejected until a new load.
    LoadFailed,
}

/// What the display shows: one status line and the picked image's size.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub phase: Phase,
    pub message: String,

    /// Width and height of the image being classified.
    pub preview: Option<(u32, u32)>,

    /// Request this status belongs to; zero before any request.
    pub generation: u64,
    pub prediction: Option<Prediction>,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            message: String::new(),
            preview: None,
            generation: 0,
            prediction: None,
        }
    }
}

impl Status {
    pub(crate) fn loading() -> Self {
        Self {
            phase: Phase::Loading,
            message: LOADING.to_owned(),
            ..Default::default()
        }
    }

    pub(crate) fn ready() -> Self {
        Self {
            phase: Phase::Ready,
            message: READY.to_owned(),
            ..Default::default()
        }
    }

    pub(crate) fn load_failed(reason: &str) -> Self {
        Self {
            phase: Phase::LoadFailed,
            message: format!("ERROR: failed to load model: {}", reason),
            ..Default::default()
        }
    }

    pub(crate) fn analyzing(generation: u64, preview: Option<(u32, u32)>) -> Self {
        Self {
            phase: Phase::Analyzing,
            message: ANALYZING.to_owned(),
            preview,
            generation,
            prediction: None,
        }
    }

    pub(crate) fn success(&self, prediction: Prediction) -> Self {
        Self {
            phase: Phase::Success,
            message: prediction.to_string(),
            preview: self.preview,
            generation: self.generation,
            prediction: Some(prediction),
        }
    }

    pub(crate) fn failed(&self, error: &dyn fmt::Display) -> Self {
        Self {
            phase: Phase::Failed,
            message: format!("Error: {}", error),
            preview: self.preview,
            generation: self.generation,
            prediction: None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
