/*!
Model configuration.

The three generations of our lesion models disagree about almost
everything on the input side: resolution, channel count and tensor
layout. Rather than encoding that in code paths, each bundled model
declares a [`ModelSpec`] next to its weights and the pipeline is built
from it at load time.
*/

use crate::{error::SpecError, postprocess::Postprocessing};
use serde::{Deserialize, Serialize};

/// ImageNet channel means, in RGB order.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet channel standard deviations, in RGB order.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Per-channel normalization, applied as `(value / 255 - mean) / std`.
///
/// The number of entries decides how many channels are kept: channels
/// are taken in RGB order, so two entries keep red and green and drop
/// blue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl Normalization {
    /// ImageNet normalization for the first `channels` RGB channels.
    pub fn imagenet(channels: usize) -> Self {
        let channels = channels.min(3);
        Self {
            mean: IMAGENET_MEAN[..channels].to_vec(),
            std: IMAGENET_STD[..channels].to_vec(),
        }
    }

    /// Number of channels kept.
    pub fn channels(&self) -> usize {
        self.mean.len()
    }

    /// Normalize one 8-bit `value` of channel `channel`.
    #[inline]
    pub fn apply(&self, channel: usize, value: u8) -> f32 {
        (value as f32 / 255.0 - self.mean[channel]) / self.std[channel]
    }

    /// The closed range every normalized value of `channel` falls in.
    pub fn bounds(&self, channel: usize) -> (f32, f32) {
        (self.apply(channel, 0), self.apply(channel, 255))
    }

    fn validate(&self) -> Result<(), SpecError> {
        if self.mean.len() != self.std.len() {
            return Err(SpecError::NormalizationArity {
                mean: self.mean.len(),
                std: self.std.len(),
            });
        }

        if !(1..=3).contains(&self.mean.len()) {
            return Err(SpecError::ChannelCount(self.mean.len()));
        }

        match self.std.iter().position(|s| !(*s > 0.0)) {
            Some(channel) => Err(SpecError::NonPositiveStd(channel)),
            None => Ok(()),
        }
    }
}

/// How an image is laid out as the model input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum InputLayout {
    /// Resize to `image_size` squared, then sample `patch_count`
    /// random `patch_size` squared patches, packed patch by patch,
    /// row-major, channels interleaved.
    ///
    /// The packed values fill the front of a zeroed tensor of the
    /// declared `shape`.
    PatchSampled {
        image_size: u32,
        patch_size: u32,
        patch_count: usize,
        shape: Vec<usize>,
    },

    /// Resize to `size` squared and lay out as planar NCHW.
    Resized { size: u32 },

    /// Planar NCHW at whatever size the source image has.
    Native,
}

/// The number of values the patch sampler writes.
pub(crate) fn sampled_len(patch_size: u32, patch_count: usize, channels: usize) -> usize {
    patch_count * (patch_size as usize) * (patch_size as usize) * channels
}

/// Everything the pipeline needs to know about a bundled model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub input: InputLayout,
    pub normalization: Normalization,
    pub labels: Vec<String>,
    pub postprocess: Postprocessing,
}

impl ModelSpec {
    /// The two-class patch-sampling vision transformer: 128 random
    /// 16x16 red/green patches from a 256x256 resize, scored by a
    /// plain argmax.
    pub fn patch_vit() -> Self {
        Self {
            name: "lesion-vit".to_owned(),
            input: InputLayout::PatchSampled {
                image_size: 256,
                patch_size: 16,
                patch_count: 128,
                shape: vec![1, 128, 16, 2, 16, 2],
            },
            normalization: Normalization::imagenet(2),
            labels: vec!["No lesion".to_owned(), "Lesion detected".to_owned()],
            postprocess: Postprocessing::Argmax,
        }
    }

    /// A full RGB model at 256x256 with softmax over `labels`.
    pub fn resized(labels: Vec<String>) -> Self {
        Self {
            name: "lesion-resized".to_owned(),
            input: InputLayout::Resized { size: 256 },
            normalization: Normalization::imagenet(3),
            labels,
            postprocess: Postprocessing::Softmax,
        }
    }

    /// A full RGB model fed at the source resolution, softmax over `labels`.
    pub fn native(labels: Vec<String>) -> Self {
        Self {
            name: "lesion-native".to_owned(),
            input: InputLayout::Native,
            normalization: Normalization::imagenet(3),
            labels,
            postprocess: Postprocessing::Softmax,
        }
    }

    /// Check that the spec is internally consistent.
    ///
    /// This doesn't say anything about whether it matches the model it
    /// is bundled with; that is only discovered when running it.
    pub fn validate(&self) -> Result<(), SpecError> {
        self.normalization.validate()?;

        if self.labels.is_empty() {
            return Err(SpecError::NoLabels);
        }

        match &self.input {
            InputLayout::PatchSampled {
                image_size,
                patch_size,
                patch_count,
                shape,
            } => {
                if *patch_size == 0 || patch_size >= image_size {
                    return Err(SpecError::PatchSize {
                        patch: *patch_size,
                        image: *image_size,
                    });
                }

                let required =
                    sampled_len(*patch_size, *patch_count, self.normalization.channels());
                let capacity: usize = shape.iter().product();
                if capacity < required {
                    return Err(SpecError::PatchCapacity {
                        shape: shape.clone(),
                        capacity,
                        required,
                    });
                }
            }
            InputLayout::Resized { size } => {
                if *size == 0 {
                    return Err(SpecError::EmptyResize);
                }
            }
            InputLayout::Native => {}
        }

        Ok(())
    }

    /// The model input shape; `None` marks a dimension only known once
    /// an image arrives.
    pub fn input_dims(&self) -> Vec<Option<usize>> {
        let channels = self.normalization.channels();
        match &self.input {
            InputLayout::PatchSampled { shape, .. } => shape.iter().copied().map(Some).collect(),
            InputLayout::Resized { size } => vec![
                Some(1),
                Some(channels),
                Some(*size as usize),
                Some(*size as usize),
            ],
            InputLayout::Native => vec![Some(1), Some(channels), None, None],
        }
    }
}
