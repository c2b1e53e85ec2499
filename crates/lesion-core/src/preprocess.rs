/*!
Turning decoded images into model input tensors.

All layouts normalize each kept channel independently with the
constants from the [`ModelSpec`]. The patch layout additionally draws
random patch positions; the random source is passed in so callers can
pin it.
*/

use crate::{
    error::{PreprocessError, SpecError},
    spec::{sampled_len, InputLayout, ModelSpec, Normalization},
};
use image::{imageops, imageops::FilterType, RgbImage};
use rand::Rng;
use tract_core::prelude::Tensor;

/// Converts images to the input tensor of one specific model.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    layout: InputLayout,
    normalization: Normalization,
}

impl Preprocessor {
    /// Create a preprocessor for the model described by `spec`.
    ///
    /// # Errors
    ///
    /// Fails if the spec doesn't pass [`ModelSpec::validate`].
    pub fn new(spec: &ModelSpec) -> Result<Self, SpecError> {
        spec.validate()?;

        Ok(Self {
            layout: spec.input.clone(),
            normalization: spec.normalization.clone(),
        })
    }

    pub fn layout(&self) -> &InputLayout {
        &self.layout
    }

    pub fn normalization(&self) -> &Normalization {
        &self.normalization
    }

    /// Build the input tensor for `image`.
    ///
    /// Only the patch layout draws from `rng`; the other layouts are
    /// deterministic.
    pub fn preprocess<R: Rng + ?Sized>(
        &self,
        image: &RgbImage,
        rng: &mut R,
    ) -> Result<Tensor, PreprocessError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PreprocessError::EmptyImage { width, height });
        }

        match &self.layout {
            InputLayout::PatchSampled {
                image_size,
                patch_size,
                patch_count,
                shape,
            } => {
                let resized = resize(image, *image_size);
                self.sample_patches(&resized, *patch_size, *patch_count, shape, rng)
            }
            InputLayout::Resized { size } => self.planar(&resize(image, *size)),
            InputLayout::Native => self.planar(image),
        }
    }

    fn sample_patches<R: Rng + ?Sized>(
        &self,
        image: &RgbImage,
        patch_size: u32,
        patch_count: usize,
        shape: &[usize],
        rng: &mut R,
    ) -> Result<Tensor, PreprocessError> {
        let channels = self.normalization.channels();
        let mut data = vec![0.0f32; shape.iter().product()];

        let written = sampled_len(patch_size, patch_count, channels);
        let (width, height) = image.dimensions();

        let mut cursor = data[..written].iter_mut();
        for _ in 0..patch_count {
            // The corner never reaches the last patch-aligned column or row.
            let x = rng.gen_range(0..width - patch_size);
            let y = rng.gen_range(0..height - patch_size);

            for py in y..y + patch_size {
                for px in x..x + patch_size {
                    let pixel = image.get_pixel(px, py);
                    for channel in 0..channels {
                        if let Some(slot) = cursor.next() {
                            *slot = self.normalization.apply(channel, pixel[channel]);
                        }
                    }
                }
            }
        }

        Tensor::from_shape(shape, &data).map_err(PreprocessError::Tensor)
    }

    fn planar(&self, image: &RgbImage) -> Result<Tensor, PreprocessError> {
        let channels = self.normalization.channels();
        let (width, height) = image.dimensions();
        let plane = width as usize * height as usize;

        let mut data = vec![0.0f32; channels * plane];
        for (x, y, pixel) in image.enumerate_pixels() {
            let offset = pixel_offset(x, y, width);
            for channel in 0..channels {
                data[channel * plane + offset] = self.normalization.apply(channel, pixel[channel]);
            }
        }

        Tensor::from_shape(
            &[1, channels, height as usize, width as usize],
            &data,
        )
        .map_err(PreprocessError::Tensor)
    }
}

/// Row-major index of a pixel, computed wide enough for any image.
fn pixel_offset(x: u32, y: u32, width: u32) -> usize {
    y as usize * width as usize + x as usize
}

fn resize(image: &RgbImage, size: u32) -> RgbImage {
    if image.dimensions() == (size, size) {
        return image.clone();
    }

    imageops::resize(image, size, size, FilterType::Triangle)
}
