/*!

# Lesion Core

Everything between a decoded image and a displayed verdict: the model
configuration, the three input layouts our bundled classifiers have
used, score postprocessing, and a thin wrapper around tract for the
forward pass itself.

```no_run
# fn load_model() -> lesion_core::inferer::TractInferer { unimplemented!() }
use lesion_core::prelude::*;
use rand::thread_rng;

let spec = ModelSpec::patch_vit();
let classifier = Classifier::new(spec, load_model())?;

let image = image::open("mole.jpg")?.to_rgb8();
let prediction = classifier.classify(&image, &mut thread_rng())?;
println!("{}", prediction);
# Ok::<(), Box<dyn std::error::Error>>(())
```

 */

#![warn(rust_2018_idioms)]

pub use tract_core;
pub use tract_hir;

pub mod classifier;
pub mod error;
pub mod inferer;
mod model_api;
pub mod postprocess;
pub mod preprocess;
pub mod spec;

/// Most core utilities are re-exported here.
pub mod prelude {
    pub use super::classifier::Classifier;
    pub use super::error::{ClassifyError, PostprocessError, PreprocessError, SpecError};
    pub use super::inferer::{Inferer, InfererBuilder, InfererProvider, TractInferer};
    pub use super::model_api::ModelApi;
    pub use super::postprocess::{Postprocessing, Prediction};
    pub use super::preprocess::Preprocessor;
    pub use super::spec::{InputLayout, ModelSpec, Normalization};
}
