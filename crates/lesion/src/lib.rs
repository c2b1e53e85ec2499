/*!

# Lesion

Lesion classifies a single photo of a skin lesion with a bundled,
pre-trained network, entirely on the device. It is split into a few
crates which are re-exported here.

## Lesion Core

The core crate holds the pipeline around the network: the
[`ModelSpec`](core::spec::ModelSpec) saying how a model wants its
input and how to read its output, the preprocessing for the input
layouts our models use, and score postprocessing.

```no_run
# fn load_bytes(s: &str) -> std::io::Cursor<Vec<u8>> { std::io::Cursor::new(vec![]) }
use lesion::core::prelude::{Classifier, Inferer, ModelSpec};

let spec = ModelSpec::patch_vit();
let inferer = lesion::onnx::builder(load_bytes("model.onnx")).build_for_spec(&spec)?;
let classifier = Classifier::new(spec, inferer)?;

println!("{:?}", classifier.inferer().input_shapes());
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Lesion Asset

Models ship as a small container holding the ONNX or NNEF data together
with the spec it was trained for, so the pipeline is always configured
from the model itself.

```no_run
# fn load_bytes(s: &str) -> Vec<u8> { vec![] }
use lesion::asset::{AssetData, AssetKind};
use lesion::core::prelude::ModelSpec;

let asset = AssetData::new(AssetKind::Onnx, ModelSpec::patch_vit(), load_bytes("model.onnx"));
std::fs::write("lesion_model.lsna", asset.serialize()?)?;

let classifier = asset.load_classifier()?;
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Lesion ONNX and Lesion NNEF

These are simple intermediates helping Lesion Asset, but can also be used directly.

## Lesion Runtime

The runtime loads the model and runs predictions on a worker pool,
making sure only the latest request is ever shown. See
[`runtime::Controller`].

*/

#![warn(rust_2018_idioms)]

pub use lesion_asset as asset;
pub use lesion_core as core;
pub use lesion_nnef as nnef;
pub use lesion_onnx as onnx;
pub use lesion_runtime as runtime;
