/*!
The lesion runtime keeps the user-facing side responsive while models
load and predictions run in the background.

A [`Controller`] owns a small worker pool, the [`ModelSlot`] that
gates predictions on a loaded model, and the [`Status`] the display
shows. Requests return immediately; results arrive over a channel and
are applied when the owning thread pumps the controller. Only the most
recent request may change the status, so a slow prediction for an
older image never overwrites a newer one.

```no_run
use lesion_asset::{DirSource, Materializer};
use lesion_runtime::{Controller, RuntimeConfig};
use std::{path::Path, sync::Arc};

let materializer = Arc::new(Materializer::new(
    DirSource::new("/usr/share/lesion"),
    "/var/cache/lesion",
));

let mut controller = Controller::new(RuntimeConfig::default())?;
controller.load_asset(materializer, "lesion_model.lsna")?;
controller.wait_idle();

controller.submit_path(Path::new("mole.jpg"))?;
controller.wait_idle();
println!("{}", controller.status());

# Ok::<(), Box<dyn std::error::Error>>(())
```

## Notes on randomness

Patch-sampling models look at a random subset of the image, so two
predictions for the same image can differ slightly. With
[`RuntimeConfig::seed`] set, each request draws from a generator
seeded with the seed and its generation, which makes a sequence of
requests reproducible.
*/

#![warn(rust_2018_idioms)]

mod config;
mod error;
mod runtime;
mod state;
mod status;
mod timing;

#[doc(inline)]
pub use crate::error::LesionError;
pub use config::RuntimeConfig;
#[doc(inline)]
pub use runtime::{Controller, Runtime};
pub use state::{LoadState, ModelSlot};
pub use status::{Phase, Status, ANALYZING, LOADING, READY};
pub use timing::LatencyStats;
