use anyhow::{bail, Result};
use clap::Parser;
use lesion::{
    asset::{DirSource, Materializer, RefreshPolicy},
    runtime::{Controller, LesionError, LoadState, Phase, RuntimeConfig},
};
use std::{path::PathBuf, sync::Arc};

/// Classify one or more images with the bundled model.
#[derive(Parser, Debug)]
#[clap()]
pub(crate) struct ClassifyArgs {
    /// Directory holding the bundled model assets.
    #[clap(long)]
    assets: PathBuf,

    /// Writable directory for the local model copy. Defaults to a
    /// `lesion` directory under the system temp dir.
    #[clap(long)]
    cache: Option<PathBuf>,

    /// Name of the bundled model asset.
    #[clap(long, default_value = "lesion_model.lsna")]
    model: String,

    /// Seed for patch sampling, for reproducible results.
    #[clap(long)]
    seed: Option<u64>,

    /// Worker threads for loading and prediction.
    #[clap(short, long, default_value_t = 2)]
    threads: usize,

    /// Replace the local copy when its size differs from the bundled asset.
    #[clap(long)]
    refresh: bool,

    #[clap(required = true)]
    images: Vec<PathBuf>,
}

pub(super) fn classify(config: ClassifyArgs) -> Result<()> {
    let cache = config
        .cache
        .unwrap_or_else(|| std::env::temp_dir().join("lesion"));

    let policy = if config.refresh {
        RefreshPolicy::SizeChanged
    } else {
        RefreshPolicy::Never
    };

    let materializer =
        Arc::new(Materializer::new(DirSource::new(&config.assets), cache).with_policy(policy));

    let mut controller = Controller::new(
        RuntimeConfig::default()
            .with_worker_threads(config.threads)
            .with_seed(config.seed),
    )?;

    controller.load_asset(materializer, config.model.as_str())?;
    eprintln!("{}", controller.status());
    controller.wait_idle();

    if let LoadState::Failed(_) = controller.load_state() {
        bail!("{}", controller.status());
    }
    eprintln!("{}", controller.status());

    let mut failures = 0;
    for path in &config.images {
        match controller.submit_path(path) {
            Ok(_) => controller.wait_idle(),
            Err(LesionError::ImageDecode(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let status = controller.status();
        println!("{}: {}", path.display(), status);
        if status.phase != Phase::Success {
            failures += 1;
        }
    }

    let latency = controller.runtime().latency();
    if let Some(mean) = latency.mean() {
        match latency.std_dev() {
            Some(std_dev) => eprintln!(
                "{} predictions, mean latency {:.2?} (std dev {:.2?})",
                latency.count(),
                mean,
                std_dev
            ),
            None => eprintln!("1 prediction, latency {:.2?}", mean),
        }
    }

    if failures > 0 {
        bail!(
            "{} of {} images could not be classified",
            failures,
            config.images.len()
        );
    }

    Ok(())
}
