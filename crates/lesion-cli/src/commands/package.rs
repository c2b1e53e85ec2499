use super::{file_kind, FileKind};
use anyhow::{bail, Result};
use clap::Parser;
use lesion::{asset::AssetData, core::prelude::ModelSpec};
use std::path::{Path, PathBuf};

/// Wrap a network and the spec describing it into a lesion asset.
#[derive(Parser, Debug)]
#[clap()]
pub(crate) struct PackageArgs {
    /// An `.onnx` or `.nnef.tar` network.
    model: PathBuf,

    /// JSON file holding the model spec.
    spec: PathBuf,

    /// Where to write the asset; the extension is always `.lsna`.
    outfile: PathBuf,

    /// Load the packaged network with the declared input before writing.
    #[clap(long)]
    check: bool,
}

fn read_spec(path: &Path) -> Result<ModelSpec> {
    let spec: ModelSpec = serde_json::from_slice(&std::fs::read(path)?)?;
    spec.validate()?;
    Ok(spec)
}

pub(super) fn package(config: PackageArgs) -> Result<()> {
    let kind = match file_kind(&config.model)? {
        FileKind::Raw(kind) => kind,
        FileKind::Asset => bail!("{:?} is already a lesion asset", config.model),
    };

    let spec = read_spec(&config.spec)?;
    let asset = AssetData::new(kind, spec, std::fs::read(&config.model)?);

    if config.check {
        let classifier = asset.load_classifier()?;
        log::info!("checked {:?}", classifier);
    }

    let file = config.outfile.with_extension("lsna");
    std::fs::write(&file, asset.serialize()?)?;
    log::info!("wrote {} asset to {:?}", asset.kind(), file);

    Ok(())
}
