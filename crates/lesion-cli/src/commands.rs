use anyhow::{bail, Result};
use clap::Parser;
use lesion::asset::AssetKind;
use std::path::Path;

mod classify;
mod describe;
mod package;

/// The command to run.
#[derive(Parser, Debug)]
pub(crate) enum Command {
    Classify(classify::ClassifyArgs),
    Describe(describe::DescribeArgs),
    Package(package::PackageArgs),
}

pub(crate) fn run(command: Command) -> Result<()> {
    match command {
        Command::Classify(config) => classify::classify(config),
        Command::Describe(config) => describe::describe(config),
        Command::Package(config) => package::package(config),
    }
}

/// What a file holds, judged by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Raw(AssetKind),
    Asset,
}

fn file_kind(path: &Path) -> Result<FileKind> {
    if lesion::nnef::is_nnef_tar(path) {
        return Ok(FileKind::Raw(AssetKind::Nnef));
    }

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("onnx") => Ok(FileKind::Raw(AssetKind::Onnx)),
        Some("lsna") => Ok(FileKind::Asset),
        Some(other) => bail!("unknown file type {:?}", other),
        None => bail!("missing file extension {:?}", path),
    }
}
