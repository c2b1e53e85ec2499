use super::{file_kind, FileKind};
use anyhow::Result;
use clap::Parser;
use lesion::{
    asset::{AssetData, AssetKind},
    core::prelude::{Inferer, TractInferer},
};
use std::{fs::File, io::BufReader, path::PathBuf};

/// Describe a model file: its declared spec, if any, and the network's inputs and outputs.
#[derive(Parser, Debug)]
#[clap()]
pub(crate) struct DescribeArgs {
    file: PathBuf,
}

fn print_shapes(model: &TractInferer) {
    println!("Inputs:");
    for (name, shape) in model.input_shapes() {
        println!("\t{:40}: {:?}", name, shape);
    }

    println!("\nOutputs:");
    for (name, shape) in model.output_shapes() {
        println!("\t{:40}: {:?}", name, shape);
    }
}

pub(super) fn describe(config: DescribeArgs) -> Result<()> {
    let mut reader = BufReader::new(File::open(&config.file)?);

    let model = match file_kind(&config.file)? {
        FileKind::Raw(AssetKind::Nnef) => {
            println!("a NNEF file");
            lesion::nnef::builder(&mut reader).build_basic()?
        }
        FileKind::Raw(AssetKind::Onnx) => {
            println!("an ONNX file");
            lesion::onnx::builder(&mut reader).build_basic()?
        }
        FileKind::Asset => {
            let asset = AssetData::deserialize(&mut reader)?;
            println!("a lesion asset containing {} data", asset.kind());
            println!("{}", serde_json::to_string_pretty(asset.spec())?);
            asset.load_basic()?
        }
    };

    print_shapes(&model);
    Ok(())
}
