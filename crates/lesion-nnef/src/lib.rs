/*! Contains utilities for loading lesion classifiers stored as NNEF.

Building the NNEF framework is noticeably expensive, so each thread
caches its own instance. Call `init_thread` on a loader thread to pay
that cost before the first model arrives.
*/

use anyhow::Result;

use lesion_core::prelude::{Inferer, InfererBuilder, InfererProvider, TractInferer};
use std::{
    ffi::OsStr,
    io::Read,
    path::{Path, PathBuf},
};
use tract_nnef::{framework::Nnef, prelude::*};

pub use tract_nnef;

thread_local!(
    static NNEF: Nnef = tract_nnef::nnef().with_tract_core()
);

/// Initialize the thread-local NNEF instance.
pub fn init_thread() {
    NNEF.with(|_| {})
}

/// Utility function to check if a file name is `.nnef.tar`.
pub fn is_nnef_tar(path: &Path) -> bool {
    if let Some(ext) = path.extension().and_then(OsStr::to_str) {
        if ext != "tar" {
            return false;
        }

        let stem = match path.file_stem().and_then(OsStr::to_str).map(PathBuf::from) {
            Some(p) => p,
            None => return false,
        };

        if let Some(ext) = stem.extension().and_then(OsStr::to_str) {
            return ext == "nnef";
        }
    }

    false
}

fn model_for_reader(reader: &mut dyn Read) -> Result<TypedModel> {
    NNEF.with(|nnef| nnef.model_for_read(reader))
}

/// A reader for providing NNEF data.
pub struct NnefData<T: Read>(pub T);

impl<T> NnefData<T>
where
    T: Read,
{
    fn load(&mut self) -> Result<TypedModel> {
        model_for_reader(&mut self.0)
    }
}

impl<T> InfererProvider for NnefData<T>
where
    T: Read,
{
    /// Build a [`TractInferer`].
    fn build_basic(mut self) -> Result<TractInferer> {
        let model = self.load()?;
        TractInferer::from_typed(model)
    }

    /// NNEF graphs carry concrete input shapes of their own; the
    /// requested `dims` are only checked against them.
    fn build_pinned(mut self, dims: &[Option<usize>]) -> Result<TractInferer> {
        let model = self.load()?;
        let inferer = TractInferer::from_typed(model)?;

        if let Some((name, declared)) = inferer.input_shapes().first() {
            let expected: Vec<usize> = dims.iter().flatten().copied().collect();
            if declared.len() == expected.len() && *declared != expected {
                anyhow::bail!(
                    "model input {:?} has shape {:?} but {:?} was requested",
                    name,
                    declared,
                    expected
                );
            }
        }

        Ok(inferer)
    }
}

/// Utility function for creating an [`InfererBuilder`] for [`NnefData`].
pub fn builder<T: Read>(read: T) -> InfererBuilder<NnefData<T>> {
    InfererBuilder::new(NnefData(read))
}
