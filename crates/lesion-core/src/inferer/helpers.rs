use tract_core::{
    model::{TypedModel, TypedRunnableModel},
    prelude::{TDim, ToDim},
    tract_data::{TVec, TractResult},
};
use tract_hir::prelude::{Datum, InferenceFact, InferenceModel, InferenceModelExt};

/// Build the shape for `dims`, using a fresh symbol for each open dimension.
fn pinned_shape(model: &InferenceModel, dims: &[Option<usize>]) -> TVec<TDim> {
    dims.iter()
        .enumerate()
        .map(|(idx, dim)| match dim {
            Some(value) => value.to_dim(),
            None => model.symbols.sym(&format!("D{idx}")).to_dim(),
        })
        .collect()
}

pub(super) fn build_model(
    mut model: InferenceModel,
    dims: Option<&[Option<usize>]>,
) -> TractResult<(TypedModel, TypedRunnableModel<TypedModel>)> {
    let outlets = model.output_outlets()?.len();
    for output in 0..outlets {
        model.set_output_fact(output, Default::default())?;
    }

    if let Some(dims) = dims {
        let shape = pinned_shape(&model, dims);
        model.set_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), shape))?;
    }

    let typed = model.into_typed()?.into_decluttered()?;
    let plan = typed.clone().into_optimized()?.into_runnable()?;
    Ok((typed, plan))
}

pub(super) fn build_typed(
    model: TypedModel,
) -> TractResult<(TypedModel, TypedRunnableModel<TypedModel>)> {
    let typed = model.into_decluttered()?;
    let plan = typed.clone().into_optimized()?.into_runnable()?;
    Ok((typed, plan))
}
