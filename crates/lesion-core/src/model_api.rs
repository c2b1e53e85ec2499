use tract_core::{
    model::{OutletId, TypedModel},
    tract_data::TractResult,
};

/// The `ModelApi` describes the inputs and outputs for a model.
///
/// Symbolic dimensions are left out of the shapes; a native-resolution
/// model reports `[1, 3]` for its input.
#[derive(Debug, Clone, Default)]
pub struct ModelApi {
    /// The named model inputs.
    pub inputs: Vec<(String, Vec<usize>)>,

    /// The named model outputs.
    pub outputs: Vec<(String, Vec<usize>)>,
}

fn clean_name(raw: &str) -> String {
    let name = raw.split(':').next().unwrap_or(raw);
    name.strip_suffix("_0").unwrap_or(name).to_owned()
}

fn outlet_name(model: &TypedModel, outlet: &OutletId) -> String {
    match model.outlet_labels.get(outlet) {
        Some(label) => clean_name(label),
        None => clean_name(&model.node(outlet.node).name),
    }
}

impl ModelApi {
    /// Extract the model API from a typed model.
    pub fn for_typed_model(model: &TypedModel) -> TractResult<Self> {
        let mut inputs: Vec<(String, Vec<usize>)> = Default::default();

        for input_outlet in model.input_outlets()? {
            let name = clean_name(&model.node(input_outlet.node).name);
            let input_shape = &model.outlet_fact(*input_outlet)?.shape;

            inputs.push((
                name,
                input_shape
                    .iter()
                    .filter_map(|dim| dim.to_i64().map(|v| v as usize).ok())
                    .collect(),
            ));
        }

        let mut outputs: Vec<(String, Vec<usize>)> = Default::default();

        for output_outlet in model.output_outlets()? {
            let output_shape = &model.outlet_fact(*output_outlet)?.shape;
            let clean_shape = output_shape
                .iter()
                .filter_map(|dim| dim.to_i64().map(|v| v as usize).ok())
                .collect();

            outputs.push((outlet_name(model, output_outlet), clean_shape));
        }

        Ok(Self { outputs, inputs })
    }
}
