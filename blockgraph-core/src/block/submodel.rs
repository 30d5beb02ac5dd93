use blockgraph_types::{DataType, Identifier};

use crate::error::{ModelError, ModelResult};
use crate::parameter::{Parameter, ParameterKind};

use super::BlockBehavior;

/// References another model by name, exposing its declared input/output
/// ports as this block's own ports.
///
/// The referenced model's port types are supplied at construction time
/// (read from its `InputPort`/`OutputPort` blocks by whatever resolves the
/// reference, e.g. [`crate::library::ModelLibrary`]) rather than looked up
/// lazily here, since `Block` has no way to reach back into the library
/// that owns it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SubModelBlock {
    model_name: Parameter,
    input_types: Vec<DataType>,
    output_types: Vec<DataType>,
}

impl SubModelBlock {
    pub fn new(model_name: Identifier, input_types: Vec<DataType>, output_types: Vec<DataType>) -> Self {
        Self {
            model_name: Parameter::new(Identifier::new("model").unwrap(), "referenced model", ParameterKind::Identifier(model_name)),
            input_types,
            output_types,
        }
    }

    pub fn model_name(&self) -> &Identifier {
        match self.model_name.kind() {
            ParameterKind::Identifier(id) => id,
            _ => unreachable!("SubModelBlock::model is always an Identifier parameter"),
        }
    }
}

impl BlockBehavior for SubModelBlock {
    fn name(&self) -> &'static str {
        "SubModel"
    }

    fn description(&self) -> &'static str {
        "References another model, exposing its ports as this block's own."
    }

    fn library(&self) -> &'static str {
        "models"
    }

    fn num_inputs(&self) -> usize {
        self.input_types.len()
    }

    fn num_outputs(&self) -> usize {
        self.output_types.len()
    }

    fn set_input_type(&mut self, port: usize, dt: DataType) -> ModelResult<()> {
        match self.input_types.get_mut(port) {
            Some(slot) => {
                *slot = dt;
                Ok(())
            }
            None => Err(ModelError::OutOfRange(format!("submodel input port {port}"))),
        }
    }

    fn output_type(&self, port: usize) -> ModelResult<DataType> {
        self.output_types
            .get(port)
            .copied()
            .ok_or_else(|| ModelError::OutOfRange(format!("submodel output port {port}")))
    }

    fn update_block(&mut self) -> bool {
        false
    }

    fn has_error(&self) -> Option<String> {
        if self.output_types.iter().any(|dt| *dt == DataType::NONE) {
            return Some("referenced model has an unresolved output type".to_string());
        }
        None
    }

    fn parameters(&self) -> Vec<&Parameter> {
        vec![&self.model_name]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.model_name]
    }
}
