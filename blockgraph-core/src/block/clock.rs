use blockgraph_types::DataType;

use crate::error::{ModelError, ModelResult};
use crate::parameter::Parameter;

use super::BlockBehavior;

/// Outputs the model's current simulation time, in seconds, each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct ClockBlock;

impl BlockBehavior for ClockBlock {
    fn name(&self) -> &'static str {
        "Clock"
    }

    fn description(&self) -> &'static str {
        "Outputs the current simulation time."
    }

    fn num_inputs(&self) -> usize {
        0
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn set_input_type(&mut self, port: usize, _dt: DataType) -> ModelResult<()> {
        Err(ModelError::OutOfRange(format!("clock has no input port {port}")))
    }

    fn output_type(&self, port: usize) -> ModelResult<DataType> {
        if port >= self.num_outputs() {
            return Err(ModelError::OutOfRange(format!("clock output port {port}")));
        }
        Ok(DataType::F64)
    }

    fn update_block(&mut self) -> bool {
        false
    }

    fn has_error(&self) -> Option<String> {
        None
    }

    fn parameters(&self) -> Vec<&Parameter> {
        Vec::new()
    }
}
