use blockgraph_types::DataType;

use crate::error::{ModelError, ModelResult};
use crate::parameter::Parameter;

use super::BlockBehavior;

/// Delays its value input by one tick: emits the value it captured on the
/// previous tick, then captures the current one. A reset-flag input, when
/// set, substitutes its reset-value input for the captured value before
/// emitting. Ports are `[value, reset_flag, reset_value]`. The only block
/// kind whose outputs are delayed relative to its inputs, which the
/// scheduler must account for when ordering ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct DelayBlock {
    value_type: DataType,
    reset_flag_type: DataType,
    reset_value_type: DataType,
}

impl BlockBehavior for DelayBlock {
    fn name(&self) -> &'static str {
        "Delay"
    }

    fn description(&self) -> &'static str {
        "Delays its input by one tick."
    }

    fn num_inputs(&self) -> usize {
        3
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn set_input_type(&mut self, port: usize, dt: DataType) -> ModelResult<()> {
        match port {
            0 => self.value_type = dt,
            1 => self.reset_flag_type = dt,
            2 => self.reset_value_type = dt,
            _ => return Err(ModelError::OutOfRange(format!("delay input port {port}"))),
        }
        Ok(())
    }

    fn output_type(&self, port: usize) -> ModelResult<DataType> {
        if port >= self.num_outputs() {
            return Err(ModelError::OutOfRange(format!("delay output port {port}")));
        }
        Ok(self.value_type)
    }

    fn update_block(&mut self) -> bool {
        false
    }

    fn has_error(&self) -> Option<String> {
        if self.value_type == DataType::NONE || self.reset_flag_type == DataType::NONE || self.reset_value_type == DataType::NONE {
            return Some("value, reset-flag, and reset-value inputs must all be connected".to_string());
        }
        if self.reset_flag_type != DataType::BOOL {
            return Some(format!("reset-flag must be BOOL, got {}", self.reset_flag_type));
        }
        if self.reset_value_type != self.value_type {
            return Some(format!(
                "reset-value must match the value input's type, got {} and {}",
                self.reset_value_type, self.value_type
            ));
        }
        None
    }

    fn parameters(&self) -> Vec<&Parameter> {
        Vec::new()
    }

    fn outputs_are_delayed(&self) -> bool {
        true
    }
}
