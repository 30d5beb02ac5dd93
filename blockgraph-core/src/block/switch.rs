use blockgraph_types::DataType;

use crate::error::{ModelError, ModelResult};
use crate::parameter::Parameter;

use super::BlockBehavior;

/// Selects between two same-typed data inputs based on a `BOOL` control
/// input: `output = control ? data_true : data_false`.
///
/// Port order is `[data_true, control, data_false]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct SwitchBlock {
    true_type: DataType,
    control_type: DataType,
    false_type: DataType,
}

impl BlockBehavior for SwitchBlock {
    fn name(&self) -> &'static str {
        "Switch"
    }

    fn description(&self) -> &'static str {
        "Selects between two inputs based on a boolean control input."
    }

    fn num_inputs(&self) -> usize {
        3
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn set_input_type(&mut self, port: usize, dt: DataType) -> ModelResult<()> {
        match port {
            0 => self.true_type = dt,
            1 => self.control_type = dt,
            2 => self.false_type = dt,
            _ => return Err(ModelError::OutOfRange(format!("switch input port {port}"))),
        }
        Ok(())
    }

    fn output_type(&self, port: usize) -> ModelResult<DataType> {
        if port >= self.num_outputs() {
            return Err(ModelError::OutOfRange(format!("switch output port {port}")));
        }
        Ok(self.true_type)
    }

    fn update_block(&mut self) -> bool {
        false
    }

    fn has_error(&self) -> Option<String> {
        if self.true_type == DataType::NONE || self.control_type == DataType::NONE || self.false_type == DataType::NONE {
            return Some("all three inputs must be connected".to_string());
        }
        if self.control_type != DataType::BOOL {
            return Some(format!("control input must be BOOL, got {}", self.control_type));
        }
        if self.true_type != self.false_type {
            return Some(format!(
                "data inputs must share a type, got {} and {}",
                self.true_type, self.false_type
            ));
        }
        None
    }

    fn parameters(&self) -> Vec<&Parameter> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_a_bool_control_input() {
        let mut b = SwitchBlock::default();
        b.set_input_type(0, DataType::F64).unwrap();
        b.set_input_type(1, DataType::F64).unwrap();
        b.set_input_type(2, DataType::F64).unwrap();
        assert!(b.has_error().is_some());

        b.set_input_type(1, DataType::BOOL).unwrap();
        assert!(b.has_error().is_none());
        assert_eq!(b.output_type(0).unwrap(), DataType::F64);
    }

    #[test]
    fn set_input_type_rejects_an_out_of_range_port() {
        let mut b = SwitchBlock::default();
        assert!(b.set_input_type(3, DataType::F64).is_err());
    }
}
