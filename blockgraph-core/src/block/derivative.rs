use blockgraph_types::DataType;

use crate::error::{ModelError, ModelResult};
use crate::parameter::Parameter;

use super::BlockBehavior;

/// Outputs the rate of change of its value input: `out ← (value − last) /
/// dt`, resetting `last` (and forcing `out ← 0`) when its reset-flag input
/// is set. Ports are `[value, reset_flag]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct DerivativeBlock {
    value_type: DataType,
    reset_flag_type: DataType,
}

impl BlockBehavior for DerivativeBlock {
    fn name(&self) -> &'static str {
        "Derivative"
    }

    fn description(&self) -> &'static str {
        "Outputs the rate of change of its input."
    }

    fn num_inputs(&self) -> usize {
        2
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn set_input_type(&mut self, port: usize, dt: DataType) -> ModelResult<()> {
        match port {
            0 => self.value_type = dt,
            1 => self.reset_flag_type = dt,
            _ => return Err(ModelError::OutOfRange(format!("derivative input port {port}"))),
        }
        Ok(())
    }

    fn output_type(&self, port: usize) -> ModelResult<DataType> {
        if port >= self.num_outputs() {
            return Err(ModelError::OutOfRange(format!("derivative output port {port}")));
        }
        Ok(self.value_type)
    }

    fn update_block(&mut self) -> bool {
        false
    }

    fn has_error(&self) -> Option<String> {
        if self.value_type == DataType::NONE || self.reset_flag_type == DataType::NONE {
            return Some("value and reset-flag inputs must both be connected".to_string());
        }
        if !self.value_type.is_float() {
            return Some("derivative requires a float value input".to_string());
        }
        if self.reset_flag_type != DataType::BOOL {
            return Some(format!("reset-flag must be BOOL, got {}", self.reset_flag_type));
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
    fn requires_a_bool_reset_flag() {
        let mut b = DerivativeBlock::default();
        b.set_input_type(0, DataType::F64).unwrap();
        b.set_input_type(1, DataType::F64).unwrap();
        assert!(b.has_error().is_some());
        b.set_input_type(1, DataType::BOOL).unwrap();
        assert!(b.has_error().is_none());
        assert_eq!(b.output_type(0).unwrap(), DataType::F64);
    }

    #[test]
    fn set_input_type_rejects_an_out_of_range_port() {
        let mut b = DerivativeBlock::default();
        assert!(b.set_input_type(2, DataType::F64).is_err());
    }
}
