use blockgraph_types::DataType;

use crate::error::{ModelError, ModelResult};
use crate::parameter::Parameter;

use super::BlockBehavior;

/// Accumulates its value input over time with a forward-Euler step:
/// `out ← out + value · dt`, unless its reset-flag input is set, in which
/// case `out ← reset_value` instead. Ports are `[value, reset_flag,
/// reset_value]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct IntegratorBlock {
    value_type: DataType,
    reset_flag_type: DataType,
    reset_value_type: DataType,
}

impl BlockBehavior for IntegratorBlock {
    fn name(&self) -> &'static str {
        "Integrator"
    }

    fn description(&self) -> &'static str {
        "Integrates its input over time using a forward-Euler step."
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
            _ => return Err(ModelError::OutOfRange(format!("integrator input port {port}"))),
        }
        Ok(())
    }

    fn output_type(&self, port: usize) -> ModelResult<DataType> {
        if port >= self.num_outputs() {
            return Err(ModelError::OutOfRange(format!("integrator output port {port}")));
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
        if !self.value_type.is_float() {
            return Some("integrator requires a float value input".to_string());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_matching_reset_value_type() {
        let mut b = IntegratorBlock::default();
        b.set_input_type(0, DataType::F64).unwrap();
        b.set_input_type(1, DataType::BOOL).unwrap();
        b.set_input_type(2, DataType::I32).unwrap();
        assert!(b.has_error().is_some());
        b.set_input_type(2, DataType::F64).unwrap();
        assert!(b.has_error().is_none());
        assert_eq!(b.output_type(0).unwrap(), DataType::F64);
        assert!(b.outputs_are_delayed());
    }

    #[test]
    fn set_input_type_rejects_an_out_of_range_port() {
        let mut b = IntegratorBlock::default();
        assert!(b.set_input_type(3, DataType::F64).is_err());
    }
}
