use blockgraph_types::{DataType, Identifier, Value};

use crate::error::{ModelError, ModelResult};
use crate::parameter::{Parameter, ParameterKind};

use super::BlockBehavior;

/// Clamps its signal input between a minimum and maximum. `dynamic` controls
/// whether the bounds come in as additional inputs (`max`, `min`) or are
/// fixed parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LimiterBlock {
    dynamic: Parameter,
    max_value: Parameter,
    min_value: Parameter,
    input_type: DataType,
    max_type: DataType,
    min_type: DataType,
}

impl LimiterBlock {
    pub fn new(dynamic: bool, max_value: Value, min_value: Value) -> Self {
        Self {
            dynamic: Parameter::new(Identifier::new("dynamic").unwrap(), "dynamic limits", ParameterKind::Value(Value::Bool(dynamic))),
            max_value: Parameter::new(Identifier::new("max").unwrap(), "maximum", ParameterKind::Value(max_value)),
            min_value: Parameter::new(Identifier::new("min").unwrap(), "minimum", ParameterKind::Value(min_value)),
            input_type: DataType::NONE,
            max_type: DataType::NONE,
            min_type: DataType::NONE,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        match self.dynamic.kind() {
            ParameterKind::Value(Value::Bool(b)) => *b,
            _ => unreachable!("LimiterBlock::dynamic is always a Bool value parameter"),
        }
    }
}

impl BlockBehavior for LimiterBlock {
    fn name(&self) -> &'static str {
        "Limiter"
    }

    fn description(&self) -> &'static str {
        "Clamps its input between a minimum and maximum."
    }

    fn num_inputs(&self) -> usize {
        if self.is_dynamic() {
            3
        } else {
            1
        }
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn set_input_type(&mut self, port: usize, dt: DataType) -> ModelResult<()> {
        match port {
            0 => self.input_type = dt,
            1 if self.is_dynamic() => self.max_type = dt,
            2 if self.is_dynamic() => self.min_type = dt,
            _ => return Err(ModelError::OutOfRange(format!("limiter input port {port}"))),
        }
        Ok(())
    }

    fn output_type(&self, port: usize) -> ModelResult<DataType> {
        if port >= self.num_outputs() {
            return Err(ModelError::OutOfRange(format!("limiter output port {port}")));
        }
        Ok(self.input_type)
    }

    fn update_block(&mut self) -> bool {
        false
    }

    fn has_error(&self) -> Option<String> {
        if self.input_type == DataType::NONE {
            return Some("input is not connected".to_string());
        }
        if !self.input_type.is_numeric() {
            return Some("limiter requires a numeric input".to_string());
        }
        if self.is_dynamic() && (self.max_type != self.input_type || self.min_type != self.input_type) {
            return Some("dynamic min/max inputs must match the signal's type".to_string());
        }
        None
    }

    fn parameters(&self) -> Vec<&Parameter> {
        vec![&self.dynamic, &self.max_value, &self.min_value]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.dynamic, &mut self.max_value, &mut self.min_value]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_limiter_takes_a_single_input() {
        let mut b = LimiterBlock::new(false, Value::F64(10.0), Value::F64(-10.0));
        assert_eq!(b.num_inputs(), 1);
        b.set_input_type(0, DataType::F64).unwrap();
        assert!(b.has_error().is_none());
    }

    #[test]
    fn static_limiter_rejects_a_second_input_port() {
        let mut b = LimiterBlock::new(false, Value::F64(10.0), Value::F64(-10.0));
        assert!(b.set_input_type(1, DataType::F64).is_err());
    }

    #[test]
    fn dynamic_limiter_requires_matching_bound_types() {
        let mut b = LimiterBlock::new(true, Value::F64(0.0), Value::F64(0.0));
        assert_eq!(b.num_inputs(), 3);
        b.set_input_type(0, DataType::F64).unwrap();
        b.set_input_type(1, DataType::I32).unwrap();
        b.set_input_type(2, DataType::F64).unwrap();
        assert!(b.has_error().is_some());
    }
}
