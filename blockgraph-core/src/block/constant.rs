use blockgraph_types::{DataType, Identifier, Value};

use crate::error::{ModelError, ModelResult};
use crate::parameter::{Parameter, ParameterKind};

use super::BlockBehavior;

/// Outputs a fixed value on every tick.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConstantBlock {
    value: Parameter,
}

impl ConstantBlock {
    pub fn new(value: Value) -> Self {
        Self {
            value: Parameter::new(Identifier::new("value").unwrap(), "value", ParameterKind::Value(value)),
        }
    }

    pub fn value(&self) -> Value {
        match self.value.kind() {
            ParameterKind::Value(v) => *v,
            _ => unreachable!("ConstantBlock always holds a Value parameter"),
        }
    }
}

impl BlockBehavior for ConstantBlock {
    fn name(&self) -> &'static str {
        "Constant"
    }

    fn description(&self) -> &'static str {
        "Outputs a fixed value on every tick."
    }

    fn num_inputs(&self) -> usize {
        0
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn set_input_type(&mut self, port: usize, _dt: DataType) -> ModelResult<()> {
        Err(ModelError::OutOfRange(format!("constant has no input port {port}")))
    }

    fn output_type(&self, port: usize) -> ModelResult<DataType> {
        if port >= self.num_outputs() {
            return Err(ModelError::OutOfRange(format!("constant output port {port}")));
        }
        Ok(self.value().data_type())
    }

    fn update_block(&mut self) -> bool {
        false
    }

    fn has_error(&self) -> Option<String> {
        if self.value().data_type() == DataType::NONE {
            Some("constant has no configured value type".to_string())
        } else {
            None
        }
    }

    fn parameters(&self) -> Vec<&Parameter> {
        vec![&self.value]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.value]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_its_configured_value_type() {
        let b = ConstantBlock::new(Value::F64(3.0));
        assert_eq!(b.output_type(0).unwrap(), DataType::F64);
        assert!(b.has_error().is_none());
    }

    #[test]
    fn rejects_an_out_of_range_port() {
        let mut b = ConstantBlock::new(Value::F64(3.0));
        assert!(b.set_input_type(0, DataType::F64).is_err());
        assert!(b.output_type(1).is_err());
    }
}
