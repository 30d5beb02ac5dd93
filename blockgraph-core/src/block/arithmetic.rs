use blockgraph_types::{DataType, Identifier, Value};
use strum::{Display, EnumString};

use crate::error::{ModelError, ModelResult};
use crate::parameter::{Parameter, ParameterKind};

use super::BlockBehavior;

/// The arithmetic operation an [`ArithmeticBlock`] applies across its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, serde::Serialize, serde::Deserialize)]
pub enum ArithmeticOp {
    /// Sums every input.
    Add,
    /// Subtracts every input after the first from the first.
    Subtract,
    /// Multiplies every input together.
    Multiply,
    /// Divides the first input by every input after it, in order.
    Divide,
}

/// Applies a single arithmetic operation across a variable number of
/// same-typed inputs.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArithmeticBlock {
    op: ArithmeticOp,
    num_inputs: Parameter,
    input_types: Vec<DataType>,
    output_type: DataType,
}

impl ArithmeticBlock {
    pub fn new(op: ArithmeticOp, num_inputs: usize) -> Self {
        let mut block = Self {
            op,
            num_inputs: Parameter::new(
                Identifier::new("num_inputs").unwrap(),
                "number of input ports",
                ParameterKind::Value(Value::U32(num_inputs as u32)),
            ),
            input_types: vec![DataType::NONE; num_inputs],
            output_type: DataType::NONE,
        };
        block.update_block();
        block
    }

    pub fn op(&self) -> ArithmeticOp {
        self.op
    }

    fn configured_num_inputs(&self) -> usize {
        match self.num_inputs.kind() {
            ParameterKind::Value(Value::U32(n)) => *n as usize,
            _ => unreachable!("ArithmeticBlock::num_inputs is always a U32 value parameter"),
        }
    }
}

impl BlockBehavior for ArithmeticBlock {
    fn name(&self) -> &'static str {
        "Arithmetic"
    }

    fn description(&self) -> &'static str {
        "Applies an arithmetic operation across a variable number of inputs."
    }

    fn num_inputs(&self) -> usize {
        self.configured_num_inputs()
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn set_input_type(&mut self, port: usize, dt: DataType) -> ModelResult<()> {
        match self.input_types.get_mut(port) {
            Some(slot) => {
                *slot = dt;
                Ok(())
            }
            None => Err(ModelError::OutOfRange(format!("arithmetic input port {port}"))),
        }
    }

    fn output_type(&self, port: usize) -> ModelResult<DataType> {
        if port >= self.num_outputs() {
            return Err(ModelError::OutOfRange(format!("arithmetic output port {port}")));
        }
        Ok(self.output_type)
    }

    fn update_block(&mut self) -> bool {
        let mut changed = false;

        let wanted = self.configured_num_inputs();
        if self.input_types.len() != wanted {
            self.input_types.resize(wanted, DataType::NONE);
            changed = true;
        }

        let first_known = self
            .input_types
            .iter()
            .copied()
            .find(|dt| *dt != DataType::NONE)
            .unwrap_or(DataType::NONE);

        if self.output_type != first_known {
            self.output_type = first_known;
            changed = true;
        }

        changed
    }

    fn has_error(&self) -> Option<String> {
        if self.configured_num_inputs() < 2 {
            return Some("arithmetic requires at least 2 inputs".to_string());
        }
        if self.input_types.iter().any(|dt| *dt == DataType::NONE) {
            return Some("every input must be connected".to_string());
        }
        if self.input_types.iter().any(|dt| !dt.is_numeric()) {
            return Some(format!("arithmetic requires numeric inputs, got {}", self.output_type));
        }
        if self.input_types.iter().any(|dt| *dt != self.output_type) {
            return Some("every input must share the same type".to_string());
        }
        None
    }

    fn parameters(&self) -> Vec<&Parameter> {
        vec![&self.num_inputs]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.num_inputs]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_type_follows_first_known_input() {
        let mut b = ArithmeticBlock::new(ArithmeticOp::Add, 2);
        assert!(b.has_error().is_some());
        b.set_input_type(1, DataType::F64).unwrap();
        b.update_block();
        assert_eq!(b.output_type(0).unwrap(), DataType::F64);
        // port 0 is still unconnected, so the block remains in error until
        // every input is.
        assert!(b.has_error().is_some());
        b.set_input_type(0, DataType::F64).unwrap();
        b.update_block();
        assert!(b.has_error().is_none());
    }

    #[test]
    fn set_input_type_rejects_an_out_of_range_port() {
        let mut b = ArithmeticBlock::new(ArithmeticOp::Add, 2);
        assert!(b.set_input_type(2, DataType::F64).is_err());
    }

    #[test]
    fn has_error_rejects_fewer_than_two_inputs_and_mismatched_types() {
        let mut too_few = ArithmeticBlock::new(ArithmeticOp::Add, 1);
        too_few.set_input_type(0, DataType::F64).unwrap();
        too_few.update_block();
        assert!(too_few.has_error().is_some());

        let mut mismatched = ArithmeticBlock::new(ArithmeticOp::Add, 2);
        mismatched.set_input_type(0, DataType::F64).unwrap();
        mismatched.set_input_type(1, DataType::I32).unwrap();
        mismatched.update_block();
        assert!(mismatched.has_error().is_some());

        let mut boolean = ArithmeticBlock::new(ArithmeticOp::Add, 2);
        boolean.set_input_type(0, DataType::BOOL).unwrap();
        boolean.set_input_type(1, DataType::BOOL).unwrap();
        boolean.update_block();
        assert!(boolean.has_error().is_some());
    }

    #[test]
    fn resizing_num_inputs_reports_a_change() {
        let mut b = ArithmeticBlock::new(ArithmeticOp::Multiply, 2);
        b.num_inputs = Parameter::new(Identifier::new("num_inputs").unwrap(), "n", ParameterKind::Value(Value::U32(3)));
        assert!(b.update_block());
        assert_eq!(b.num_inputs(), 3);
    }
}
