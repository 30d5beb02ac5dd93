use blockgraph_types::DataType;
use strum::{Display, EnumString};

use crate::error::{ModelError, ModelResult};
use crate::parameter::Parameter;

use super::BlockBehavior;

/// The trigonometric function a [`TrigBlock`] applies to its input(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, serde::Serialize, serde::Deserialize)]
pub enum TrigOp {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    /// Binary: `atan2(y, x)` over two same-typed float inputs.
    Atan2,
}

impl TrigOp {
    fn is_binary(self) -> bool {
        matches!(self, TrigOp::Atan2)
    }
}

/// Applies a trigonometric function, element-wise, to a float input. `Atan2`
/// is binary and also reads a second, same-typed input.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrigBlock {
    op: TrigOp,
    input_type: DataType,
    rhs_type: DataType,
}

impl TrigBlock {
    pub fn new(op: TrigOp) -> Self {
        Self {
            op,
            input_type: DataType::NONE,
            rhs_type: DataType::NONE,
        }
    }

    pub fn op(&self) -> TrigOp {
        self.op
    }
}

impl BlockBehavior for TrigBlock {
    fn name(&self) -> &'static str {
        "Trig"
    }

    fn description(&self) -> &'static str {
        "Applies a trigonometric function to its input."
    }

    fn num_inputs(&self) -> usize {
        if self.op.is_binary() {
            2
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
            1 if self.op.is_binary() => self.rhs_type = dt,
            _ => return Err(ModelError::OutOfRange(format!("trig input port {port}"))),
        }
        Ok(())
    }

    fn output_type(&self, port: usize) -> ModelResult<DataType> {
        if port >= self.num_outputs() {
            return Err(ModelError::OutOfRange(format!("trig output port {port}")));
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
        if !self.input_type.is_float() {
            return Some(format!("{} requires a float input, got {}", self.op, self.input_type));
        }
        if self.op.is_binary() {
            if self.rhs_type == DataType::NONE {
                return Some("second input is not connected".to_string());
            }
            if self.rhs_type != self.input_type {
                return Some(format!(
                    "{} requires inputs of the same type, got {} and {}",
                    self.op, self.input_type, self.rhs_type
                ));
            }
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
    fn requires_a_float_input() {
        let mut b = TrigBlock::new(TrigOp::Sin);
        b.set_input_type(0, DataType::I32).unwrap();
        assert!(b.has_error().is_some());
        b.set_input_type(0, DataType::F64).unwrap();
        assert!(b.has_error().is_none());
        assert_eq!(b.output_type(0).unwrap(), DataType::F64);
    }

    #[test]
    fn atan2_is_binary_and_requires_matching_types() {
        let mut b = TrigBlock::new(TrigOp::Atan2);
        assert_eq!(b.num_inputs(), 2);
        b.set_input_type(0, DataType::F64).unwrap();
        assert!(b.has_error().is_some());
        b.set_input_type(1, DataType::I32).unwrap();
        assert!(b.has_error().is_some());
        b.set_input_type(1, DataType::F64).unwrap();
        assert!(b.has_error().is_none());
    }

    #[test]
    fn unary_trig_rejects_a_second_input_port() {
        let mut b = TrigBlock::new(TrigOp::Sin);
        assert!(b.set_input_type(1, DataType::F64).is_err());
    }
}
