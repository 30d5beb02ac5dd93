use blockgraph_types::DataType;
use strum::{Display, EnumString};

use crate::error::{ModelError, ModelResult};
use crate::parameter::Parameter;

use super::BlockBehavior;

/// The comparison a [`RelationalBlock`] performs between its two inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, serde::Serialize, serde::Deserialize)]
pub enum RelationalOp {
    /// Check if the two inputs are equal.
    Equal,
    /// Check if the two inputs are not equal.
    NotEqual,
    /// Check if the first input is greater than the second.
    GreaterThan,
    /// Check if the first input is greater than or equal to the second.
    GreaterOrEqual,
    /// Check if the first input is less than the second.
    LessThan,
    /// Check if the first input is less than or equal to the second.
    LessOrEqual,
}

/// Compares two same-typed inputs, producing a `BOOL` output.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RelationalBlock {
    op: RelationalOp,
    lhs_type: DataType,
    rhs_type: DataType,
}

impl RelationalBlock {
    pub fn new(op: RelationalOp) -> Self {
        Self {
            op,
            lhs_type: DataType::NONE,
            rhs_type: DataType::NONE,
        }
    }

    pub fn op(&self) -> RelationalOp {
        self.op
    }
}

impl BlockBehavior for RelationalBlock {
    fn name(&self) -> &'static str {
        "Relational"
    }

    fn description(&self) -> &'static str {
        "Compares two inputs and outputs a boolean."
    }

    fn num_inputs(&self) -> usize {
        2
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn set_input_type(&mut self, port: usize, dt: DataType) -> ModelResult<()> {
        match port {
            0 => self.lhs_type = dt,
            1 => self.rhs_type = dt,
            _ => return Err(ModelError::OutOfRange(format!("relational input port {port}"))),
        }
        Ok(())
    }

    fn output_type(&self, port: usize) -> ModelResult<DataType> {
        if port >= self.num_outputs() {
            return Err(ModelError::OutOfRange(format!("relational output port {port}")));
        }
        Ok(DataType::BOOL)
    }

    fn update_block(&mut self) -> bool {
        false
    }

    fn has_error(&self) -> Option<String> {
        if self.lhs_type == DataType::NONE || self.rhs_type == DataType::NONE {
            return Some("both inputs must be connected".to_string());
        }
        if self.lhs_type != self.rhs_type {
            return Some(format!(
                "inputs must share a type, got {} and {}",
                self.lhs_type, self.rhs_type
            ));
        }
        let ordered = matches!(
            self.op,
            RelationalOp::GreaterThan | RelationalOp::GreaterOrEqual | RelationalOp::LessThan | RelationalOp::LessOrEqual
        );
        if ordered && !self.lhs_type.is_numeric() {
            return Some(format!("{} requires numeric inputs, got {}", self.op, self.lhs_type));
        }
        None
    }

    fn parameters(&self) -> Vec<&Parameter> {
        Vec::new()
    }
}
