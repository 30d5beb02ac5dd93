use blockgraph_types::{DataType, Identifier};

use crate::error::{ModelError, ModelResult};
use crate::parameter::{Parameter, ParameterKind};

use super::BlockBehavior;

/// A model-level input: has no inputs of its own within the graph and
/// outputs whatever `DataType` it's configured with. Connects a value
/// supplied from outside the model into the graph.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputPortBlock {
    port_type: Parameter,
}

impl InputPortBlock {
    pub fn new(dt: DataType) -> Self {
        Self {
            port_type: Parameter::new(Identifier::new("port_type").unwrap(), "type", ParameterKind::DataType(dt)),
        }
    }

    pub fn configured_type(&self) -> DataType {
        match self.port_type.kind() {
            ParameterKind::DataType(dt) => *dt,
            _ => unreachable!("InputPortBlock::port_type is always a DataType parameter"),
        }
    }
}

impl BlockBehavior for InputPortBlock {
    fn name(&self) -> &'static str {
        "InputPort"
    }

    fn description(&self) -> &'static str {
        "A model-level input port."
    }

    fn num_inputs(&self) -> usize {
        0
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn set_input_type(&mut self, port: usize, _dt: DataType) -> ModelResult<()> {
        Err(ModelError::OutOfRange(format!("input port has no input port {port}")))
    }

    fn output_type(&self, port: usize) -> ModelResult<DataType> {
        if port >= self.num_outputs() {
            return Err(ModelError::OutOfRange(format!("input port output port {port}")));
        }
        Ok(self.configured_type())
    }

    fn update_block(&mut self) -> bool {
        false
    }

    fn has_error(&self) -> Option<String> {
        if self.configured_type() == DataType::NONE {
            Some("input port has no configured type".to_string())
        } else {
            None
        }
    }

    fn parameters(&self) -> Vec<&Parameter> {
        vec![&self.port_type]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.port_type]
    }
}

/// A model-level output: takes one input and exposes it outside the model,
/// contributing no output of its own to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct OutputPortBlock {
    input_type: DataType,
}

impl BlockBehavior for OutputPortBlock {
    fn name(&self) -> &'static str {
        "OutputPort"
    }

    fn description(&self) -> &'static str {
        "A model-level output port."
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        0
    }

    fn set_input_type(&mut self, port: usize, dt: DataType) -> ModelResult<()> {
        if port != 0 {
            return Err(ModelError::OutOfRange(format!("output port input port {port}")));
        }
        self.input_type = dt;
        Ok(())
    }

    fn output_type(&self, port: usize) -> ModelResult<DataType> {
        Err(ModelError::OutOfRange(format!("output port has no output port {port}")))
    }

    fn update_block(&mut self) -> bool {
        false
    }

    fn has_error(&self) -> Option<String> {
        if self.input_type == DataType::NONE {
            Some("output port input is not connected".to_string())
        } else {
            None
        }
    }

    fn parameters(&self) -> Vec<&Parameter> {
        Vec::new()
    }
}

impl OutputPortBlock {
    pub fn input_type(&self) -> DataType {
        self.input_type
    }
}
