use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use blockgraph_types::{DataType, Value};

use crate::block::{Block, BlockKind};
use crate::connection::{Connection, ConnectionManager};
use crate::error::{ModelError, ModelResult};
use crate::model::Model;
use crate::scheduler;
use crate::variable::{ValueCell, VariableIdentifier, VariableManager};

/// Per-block runtime state for the handful of block kinds that carry memory
/// across ticks. Everything else is purely a function of its current
/// inputs and needs nothing here.
#[derive(Debug, Clone)]
enum RuntimeState {
    Stateless,
    Integrator { accumulator: Value },
    Derivative { last_input: Option<Value> },
    Delay { next: Value },
    Clock { time: f64 },
}

/// A model that has passed type propagation and scheduling and is ready to
/// run. Owns its own snapshot of the blocks, connections, and one value
/// cell per output port — independent of the [`Model`] it was compiled
/// from, so the source model can keep being edited afterwards.
pub struct CompiledModel {
    dt: f64,
    order: Vec<usize>,
    blocks: Vec<Block>,
    connections: ConnectionManager,
    variables: VariableManager,
    runtime: HashMap<usize, RuntimeState>,
    output_port_values: HashMap<usize, Value>,
    model_inputs: Vec<usize>,
    model_outputs: Vec<usize>,
}

/// Runs `model`'s blocks through type propagation and scheduling, builds a
/// value cell for every output port, and seeds per-block runtime state.
/// Fails with [`ModelError::CompileError`] if the model has outstanding
/// block errors, or with whatever [`Model::propagate_types`] /
/// [`scheduler::schedule`] returned.
pub fn compile(model: &mut Model) -> ModelResult<CompiledModel> {
    model.propagate_types()?;

    if model.has_error() {
        let first = model.get_all_errors().into_iter().next().expect("has_error implies a non-empty error list");
        log::warn!("compile aborted, model '{}' has outstanding block errors: {first}", model.name());
        return Err(ModelError::CompileError(first.to_string()));
    }

    let order = scheduler::schedule(model)?;

    let mut variables = VariableManager::new();
    let mut runtime = HashMap::new();

    for block in model.blocks() {
        for port in 0..block.num_outputs() {
            let dt = block.output_type(port)?;
            let cell = Rc::new(RefCell::new(Value::make_default(dt)));
            variables
                .add_variable(VariableIdentifier::new(block.id(), port), cell)
                .map_err(|e| ModelError::CompileError(e.to_string()))?;
        }

        let state = match block.kind() {
            BlockKind::Integrator(_) => RuntimeState::Integrator {
                accumulator: Value::make_default(block.output_type(0)?),
            },
            BlockKind::Derivative(_) => RuntimeState::Derivative { last_input: None },
            BlockKind::Delay(_) => RuntimeState::Delay {
                next: Value::make_default(block.output_type(0)?),
            },
            BlockKind::Clock(_) => RuntimeState::Clock { time: 0.0 },
            _ => RuntimeState::Stateless,
        };
        runtime.insert(block.id(), state);
    }

    Ok(CompiledModel {
        dt: model.dt(),
        order,
        blocks: model.blocks().to_vec(),
        connections: model.connections().clone(),
        variables,
        runtime,
        output_port_values: HashMap::new(),
        model_inputs: model.model_inputs().to_vec(),
        model_outputs: model.model_outputs().to_vec(),
    })
}

impl CompiledModel {
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn model_inputs(&self) -> &[usize] {
        &self.model_inputs
    }

    pub fn model_outputs(&self) -> &[usize] {
        &self.model_outputs
    }

    fn get_block(&self, id: usize) -> &Block {
        self.blocks.iter().find(|b| b.id() == id).expect("compiled order only references known blocks")
    }

    /// Writes directly to an `InputPort` block's output cell. This is how a
    /// host feeds external data into the model between ticks.
    pub fn set_input_port_value(&mut self, block_id: usize, value: Value) -> ModelResult<()> {
        let cell = self.variables.get_ptr(&VariableIdentifier::new(block_id, 0))?;
        *cell.borrow_mut() = value;
        Ok(())
    }

    /// Reads the last value an `OutputPort` block received.
    pub fn output_port_value(&self, block_id: usize) -> Option<Value> {
        self.output_port_values.get(&block_id).copied()
    }

    fn pull_inputs(&self, block: &Block) -> ModelResult<Vec<Value>> {
        let mut inputs = Vec::with_capacity(block.num_inputs());
        for port in 0..block.num_inputs() {
            let value = match self.connections.get_connection_to(block.id(), port) {
                Some(c) => *self.variables.get_ptr_for_connection(c)?.borrow(),
                None => Value::None,
            };
            inputs.push(value);
        }
        Ok(inputs)
    }

    fn push_output(&mut self, block: &Block, port: usize, value: Value) -> ModelResult<()> {
        let cell = self.variables.get_ptr(&VariableIdentifier::new(block.id(), port))?;
        *cell.borrow_mut() = value;
        Ok(())
    }

    fn tick(&mut self, is_reset: bool) -> ModelResult<()> {
        for id in self.order.clone() {
            let block = self.get_block(id).clone();
            let inputs = self.pull_inputs(&block)?;

            if let BlockKind::OutputPort(_) = block.kind() {
                self.output_port_values.insert(id, inputs.first().copied().unwrap_or(Value::None));
                continue;
            }
            if let BlockKind::InputPort(_) = block.kind() {
                continue;
            }

            let dt = self.dt;
            let mut state = self.runtime.remove(&id).unwrap_or(RuntimeState::Stateless);
            let outputs = compute(&block, &inputs, &mut state, dt, is_reset);
            self.runtime.insert(id, state);

            for (port, value) in outputs.into_iter().enumerate() {
                self.push_output(&block, port, value)?;
            }
        }
        Ok(())
    }

    /// Runs every block once from its initial state: `pull`, a reset-mode
    /// `compute` (stateful blocks emit their initial condition rather than
    /// integrating/differencing), then `push`.
    pub fn reset(&mut self) -> ModelResult<()> {
        for state in self.runtime.values_mut() {
            if let RuntimeState::Clock { time } = state {
                *time = 0.0;
            }
        }
        self.tick(true)
    }

    /// Runs every block forward by one `dt`: `pull`, `compute`, `push`.
    pub fn step(&mut self) -> ModelResult<()> {
        self.tick(false)
    }

    pub fn current_time(&self) -> f64 {
        self.runtime
            .values()
            .find_map(|s| match s {
                RuntimeState::Clock { time } => Some(*time),
                _ => None,
            })
            .unwrap_or(0.0)
    }

    /// The cell backing a block's output port directly, by id.
    pub fn variable_cell(&self, id: VariableIdentifier) -> ModelResult<ValueCell> {
        self.variables.get_ptr(&id)
    }

    /// The cell backing a connection's source output port.
    pub fn variable_cell_for_connection(&self, c: &Connection) -> ModelResult<ValueCell> {
        self.variables.get_ptr_for_connection(c)
    }
}

fn reduce_numeric(values: &[Value], dt: DataType, fold: impl Fn(f64, f64) -> f64, identity: f64) -> Value {
    let mut acc = None;
    for v in values {
        acc = Some(match acc {
            None => v.as_f64(),
            Some(a) => fold(a, v.as_f64()),
        });
    }
    Value::from_f64(acc.unwrap_or(identity), dt)
}

fn compute(block: &Block, inputs: &[Value], state: &mut RuntimeState, dt: f64, is_reset: bool) -> Vec<Value> {
    match block.kind() {
        BlockKind::Constant(b) => vec![b.value()],

        BlockKind::Arithmetic(b) => {
            use crate::block::ArithmeticOp::*;
            let out_type = block.output_type(0).expect("compiled model already validated this block's port range");
            let value = match b.op() {
                Add => reduce_numeric(inputs, out_type, |a, x| a + x, 0.0),
                Multiply => reduce_numeric(inputs, out_type, |a, x| a * x, 1.0),
                Subtract => {
                    let mut iter = inputs.iter();
                    let first = iter.next().map(|v| v.as_f64()).unwrap_or(0.0);
                    Value::from_f64(iter.fold(first, |a, x| a - x.as_f64()), out_type)
                }
                Divide => {
                    let mut iter = inputs.iter();
                    let first = iter.next().map(|v| v.as_f64()).unwrap_or(0.0);
                    Value::from_f64(iter.fold(first, |a, x| a / x.as_f64()), out_type)
                }
            };
            vec![value]
        }

        BlockKind::Relational(b) => {
            use crate::block::RelationalOp::*;
            let lhs = inputs.first().map(|v| v.as_f64()).unwrap_or(0.0);
            let rhs = inputs.get(1).map(|v| v.as_f64()).unwrap_or(0.0);
            let result = match b.op() {
                Equal => lhs == rhs,
                NotEqual => lhs != rhs,
                GreaterThan => lhs > rhs,
                GreaterOrEqual => lhs >= rhs,
                LessThan => lhs < rhs,
                LessOrEqual => lhs <= rhs,
            };
            vec![Value::Bool(result)]
        }

        BlockKind::Trig(b) => {
            use crate::block::TrigOp::*;
            let x = inputs.first().map(|v| v.as_f64()).unwrap_or(0.0);
            let y = inputs.get(1).map(|v| v.as_f64()).unwrap_or(0.0);
            let result = match b.op() {
                Sin => x.sin(),
                Cos => x.cos(),
                Tan => x.tan(),
                Asin => x.asin(),
                Acos => x.acos(),
                Atan => x.atan(),
                Atan2 => x.atan2(y),
            };
            vec![Value::from_f64(result, block.output_type(0).expect("compiled model already validated this block's port range"))]
        }

        BlockKind::Clock(_) => {
            let RuntimeState::Clock { time } = state else {
                unreachable!("Clock blocks always carry Clock runtime state")
            };
            if !is_reset {
                *time += dt;
            }
            vec![Value::F64(*time)]
        }

        BlockKind::Integrator(_) => {
            // Ports: [value, reset_flag, reset_value].
            let RuntimeState::Integrator { accumulator } = state else {
                unreachable!("Integrator blocks always carry Integrator runtime state")
            };
            let reset_flag = matches!(inputs.get(1), Some(Value::Bool(true)));
            if is_reset || reset_flag {
                *accumulator = inputs.get(2).copied().unwrap_or(*accumulator);
            } else {
                let rate = inputs.first().map(|v| v.as_f64()).unwrap_or(0.0);
                *accumulator = Value::from_f64(accumulator.as_f64() + rate * dt, accumulator.data_type());
            }
            vec![*accumulator]
        }

        BlockKind::Derivative(_) => {
            // Ports: [value, reset_flag].
            let RuntimeState::Derivative { last_input } = state else {
                unreachable!("Derivative blocks always carry Derivative runtime state")
            };
            let current = inputs.first().copied().unwrap_or(Value::F64(0.0));
            let reset_flag = matches!(inputs.get(1), Some(Value::Bool(true)));
            let result = if is_reset || reset_flag {
                0.0
            } else {
                match last_input {
                    Some(prev) => (current.as_f64() - prev.as_f64()) / dt,
                    None => 0.0,
                }
            };
            *last_input = Some(current);
            vec![Value::from_f64(result, block.output_type(0).expect("compiled model already validated this block's port range"))]
        }

        BlockKind::Delay(_) => {
            // Ports: [value, reset_flag, reset_value]. Engine-level reset sets
            // `next` from the reset-value input and emits it; a step-level
            // reset-flag substitutes the reset value for just this tick's
            // emission but `next` always advances to the current value input
            // afterward, per the block's own step semantics.
            let RuntimeState::Delay { next } = state else {
                unreachable!("Delay blocks always carry Delay runtime state")
            };
            if is_reset {
                *next = inputs.get(2).copied().unwrap_or(*next);
                vec![*next]
            } else {
                let reset_flag = matches!(inputs.get(1), Some(Value::Bool(true)));
                if reset_flag {
                    *next = inputs.get(2).copied().unwrap_or(*next);
                }
                let emitted = *next;
                *next = inputs.first().copied().unwrap_or(*next);
                vec![emitted]
            }
        }

        BlockKind::Limiter(b) => {
            let x = inputs.first().map(|v| v.as_f64()).unwrap_or(0.0);
            let (max, min) = if b.is_dynamic() {
                (
                    inputs.get(1).map(|v| v.as_f64()).unwrap_or(f64::INFINITY),
                    inputs.get(2).map(|v| v.as_f64()).unwrap_or(f64::NEG_INFINITY),
                )
            } else {
                let params = block.parameters();
                let max = params.iter().find(|p| p.id().as_str() == "max").map(|p| match p.kind() {
                    crate::parameter::ParameterKind::Value(v) => v.as_f64(),
                    _ => f64::INFINITY,
                });
                let min = params.iter().find(|p| p.id().as_str() == "min").map(|p| match p.kind() {
                    crate::parameter::ParameterKind::Value(v) => v.as_f64(),
                    _ => f64::NEG_INFINITY,
                });
                (max.unwrap_or(f64::INFINITY), min.unwrap_or(f64::NEG_INFINITY))
            };
            vec![Value::from_f64(x.clamp(min, max), block.output_type(0).expect("compiled model already validated this block's port range"))]
        }

        BlockKind::Switch(_) => {
            let on_true = inputs.first().copied().unwrap_or(Value::None);
            let control = matches!(inputs.get(1), Some(Value::Bool(true)));
            let on_false = inputs.get(2).copied().unwrap_or(Value::None);
            vec![if control { on_true } else { on_false }]
        }

        BlockKind::InputPort(_) | BlockKind::OutputPort(_) => Vec::new(),

        BlockKind::SubModel(_) => (0..block.num_outputs())
            .map(|p| Value::make_default(block.output_type(p).expect("compiled model already validated this block's port range")))
            .collect(),
    }
}
