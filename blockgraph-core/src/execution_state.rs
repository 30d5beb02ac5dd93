use std::collections::HashMap;

use crate::compiled::CompiledModel;
use crate::connection::Connection;
use crate::error::{ModelError, ModelResult};
use crate::variable::{ValueCell, VariableIdentifier};

/// Drives a [`CompiledModel`] through its run loop and layers a human-name
/// dictionary over its value cells for observability (dashboards, a
/// scripting console, codegen symbol tables).
///
/// Owns the iteration counter a `CompiledModel` itself has no notion of —
/// `get_current_time()` is derived from it rather than read off any block,
/// so it stays meaningful even in a model with no `Clock` block.
pub struct ExecutionState {
    compiled: CompiledModel,
    iterations: u64,
    names: HashMap<String, VariableIdentifier>,
}

impl ExecutionState {
    pub fn new(compiled: CompiledModel) -> Self {
        Self {
            compiled,
            iterations: 0,
            names: HashMap::new(),
        }
    }

    /// Runs every block once from its initial state. Does not touch the
    /// iteration counter.
    pub fn init(&mut self) -> ModelResult<()> {
        self.compiled.reset()
    }

    /// `init()`, plus resetting the iteration counter to zero.
    pub fn reset(&mut self) -> ModelResult<()> {
        self.init()?;
        self.iterations = 0;
        Ok(())
    }

    /// Advances the model by one `dt` and counts the iteration.
    pub fn step(&mut self) -> ModelResult<()> {
        self.compiled.step()?;
        self.iterations += 1;
        Ok(())
    }

    pub fn get_iterations(&self) -> u64 {
        self.iterations
    }

    pub fn get_current_time(&self) -> f64 {
        self.iterations as f64 * self.compiled.dt()
    }

    pub fn compiled(&self) -> &CompiledModel {
        &self.compiled
    }

    pub fn compiled_mut(&mut self) -> &mut CompiledModel {
        &mut self.compiled
    }

    /// Binds `name` directly to a block's output port. Fails with
    /// [`ModelError::Duplicate`] if the name is already bound.
    pub fn add_name_to_variable(&mut self, name: impl Into<String>, id: VariableIdentifier) -> ModelResult<()> {
        self.bind(name.into(), id)
    }

    /// Binds `name` to the cell behind a connection's source port — for
    /// naming a wire's value rather than a block's own output directly.
    pub fn add_name_to_interior_variable(&mut self, name: impl Into<String>, conn: &Connection) -> ModelResult<()> {
        self.bind(name.into(), VariableIdentifier::new(conn.from_block(), conn.from_port()))
    }

    fn bind(&mut self, name: String, id: VariableIdentifier) -> ModelResult<()> {
        if self.names.contains_key(&name) {
            return Err(ModelError::Duplicate(format!("variable name '{name}'")));
        }
        // Fail fast if the id doesn't resolve to a live cell, rather than
        // accepting a name that will only ever error at lookup time.
        self.compiled.variable_cell(id)?;
        self.names.insert(name, id);
        Ok(())
    }

    pub fn get_variable_for_name(&self, name: &str) -> ModelResult<ValueCell> {
        let id = self
            .names
            .get(name)
            .ok_or_else(|| ModelError::NotFound(format!("variable name '{name}'")))?;
        self.compiled.variable_cell(*id)
    }

    pub fn get_variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{ArithmeticBlock, ArithmeticOp, BlockLocation, BlockKind, ConstantBlock};
    use crate::compiled::compile;
    use crate::model::Model;
    use blockgraph_types::Value;

    fn adder_model() -> (Model, usize, usize, usize) {
        let mut m = Model::new("m", "", 0.01);
        let c1 = m.add_block(BlockLocation::default(), BlockKind::Constant(ConstantBlock::new(Value::F64(3.5))));
        let c2 = m.add_block(BlockLocation::default(), BlockKind::Constant(ConstantBlock::new(Value::F64(1.25))));
        let add = m.add_block(BlockLocation::default(), BlockKind::Arithmetic(ArithmeticBlock::new(ArithmeticOp::Add, 2)));
        m.add_connection(Connection::new(c1, 0, add, 0)).unwrap();
        m.add_connection(Connection::new(c2, 0, add, 1)).unwrap();
        (m, c1, c2, add)
    }

    #[test]
    fn step_advances_iterations_and_time() {
        let (mut m, _, _, _) = adder_model();
        let compiled = compile(&mut m).unwrap();
        let mut state = ExecutionState::new(compiled);
        state.reset().unwrap();
        assert_eq!(state.get_iterations(), 0);
        assert_eq!(state.get_current_time(), 0.0);

        state.step().unwrap();
        assert_eq!(state.get_iterations(), 1);
        assert!((state.get_current_time() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn reset_zeroes_the_iteration_counter() {
        let (mut m, _, _, _) = adder_model();
        let compiled = compile(&mut m).unwrap();
        let mut state = ExecutionState::new(compiled);
        state.reset().unwrap();
        state.step().unwrap();
        state.step().unwrap();
        assert_eq!(state.get_iterations(), 2);

        state.reset().unwrap();
        assert_eq!(state.get_iterations(), 0);
    }

    #[test]
    fn named_variables_round_trip_and_reject_duplicates() {
        let (mut m, _, _, add) = adder_model();
        let compiled = compile(&mut m).unwrap();
        let mut state = ExecutionState::new(compiled);
        state.reset().unwrap();
        state.step().unwrap();

        state.add_name_to_variable("sum", VariableIdentifier::new(add, 0)).unwrap();
        let cell = state.get_variable_for_name("sum").unwrap();
        assert_eq!(*cell.borrow(), Value::F64(4.75));

        assert!(matches!(
            state.add_name_to_variable("sum", VariableIdentifier::new(add, 0)),
            Err(ModelError::Duplicate(_))
        ));
        assert!(matches!(state.get_variable_for_name("missing"), Err(ModelError::NotFound(_))));
    }

    #[test]
    fn interior_names_resolve_through_a_connection() {
        let (mut m, c1, _, add) = adder_model();
        let conn = Connection::new(c1, 0, add, 0);
        let compiled = compile(&mut m).unwrap();
        let mut state = ExecutionState::new(compiled);
        state.reset().unwrap();

        state.add_name_to_interior_variable("lhs", &conn).unwrap();
        let cell = state.get_variable_for_name("lhs").unwrap();
        assert_eq!(*cell.borrow(), Value::F64(3.5));
    }

    #[test]
    fn variable_names_are_returned_sorted() {
        let (mut m, c1, c2, _) = adder_model();
        let compiled = compile(&mut m).unwrap();
        let mut state = ExecutionState::new(compiled);
        state.add_name_to_variable("zeta", VariableIdentifier::new(c1, 0)).unwrap();
        state.add_name_to_variable("alpha", VariableIdentifier::new(c2, 0)).unwrap();
        assert_eq!(state.get_variable_names(), vec!["alpha".to_string(), "zeta".to_string()]);
    }
}
