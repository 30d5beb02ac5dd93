use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use blockgraph_types::Value;

use crate::connection::Connection;
use crate::error::ModelError;

/// A shared, mutable value cell. Every output port owns exactly one of
/// these; everything downstream reads through a cloned `Rc`.
pub type ValueCell = Rc<RefCell<Value>>;

/// Identifies a block's output port as a variable: the thing a
/// [`Connection`] points *from*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableIdentifier {
    pub block_id: usize,
    pub output_port_num: usize,
}

impl VariableIdentifier {
    pub fn new(block_id: usize, output_port_num: usize) -> Self {
        Self { block_id, output_port_num }
    }

    fn from_connection(c: &Connection) -> Self {
        Self::new(c.from_block(), c.from_port())
    }
}

impl fmt::Display for VariableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block_id, self.output_port_num)
    }
}

/// Owns the [`ValueCell`] behind every output port in a model.
#[derive(Debug, Default)]
pub struct VariableManager {
    variables: HashMap<VariableIdentifier, ValueCell>,
}

impl VariableManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, id: VariableIdentifier, value: ValueCell) -> Result<(), ModelError> {
        if self.variables.contains_key(&id) {
            return Err(ModelError::Duplicate(format!("variable {id} already exists")));
        }
        self.variables.insert(id, value);
        Ok(())
    }

    pub fn remove_variable(&mut self, id: VariableIdentifier) {
        self.variables.remove(&id);
    }

    pub fn get_ptr(&self, id: &VariableIdentifier) -> Result<ValueCell, ModelError> {
        self.variables
            .get(id)
            .cloned()
            .ok_or_else(|| ModelError::NotFound(format!("variable {id}")))
    }

    pub fn get_ptr_for_connection(&self, c: &Connection) -> Result<ValueCell, ModelError> {
        self.get_ptr(&VariableIdentifier::from_connection(c))
    }

    pub fn has_variable(&self, id: &VariableIdentifier) -> bool {
        self.variables.contains_key(id)
    }

    pub fn has_connection(&self, c: &Connection) -> bool {
        self.has_variable(&VariableIdentifier::from_connection(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockgraph_types::DataType;

    #[test]
    fn add_then_fetch_round_trips_the_same_cell() {
        let mut vm = VariableManager::new();
        let id = VariableIdentifier::new(1, 0);
        let cell: ValueCell = Rc::new(RefCell::new(Value::F64(2.0)));
        vm.add_variable(id, cell.clone()).unwrap();

        let fetched = vm.get_ptr(&id).unwrap();
        *fetched.borrow_mut() = Value::F64(5.0);
        assert_eq!(*cell.borrow(), Value::F64(5.0));
    }

    #[test]
    fn duplicate_add_errors() {
        let mut vm = VariableManager::new();
        let id = VariableIdentifier::new(1, 0);
        vm.add_variable(id, Rc::new(RefCell::new(Value::make_default(DataType::F64))))
            .unwrap();
        assert!(matches!(
            vm.add_variable(id, Rc::new(RefCell::new(Value::make_default(DataType::F64)))),
            Err(ModelError::Duplicate(_))
        ));
    }

    #[test]
    fn lookup_by_connection_uses_the_source_endpoint() {
        let mut vm = VariableManager::new();
        let id = VariableIdentifier::new(3, 1);
        vm.add_variable(id, Rc::new(RefCell::new(Value::make_default(DataType::I32))))
            .unwrap();

        let c = Connection::new(3, 1, 7, 0);
        assert!(vm.has_connection(&c));
        assert!(vm.get_ptr_for_connection(&c).is_ok());
    }

    #[test]
    fn missing_variable_errors() {
        let vm = VariableManager::new();
        assert!(matches!(vm.get_ptr(&VariableIdentifier::new(1, 0)), Err(ModelError::NotFound(_))));
    }
}
