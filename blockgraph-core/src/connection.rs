use blockgraph_types::Identifier;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A single directed wire from one block's output port to another block's
/// input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    from_block: usize,
    from_port: usize,
    to_block: usize,
    to_port: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    name: Option<Identifier>,
}

impl Connection {
    pub fn new(from_block: usize, from_port: usize, to_block: usize, to_port: usize) -> Self {
        Self {
            from_block,
            from_port,
            to_block,
            to_port,
            name: None,
        }
    }

    pub fn contains_id(&self, id: usize) -> bool {
        self.from_block == id || self.to_block == id
    }

    pub fn from_block(&self) -> usize {
        self.from_block
    }

    pub fn from_port(&self) -> usize {
        self.from_port
    }

    pub fn to_block(&self) -> usize {
        self.to_block
    }

    pub fn to_port(&self) -> usize {
        self.to_port
    }

    pub fn name(&self) -> Option<&Identifier> {
        self.name.as_ref()
    }

    pub fn set_name(&mut self, name: impl AsRef<str>) -> Result<(), ModelError> {
        self.name = Some(Identifier::new(name)?);
        Ok(())
    }
}

/// Owns every [`Connection`] in a model and enforces the "at most one
/// connection per input port" invariant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionManager {
    connections: Vec<Connection>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `c`. Fails with [`ModelError::DuplicateConnection`] if another
    /// connection already targets the same input port.
    pub fn add_connection(&mut self, c: Connection) -> Result<(), ModelError> {
        if self.has_connection_to(c.to_block, c.to_port) {
            return Err(ModelError::DuplicateConnection(format!(
                "block {} port {} already has an incoming connection",
                c.to_block, c.to_port
            )));
        }
        self.connections.push(c);
        Ok(())
    }

    /// Removes every connection touching `block_id`, as either endpoint.
    pub fn remove_block(&mut self, block_id: usize) {
        self.connections.retain(|c| !c.contains_id(block_id));
    }

    pub fn remove_connection(&mut self, to_block: usize, to_port: usize) -> Result<(), ModelError> {
        let before = self.connections.len();
        self.connections.retain(|c| !(c.to_block == to_block && c.to_port == to_port));
        if self.connections.len() == before {
            return Err(ModelError::NotFound(format!(
                "no connection to block {to_block} port {to_port}"
            )));
        }
        Ok(())
    }

    pub fn get_connection_to(&self, to_block: usize, to_port: usize) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.to_block == to_block && c.to_port == to_port)
    }

    pub fn has_connection_to(&self, to_block: usize, to_port: usize) -> bool {
        self.get_connection_to(to_block, to_port).is_some()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_target_port() {
        let mut cm = ConnectionManager::new();
        cm.add_connection(Connection::new(1, 0, 2, 0)).unwrap();
        assert!(matches!(
            cm.add_connection(Connection::new(3, 0, 2, 0)),
            Err(ModelError::DuplicateConnection(_))
        ));
    }

    #[test]
    fn remove_block_drops_every_touching_connection() {
        let mut cm = ConnectionManager::new();
        cm.add_connection(Connection::new(1, 0, 2, 0)).unwrap();
        cm.add_connection(Connection::new(2, 0, 3, 0)).unwrap();
        cm.add_connection(Connection::new(4, 0, 5, 0)).unwrap();

        cm.remove_block(2);

        assert_eq!(cm.connections().len(), 1);
        assert_eq!(cm.connections()[0].from_block(), 4);
    }

    #[test]
    fn remove_connection_errors_when_absent() {
        let mut cm = ConnectionManager::new();
        assert!(cm.remove_connection(1, 0).is_err());
    }

    #[test]
    fn serde_round_trips_as_a_flat_array() {
        let mut cm = ConnectionManager::new();
        cm.add_connection(Connection::new(1, 0, 2, 0)).unwrap();
        let json = serde_json::to_string(&cm).unwrap();
        assert!(json.starts_with('['));
        let back: ConnectionManager = serde_json::from_str(&json).unwrap();
        assert_eq!(cm.connections(), back.connections());
    }
}
