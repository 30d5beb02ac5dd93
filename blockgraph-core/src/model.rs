use std::collections::HashMap;

use blockgraph_types::DataType;
use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockLocation};
use crate::codegen::{self, CodeComponent};
use crate::connection::{Connection, ConnectionManager};
use crate::error::{BlockError, ModelError, ModelResult};
use crate::library::LibraryManager;
use crate::parameter::ParameterKind;

/// The maximum number of type-propagation passes [`Model::propagate_types`]
/// will run before giving up and reporting
/// [`ModelError::TypePropagationDivergent`].
const MAX_PROPAGATION_PASSES: usize = 1000;

/// A block diagram: a set of blocks, the connections between their ports,
/// and the subset of ports exposed as the model's own inputs and outputs.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    description: String,
    dt: f64,
    blocks: Vec<Block>,
    connections: ConnectionManager,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    next_id: usize,
}

impl Model {
    pub fn new(name: impl Into<String>, description: impl Into<String>, dt: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            dt,
            blocks: Vec::new(),
            connections: ConnectionManager::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            next_id: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn model_inputs(&self) -> &[usize] {
        &self.inputs
    }

    pub fn model_outputs(&self) -> &[usize] {
        &self.outputs
    }

    pub fn get_block(&self, id: usize) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    pub fn get_block_mut(&mut self, id: usize) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id() == id)
    }

    /// Adds a block of `kind` at `loc`, assigning it a fresh id. Returns the
    /// assigned id.
    pub fn add_block(&mut self, loc: BlockLocation, kind: crate::block::BlockKind) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        let mut block = Block::new(id, kind);
        block.set_loc(loc);
        self.blocks.push(block);
        id
    }

    /// Removes the block with `id`, and every connection and model-level
    /// input/output reference to it.
    pub fn remove_block(&mut self, id: usize) -> ModelResult<()> {
        let idx = self
            .blocks
            .iter()
            .position(|b| b.id() == id)
            .ok_or_else(|| ModelError::NotFound(format!("block {id}")))?;
        self.blocks.remove(idx);
        self.connections.remove_block(id);
        self.inputs.retain(|i| *i != id);
        self.outputs.retain(|i| *i != id);
        Ok(())
    }

    pub fn add_connection(&mut self, c: Connection) -> ModelResult<()> {
        let from = self.get_block(c.from_block()).ok_or_else(|| ModelError::NotFound(format!("block {}", c.from_block())))?;
        if c.from_port() >= from.num_outputs() {
            return Err(ModelError::OutOfRange(format!("output port {} on block {}", c.from_port(), c.from_block())));
        }
        let to = self.get_block(c.to_block()).ok_or_else(|| ModelError::NotFound(format!("block {}", c.to_block())))?;
        if c.to_port() >= to.num_inputs() {
            return Err(ModelError::OutOfRange(format!("input port {} on block {}", c.to_port(), c.to_block())));
        }
        self.connections.add_connection(c)
    }

    pub fn remove_connection(&mut self, to_block: usize, to_port: usize) -> ModelResult<()> {
        self.connections.remove_connection(to_block, to_port)
    }

    pub fn mark_input(&mut self, block_id: usize) -> ModelResult<()> {
        self.get_block(block_id)
            .ok_or_else(|| ModelError::NotFound(format!("block {block_id}")))?;
        if !self.inputs.contains(&block_id) {
            self.inputs.push(block_id);
        }
        Ok(())
    }

    pub fn mark_output(&mut self, block_id: usize) -> ModelResult<()> {
        self.get_block(block_id)
            .ok_or_else(|| ModelError::NotFound(format!("block {block_id}")))?;
        if !self.outputs.contains(&block_id) {
            self.outputs.push(block_id);
        }
        Ok(())
    }

    /// Runs type propagation to a fixpoint: repeatedly pushes each
    /// connection's source output type onto its destination input, then
    /// asks every block to re-derive its own output type, until nothing
    /// changes. Fails with [`ModelError::TypePropagationDivergent`] if the
    /// model hasn't stabilized after `blocks.len() * 10` passes (capped at
    /// [`MAX_PROPAGATION_PASSES`]).
    pub fn propagate_types(&mut self) -> ModelResult<()> {
        let cap = (self.blocks.len() * 10).clamp(1, MAX_PROPAGATION_PASSES);

        for _ in 0..cap {
            let edges: Vec<(usize, usize, usize, usize)> = self
                .connections
                .connections()
                .iter()
                .map(|c| (c.from_block(), c.from_port(), c.to_block(), c.to_port()))
                .collect();

            for (from_block, from_port, to_block, to_port) in edges {
                let dt = self
                    .get_block(from_block)
                    .and_then(|b| b.output_type(from_port).ok())
                    .unwrap_or(DataType::NONE);
                if let Some(to) = self.get_block_mut(to_block) {
                    // Ports are validated in range by `add_connection`; a failure here
                    // would mean a connection outlived the block shrinking its port count.
                    let _ = to.set_input_type(to_port, dt);
                }
            }

            let mut changed = false;
            for block in self.blocks.iter_mut() {
                if block.update_block() {
                    changed = true;
                }
            }

            if !changed {
                return Ok(());
            }
        }

        log::warn!("type propagation on model '{}' did not converge after {cap} passes", self.name);
        Err(ModelError::TypePropagationDivergent)
    }

    /// Every block currently reporting a validity problem. Non-fatal: a
    /// model with entries here can still be edited, just not compiled.
    pub fn get_all_errors(&self) -> Vec<BlockError> {
        self.blocks.iter().filter_map(|b| b.has_error()).collect()
    }

    pub fn has_error(&self) -> bool {
        self.blocks.iter().any(|b| b.has_error().is_some())
    }

    /// The codegen component `block_id` itself generates.
    pub fn get_codegen_component(&self, block_id: usize) -> ModelResult<CodeComponent> {
        let block = self.get_block(block_id).ok_or_else(|| ModelError::NotFound(format!("block {block_id}")))?;
        codegen::codegen_self(block)
    }

    /// The additional components `block_id`'s own component depends on
    /// (e.g. a sub-model's flattened inner blocks).
    pub fn get_all_sub_components(&self, block_id: usize) -> ModelResult<Vec<CodeComponent>> {
        let block = self.get_block(block_id).ok_or_else(|| ModelError::NotFound(format!("block {block_id}")))?;
        Ok(codegen::codegen_other(block))
    }

    /// Writes generated source for every block into `path`. `language` must
    /// be `"CPP"`.
    pub fn write_codegen_to(&self, language: &str, path: &std::path::Path) -> ModelResult<()> {
        codegen::write_in_folder(self, language, path)
    }

    pub fn to_json(&self) -> ModelResult<String> {
        let file = ModelFile::from_model(self);
        serde_json::to_string_pretty(&file).map_err(|e| ModelError::IoError(e.to_string()))
    }

    pub fn from_json(json: &str, libraries: &LibraryManager) -> ModelResult<Self> {
        let file: ModelFile = serde_json::from_str(json).map_err(|e| ModelError::IoError(e.to_string()))?;
        file.into_model(libraries)
    }
}

/// `{"x": .., "y": ..}`, matching the JSON schema's `loc` field.
#[derive(Debug, Serialize, Deserialize)]
struct LocFile {
    x: i64,
    y: i64,
}

/// `{"value": "...", "dtype": "..."}`, matching the JSON schema's
/// per-parameter entries.
#[derive(Debug, Serialize, Deserialize)]
struct ParameterFile {
    value: String,
    dtype: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct BlockFile {
    id: usize,
    library: String,
    #[serde(rename = "type")]
    block_type: String,
    loc: LocFile,
    #[serde(default)]
    inverted: bool,
    #[serde(default)]
    parameters: HashMap<String, ParameterFile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    name: String,
    description: String,
    dt: f64,
    blocks: Vec<BlockFile>,
    connections: Vec<Connection>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
}

impl ModelFile {
    fn from_model(model: &Model) -> Self {
        let blocks = model
            .blocks
            .iter()
            .map(|b| {
                let mut parameters = HashMap::new();
                for p in b.parameters() {
                    let dtype = match p.kind() {
                        ParameterKind::Value(v) => v.data_type().to_string(),
                        ParameterKind::Array(a) => a.data_type().to_string(),
                        ParameterKind::DataType(_) => "DataType".to_string(),
                        ParameterKind::Identifier(_) => "Identifier".to_string(),
                    };
                    parameters.insert(p.id().as_str().to_string(), ParameterFile {
                        value: p.get_value_string(),
                        dtype,
                    });
                }

                BlockFile {
                    id: b.id(),
                    library: b.kind().as_behavior().library().to_string(),
                    block_type: b.name().to_string(),
                    loc: LocFile { x: b.loc().x, y: b.loc().y },
                    inverted: b.inverted(),
                    parameters,
                }
            })
            .collect();

        Self {
            name: model.name.clone(),
            description: model.description.clone(),
            dt: model.dt,
            blocks,
            connections: model.connections.connections().to_vec(),
            inputs: model.inputs.clone(),
            outputs: model.outputs.clone(),
        }
    }

    fn into_model(self, libraries: &LibraryManager) -> ModelResult<Model> {
        let mut model = Model::new(self.name, self.description, self.dt);
        let mut max_id = 0;

        for bf in self.blocks {
            let kind = libraries.create_block(&bf.library, &bf.block_type)?;
            let mut block = Block::new(bf.id, kind);
            block.set_loc(BlockLocation { x: bf.loc.x, y: bf.loc.y });
            block.set_inverted(bf.inverted);

            for p in block.parameters_mut() {
                if let Some(pf) = bf.parameters.get(p.id().as_str()) {
                    p.set_value_string(&pf.value)?;
                }
            }

            max_id = max_id.max(bf.id + 1);
            model.blocks.push(block);
        }
        model.next_id = max_id;

        for c in self.connections {
            model.connections.add_connection(c)?;
        }
        model.inputs = self.inputs;
        model.outputs = self.outputs;

        Ok(model)
    }
}
