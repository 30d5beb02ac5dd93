use std::collections::HashMap;

use blockgraph_types::{DataType, Identifier, Value};

use crate::block::{
    ArithmeticBlock, ArithmeticOp, BlockKind, ClockBlock, ConstantBlock, DelayBlock, DerivativeBlock, InputPortBlock, IntegratorBlock,
    LimiterBlock, OutputPortBlock, RelationalBlock, RelationalOp, SubModelBlock, SwitchBlock, TrigBlock, TrigOp,
};
use crate::error::{ModelError, ModelResult};

/// A named collection of block kinds a model can instantiate by `lib::block`
/// reference.
pub trait Library {
    fn library_name(&self) -> &str;
    fn block_names(&self) -> Vec<&str>;
    fn has_block(&self, name: &str) -> bool;
    fn try_create_block(&self, name: &str) -> Option<BlockKind>;

    fn create_block(&self, name: &str) -> ModelResult<BlockKind> {
        self.try_create_block(name)
            .ok_or_else(|| ModelError::UnknownBlock(format!("{}::{name}", self.library_name())))
    }
}

type Factory = Box<dyn Fn() -> BlockKind>;

/// The built-in block library. Registration order is preserved in a `Vec`
/// rather than a hash map, matching the order blocks are listed in tooling
/// that enumerates `get_block_names()`.
pub struct StandardLibrary {
    blocks: Vec<(&'static str, Factory)>,
}

impl StandardLibrary {
    pub fn new() -> Self {
        let blocks: Vec<(&'static str, Factory)> = vec![
            ("Constant", Box::new(|| BlockKind::Constant(ConstantBlock::new(Value::F64(0.0))))),
            ("Add", Box::new(|| BlockKind::Arithmetic(ArithmeticBlock::new(ArithmeticOp::Add, 2)))),
            ("Subtract", Box::new(|| BlockKind::Arithmetic(ArithmeticBlock::new(ArithmeticOp::Subtract, 2)))),
            ("Multiply", Box::new(|| BlockKind::Arithmetic(ArithmeticBlock::new(ArithmeticOp::Multiply, 2)))),
            ("Divide", Box::new(|| BlockKind::Arithmetic(ArithmeticBlock::new(ArithmeticOp::Divide, 2)))),
            ("Equal", Box::new(|| BlockKind::Relational(RelationalBlock::new(RelationalOp::Equal)))),
            ("NotEqual", Box::new(|| BlockKind::Relational(RelationalBlock::new(RelationalOp::NotEqual)))),
            ("GreaterThan", Box::new(|| BlockKind::Relational(RelationalBlock::new(RelationalOp::GreaterThan)))),
            ("GreaterOrEqual", Box::new(|| BlockKind::Relational(RelationalBlock::new(RelationalOp::GreaterOrEqual)))),
            ("LessThan", Box::new(|| BlockKind::Relational(RelationalBlock::new(RelationalOp::LessThan)))),
            ("LessOrEqual", Box::new(|| BlockKind::Relational(RelationalBlock::new(RelationalOp::LessOrEqual)))),
            ("Sin", Box::new(|| BlockKind::Trig(TrigBlock::new(TrigOp::Sin)))),
            ("Cos", Box::new(|| BlockKind::Trig(TrigBlock::new(TrigOp::Cos)))),
            ("Tan", Box::new(|| BlockKind::Trig(TrigBlock::new(TrigOp::Tan)))),
            ("Asin", Box::new(|| BlockKind::Trig(TrigBlock::new(TrigOp::Asin)))),
            ("Acos", Box::new(|| BlockKind::Trig(TrigBlock::new(TrigOp::Acos)))),
            ("Atan", Box::new(|| BlockKind::Trig(TrigBlock::new(TrigOp::Atan)))),
            ("Atan2", Box::new(|| BlockKind::Trig(TrigBlock::new(TrigOp::Atan2)))),
            ("Clock", Box::new(|| BlockKind::Clock(ClockBlock))),
            ("Integrator", Box::new(|| BlockKind::Integrator(IntegratorBlock::default()))),
            ("Derivative", Box::new(|| BlockKind::Derivative(DerivativeBlock::default()))),
            ("Delay", Box::new(|| BlockKind::Delay(DelayBlock::default()))),
            ("Limiter", Box::new(|| BlockKind::Limiter(LimiterBlock::new(false, Value::F64(1.0), Value::F64(-1.0))))),
            ("Switch", Box::new(|| BlockKind::Switch(SwitchBlock::default()))),
            ("Input", Box::new(|| BlockKind::InputPort(InputPortBlock::new(DataType::F64)))),
            ("Output", Box::new(|| BlockKind::OutputPort(OutputPortBlock::default()))),
        ];
        Self { blocks }
    }
}

impl Default for StandardLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl Library for StandardLibrary {
    fn library_name(&self) -> &str {
        "stdlib"
    }

    fn block_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.blocks.iter().map(|(name, _)| *name).collect();
        names.sort_unstable();
        names
    }

    fn has_block(&self, name: &str) -> bool {
        self.blocks.iter().any(|(n, _)| *n == name)
    }

    fn try_create_block(&self, name: &str) -> Option<BlockKind> {
        self.blocks.iter().find(|(n, _)| *n == name).map(|(_, f)| f())
    }
}

/// The library of models the current model can reference as sub-models.
/// Each entry records the referenced model's exposed input/output types, as
/// read off its `InputPort`/`OutputPort` blocks.
#[derive(Default)]
pub struct ModelLibrary {
    models: HashMap<String, (Vec<DataType>, Vec<DataType>)>,
}

impl ModelLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_model(&mut self, name: impl Into<String>, input_types: Vec<DataType>, output_types: Vec<DataType>) {
        self.models.insert(name.into(), (input_types, output_types));
    }
}

impl Library for ModelLibrary {
    fn library_name(&self) -> &str {
        "models"
    }

    fn block_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    fn has_block(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    fn try_create_block(&self, name: &str) -> Option<BlockKind> {
        let (inputs, outputs) = self.models.get(name)?;
        Some(BlockKind::SubModel(SubModelBlock::new(
            Identifier::new(name).ok()?,
            inputs.clone(),
            outputs.clone(),
        )))
    }
}

/// Resolves `"library::block"` references against every registered
/// [`Library`], in registration order.
#[derive(Default)]
pub struct LibraryManager {
    libraries: Vec<Box<dyn Library>>,
}

impl LibraryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with [`ModelError::Duplicate`] if a library by this name is
    /// already registered.
    pub fn register_library(&mut self, library: Box<dyn Library>) -> ModelResult<()> {
        if self.get_library(library.library_name()).is_some() {
            log::warn!("library '{}' is already registered", library.library_name());
            return Err(ModelError::Duplicate(format!("library '{}'", library.library_name())));
        }
        self.libraries.push(library);
        Ok(())
    }

    pub fn deregister_library(&mut self, name: &str) {
        self.libraries.retain(|l| l.library_name() != name);
    }

    pub fn get_library(&self, name: &str) -> Option<&dyn Library> {
        self.libraries.iter().find(|l| l.library_name() == name).map(|b| b.as_ref())
    }

    pub fn create_block(&self, library: &str, block: &str) -> ModelResult<BlockKind> {
        let lib = self
            .get_library(library)
            .ok_or_else(|| ModelError::UnknownBlock(format!("{library}::{block}")))?;
        lib.create_block(block)
    }

    pub fn has_block(&self, library: &str, block: &str) -> bool {
        self.get_library(library).map(|l| l.has_block(block)).unwrap_or(false)
    }

    /// Resolves `"lib::block"` directly against that library; a bare name
    /// searches every registered library in registration order and returns
    /// the first hit.
    pub fn resolve_block(&self, reference: &str) -> ModelResult<BlockKind> {
        if let Some((lib, block)) = reference.split_once("::") {
            return self.create_block(lib, block);
        }
        self.libraries
            .iter()
            .find_map(|l| l.try_create_block(reference))
            .ok_or_else(|| ModelError::UnknownBlock(reference.to_string()))
    }
}
