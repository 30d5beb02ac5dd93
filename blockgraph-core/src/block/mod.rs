//! Block kinds and the capability trait every kind implements.
//!
//! A block is modeled as one closed tagged union, [`BlockKind`], rather than
//! a class hierarchy of individual block types. Each variant wraps a small
//! struct that implements [`BlockBehavior`]; [`Block`] stores the common
//! fields (id, location, parameters) once and dispatches behavior to the
//! active variant with a single match in each of its own methods.

mod arithmetic;
mod clock;
mod constant;
mod delay;
mod derivative;
mod integrator;
mod io_port;
mod limiter;
mod relational;
mod submodel;
mod switch;
mod trig;

pub use arithmetic::{ArithmeticBlock, ArithmeticOp};
pub use clock::ClockBlock;
pub use constant::ConstantBlock;
pub use delay::DelayBlock;
pub use derivative::DerivativeBlock;
pub use integrator::IntegratorBlock;
pub use io_port::{InputPortBlock, OutputPortBlock};
pub use limiter::LimiterBlock;
pub use relational::{RelationalBlock, RelationalOp};
pub use submodel::SubModelBlock;
pub use switch::SwitchBlock;
pub use trig::{TrigBlock, TrigOp};

use blockgraph_types::DataType;

use crate::error::{BlockError, ModelError, ModelResult};
use crate::parameter::Parameter;

/// An `(x, y)` position on the model canvas. Purely cosmetic — it plays no
/// role in type propagation, scheduling, or execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlockLocation {
    pub x: i64,
    pub y: i64,
}

/// Static, model-wide information every block may need while updating or
/// compiling itself. Currently just the fixed step size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelInfo {
    dt: f64,
}

impl ModelInfo {
    pub fn new(dt: f64) -> Self {
        Self { dt }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }
}

/// The behavior every block kind implements. [`Block`] forwards to whichever
/// of these the active [`BlockKind`] variant is.
pub trait BlockBehavior {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn library(&self) -> &'static str {
        "stdlib"
    }

    fn num_inputs(&self) -> usize;
    fn num_outputs(&self) -> usize;

    /// Tells this block what type arrives on `port`. Called repeatedly
    /// during type-propagation until the block stops changing. Fails with
    /// [`ModelError::OutOfRange`] if `port >= num_inputs()`.
    fn set_input_type(&mut self, port: usize, dt: DataType) -> ModelResult<()>;

    /// Fails with [`ModelError::OutOfRange`] if `port >= num_outputs()`.
    fn output_type(&self, port: usize) -> ModelResult<DataType>;

    /// Re-derives this block's output type(s) from its current input types
    /// and parameters. Returns `true` if anything changed, which keeps the
    /// model's fixpoint loop iterating.
    fn update_block(&mut self) -> bool;

    /// `None` if this block is currently well-formed; otherwise a message
    /// describing why (unconnected input, NONE-typed port, and so on).
    fn has_error(&self) -> Option<String>;

    fn parameters(&self) -> Vec<&Parameter> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        Vec::new()
    }

    /// `true` if this block's outputs at tick `n` are computed from inputs
    /// at tick `n-1` rather than `n` (only [`DelayBlock`] does this). This
    /// is the single place that distinction is decided — every other block
    /// kind inherits the default.
    fn outputs_are_delayed(&self) -> bool {
        false
    }
}

/// The full set of block kinds this engine knows how to schedule, execute,
/// and generate code for.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum BlockKind {
    Constant(ConstantBlock),
    Arithmetic(ArithmeticBlock),
    Relational(RelationalBlock),
    Trig(TrigBlock),
    Clock(ClockBlock),
    Integrator(IntegratorBlock),
    Derivative(DerivativeBlock),
    Delay(DelayBlock),
    Limiter(LimiterBlock),
    Switch(SwitchBlock),
    InputPort(InputPortBlock),
    OutputPort(OutputPortBlock),
    SubModel(SubModelBlock),
}

macro_rules! dispatch {
    ($self:expr, $kind:ident => $body:expr) => {
        match $self {
            BlockKind::Constant($kind) => $body,
            BlockKind::Arithmetic($kind) => $body,
            BlockKind::Relational($kind) => $body,
            BlockKind::Trig($kind) => $body,
            BlockKind::Clock($kind) => $body,
            BlockKind::Integrator($kind) => $body,
            BlockKind::Derivative($kind) => $body,
            BlockKind::Delay($kind) => $body,
            BlockKind::Limiter($kind) => $body,
            BlockKind::Switch($kind) => $body,
            BlockKind::InputPort($kind) => $body,
            BlockKind::OutputPort($kind) => $body,
            BlockKind::SubModel($kind) => $body,
        }
    };
}

impl BlockKind {
    pub fn as_behavior(&self) -> &dyn BlockBehavior {
        dispatch!(self, k => k)
    }

    pub fn as_behavior_mut(&mut self) -> &mut dyn BlockBehavior {
        dispatch!(self, k => k)
    }
}

/// One node in the model graph: an id, cosmetic placement, an `inverted`
/// display flag, and the tagged [`BlockKind`] that defines its behavior.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    id: usize,
    loc: BlockLocation,
    #[serde(default)]
    inverted: bool,
    kind: BlockKind,
}

impl Block {
    pub fn new(id: usize, kind: BlockKind) -> Self {
        Self {
            id,
            loc: BlockLocation::default(),
            inverted: false,
            kind,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    pub fn loc(&self) -> BlockLocation {
        self.loc
    }

    pub fn set_loc(&mut self, loc: BlockLocation) {
        self.loc = loc;
    }

    pub fn inverted(&self) -> bool {
        self.inverted
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut BlockKind {
        &mut self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_behavior().name()
    }

    pub fn full_name(&self) -> String {
        format!("{}::{}", self.kind.as_behavior().library(), self.name())
    }

    pub fn num_inputs(&self) -> usize {
        self.kind.as_behavior().num_inputs()
    }

    pub fn num_outputs(&self) -> usize {
        self.kind.as_behavior().num_outputs()
    }

    pub fn set_input_type(&mut self, port: usize, dt: DataType) -> ModelResult<()> {
        self.kind.as_behavior_mut().set_input_type(port, dt)
    }

    pub fn output_type(&self, port: usize) -> ModelResult<DataType> {
        self.kind.as_behavior().output_type(port)
    }

    pub fn update_block(&mut self) -> bool {
        self.kind.as_behavior_mut().update_block()
    }

    pub fn has_error(&self) -> Option<BlockError> {
        self.kind
            .as_behavior()
            .has_error()
            .map(|msg| BlockError::new(self.id.to_string(), msg))
    }

    pub fn parameters(&self) -> Vec<&Parameter> {
        self.kind.as_behavior().parameters()
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        self.kind.as_behavior_mut().parameters_mut()
    }

    pub fn outputs_are_delayed(&self) -> bool {
        self.kind.as_behavior().outputs_are_delayed()
    }
}
