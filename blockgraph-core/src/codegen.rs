//! Emits C++ source for a compiled model, mirroring the shape of the
//! runtime executor: one `CodeComponent` per block, describing its input
//! and output interfaces, type name, and the function names its
//! `reset`/`step` lower to.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use blockgraph_types::DataType;

use crate::block::{Block, BlockKind};
use crate::error::{ModelError, ModelResult};
use crate::model::Model;
use crate::parameter::ParameterKind;

/// Which half of a component's source a [`CodeComponent`] is being asked
/// to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeSection {
    Declaration,
    Definition,
}

impl CodeSection {
    fn file_extension(self) -> &'static str {
        match self {
            CodeSection::Declaration => "h",
            CodeSection::Definition => "cpp",
        }
    }
}

/// The two lifecycle entry points a component may expose a function name
/// for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockFunction {
    Reset,
    Step,
}

/// A named struct and its field list — the shape of a block's input or
/// output interface in generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDefinition {
    name: String,
    fields: Vec<String>,
}

impl InterfaceDefinition {
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self { name: name.into(), fields }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Everything the generator needs to know about one block's generated
/// representation. Virtual components (input/output ports, the sub-model
/// wrapper itself) carry no code of their own and are skipped by
/// [`write_in_folder`].
#[derive(Debug, Clone)]
pub struct CodeComponent {
    is_virtual: bool,
    input_interface: Option<InterfaceDefinition>,
    output_interface: Option<InterfaceDefinition>,
    name_base: String,
    module_name: String,
    type_name: String,
    function_names: HashMap<BlockFunction, String>,
    constructor_arguments: Vec<String>,
    declaration: Vec<String>,
    definition: Vec<String>,
}

impl CodeComponent {
    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    pub fn input_interface(&self) -> Option<&InterfaceDefinition> {
        self.input_interface.as_ref()
    }

    pub fn output_interface(&self) -> Option<&InterfaceDefinition> {
        self.output_interface.as_ref()
    }

    pub fn name_base(&self) -> &str {
        &self.name_base
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn function_name(&self, f: BlockFunction) -> Option<&str> {
        self.function_names.get(&f).map(String::as_str)
    }

    pub fn constructor_arguments(&self) -> &[String] {
        &self.constructor_arguments
    }

    pub fn write_code(&self, section: CodeSection) -> &[String] {
        match section {
            CodeSection::Declaration => &self.declaration,
            CodeSection::Definition => &self.definition,
        }
    }

    fn virtual_component(name_base: impl Into<String>) -> Self {
        Self {
            is_virtual: true,
            input_interface: None,
            output_interface: None,
            name_base: name_base.into(),
            module_name: String::new(),
            type_name: String::new(),
            function_names: HashMap::new(),
            constructor_arguments: Vec::new(),
            declaration: Vec::new(),
            definition: Vec::new(),
        }
    }
}

/// C++'s fixed-width integer/float type for `dt`. `NONE` and `BOOL` (outside
/// a condition) have no numeric C++ representation codegen can emit.
fn cpp_type_name(dt: DataType) -> ModelResult<&'static str> {
    use DataType::*;
    Ok(match dt {
        BOOL => "bool",
        U8 => "uint8_t",
        I8 => "int8_t",
        U16 => "uint16_t",
        I16 => "int16_t",
        U32 => "uint32_t",
        I32 => "int32_t",
        U64 => "uint64_t",
        I64 => "int64_t",
        F32 => "float",
        F64 => "double",
        NONE => return Err(ModelError::UnsupportedType("NONE has no C++ representation".to_string())),
    })
}

fn declaration_lines(component: &CodeComponent) -> Vec<String> {
    let mut lines = vec!["#pragma once".to_string(), String::new(), format!("namespace blockgraph {{"), String::new()];

    if let Some(input) = &component.input_interface {
        lines.push(format!("struct {} {{", input.name()));
        for field in input.fields() {
            lines.push(format!("    double {field};"));
        }
        lines.push("};".to_string());
        lines.push(String::new());
    }
    if let Some(output) = &component.output_interface {
        lines.push(format!("struct {} {{", output.name()));
        for field in output.fields() {
            lines.push(format!("    double {field};"));
        }
        lines.push("};".to_string());
        lines.push(String::new());
    }

    lines.push(format!("class {} {{", component.name_base));
    lines.push("public:".to_string());
    if let Some(name) = component.function_names.get(&BlockFunction::Reset) {
        lines.push(format!("    void {name}();"));
    }
    if let Some(name) = component.function_names.get(&BlockFunction::Step) {
        lines.push(format!("    void {name}();"));
    }
    if let Some(input) = &component.input_interface {
        lines.push(format!("    {} s_in;", input.name()));
    }
    if let Some(output) = &component.output_interface {
        lines.push(format!("    {} s_out;", output.name()));
    }
    lines.push("};".to_string());
    lines.push(String::new());
    lines.push("}".to_string());
    lines
}

fn definition_lines(component: &CodeComponent) -> Vec<String> {
    let mut lines = vec![format!("#include \"{}.h\"", component.name_base), String::new()];
    if let Some(name) = component.function_names.get(&BlockFunction::Reset) {
        lines.push(format!("void blockgraph::{}::{name}() {{}}", component.name_base));
    }
    if let Some(name) = component.function_names.get(&BlockFunction::Step) {
        lines.push(format!("void blockgraph::{}::{name}() {{}}", component.name_base));
    }
    lines
}

fn finish(mut component: CodeComponent) -> CodeComponent {
    component.declaration = declaration_lines(&component);
    component.definition = definition_lines(&component);
    component
}

fn numeric_fields(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("vals[{i}]")).collect()
}

/// Builds the `CodeComponent` describing `block`'s own generated shape.
/// Port blocks and the sub-model wrapper are pure data movement with no
/// component of their own, so they report `is_virtual() == true`.
pub fn codegen_self(block: &Block) -> ModelResult<CodeComponent> {
    let id = block.id();

    let component = match block.kind() {
        BlockKind::Constant(b) => {
            let dt = cpp_type_name(b.value().data_type())?;
            CodeComponent {
                is_virtual: false,
                input_interface: None,
                output_interface: Some(InterfaceDefinition::new("s_out", vec!["val".to_string()])),
                name_base: format!("constant_block_{id}"),
                module_name: "blockgraph/constant_block.hpp".to_string(),
                type_name: format!("blockgraph::constant_block<{dt}>"),
                function_names: HashMap::from([(BlockFunction::Step, "step".to_string())]),
                constructor_arguments: vec![format!("{id}")],
                declaration: Vec::new(),
                definition: Vec::new(),
            }
        }

        BlockKind::Arithmetic(b) => {
            let n = block.num_inputs();
            CodeComponent {
                is_virtual: false,
                input_interface: Some(InterfaceDefinition::new("s_in", numeric_fields(n))),
                output_interface: Some(InterfaceDefinition::new("s_out", vec!["val".to_string()])),
                name_base: "arith_block".to_string(),
                module_name: "blockgraph/arith_block.hpp".to_string(),
                type_name: format!(
                    "blockgraph::arith_block<{}, {}, {}>",
                    cpp_type_name(block.output_type(0)?)?,
                    b.op(),
                    n
                ),
                function_names: HashMap::from([(BlockFunction::Step, "step".to_string())]),
                constructor_arguments: vec![format!("{id}"), format!("{n}")],
                declaration: Vec::new(),
                definition: Vec::new(),
            }
        }

        BlockKind::Relational(b) => CodeComponent {
            is_virtual: false,
            input_interface: Some(InterfaceDefinition::new("s_in", vec!["lhs".to_string(), "rhs".to_string()])),
            output_interface: Some(InterfaceDefinition::new("s_out", vec!["val".to_string()])),
            name_base: "relational_block".to_string(),
            module_name: "blockgraph/relational_block.hpp".to_string(),
            type_name: format!("blockgraph::relational_block<{}>", b.op()),
            function_names: HashMap::from([(BlockFunction::Step, "step".to_string())]),
            constructor_arguments: vec![format!("{id}")],
            declaration: Vec::new(),
            definition: Vec::new(),
        },

        BlockKind::Trig(b) => CodeComponent {
            is_virtual: false,
            input_interface: Some(InterfaceDefinition::new("s_in", vec!["val".to_string()])),
            output_interface: Some(InterfaceDefinition::new("s_out", vec!["val".to_string()])),
            name_base: "trig_block".to_string(),
            module_name: "blockgraph/trig_block.hpp".to_string(),
            type_name: format!("blockgraph::trig_block<{}>", b.op()),
            function_names: HashMap::from([(BlockFunction::Step, "step".to_string())]),
            constructor_arguments: vec![format!("{id}")],
            declaration: Vec::new(),
            definition: Vec::new(),
        },

        BlockKind::Clock(_) => CodeComponent {
            is_virtual: false,
            input_interface: None,
            output_interface: Some(InterfaceDefinition::new("s_out", vec!["val".to_string()])),
            name_base: format!("clock_block_{id}"),
            module_name: "blockgraph/clock_block.hpp".to_string(),
            type_name: "blockgraph::clock_block<double>".to_string(),
            function_names: HashMap::from([
                (BlockFunction::Reset, "reset".to_string()),
                (BlockFunction::Step, "step".to_string()),
            ]),
            constructor_arguments: vec![format!("{id}")],
            declaration: Vec::new(),
            definition: Vec::new(),
        },

        BlockKind::Integrator(_) => CodeComponent {
            is_virtual: false,
            input_interface: Some(InterfaceDefinition::new(
                "s_in",
                vec!["value".to_string(), "reset_flag".to_string(), "reset_value".to_string()],
            )),
            output_interface: Some(InterfaceDefinition::new("s_out", vec!["val".to_string()])),
            name_base: format!("integrator_block_{id}"),
            module_name: "blockgraph/integrator_block.hpp".to_string(),
            type_name: format!("blockgraph::integrator_block<{}>", cpp_type_name(block.output_type(0)?)?),
            function_names: HashMap::from([
                (BlockFunction::Reset, "reset".to_string()),
                (BlockFunction::Step, "step".to_string()),
            ]),
            constructor_arguments: vec![format!("{id}")],
            declaration: Vec::new(),
            definition: Vec::new(),
        },

        BlockKind::Derivative(_) => CodeComponent {
            is_virtual: false,
            input_interface: Some(InterfaceDefinition::new("s_in", vec!["value".to_string(), "reset_flag".to_string()])),
            output_interface: Some(InterfaceDefinition::new("s_out", vec!["val".to_string()])),
            name_base: format!("derivative_block_{id}"),
            module_name: "blockgraph/derivative_block.hpp".to_string(),
            type_name: format!("blockgraph::derivative_block<{}>", cpp_type_name(block.output_type(0)?)?),
            function_names: HashMap::from([
                (BlockFunction::Reset, "reset".to_string()),
                (BlockFunction::Step, "step".to_string()),
            ]),
            constructor_arguments: vec![format!("{id}")],
            declaration: Vec::new(),
            definition: Vec::new(),
        },

        BlockKind::Delay(_) => CodeComponent {
            is_virtual: false,
            input_interface: Some(InterfaceDefinition::new(
                "s_in",
                vec!["value".to_string(), "reset_flag".to_string(), "reset_value".to_string()],
            )),
            output_interface: Some(InterfaceDefinition::new("s_out", vec!["val".to_string()])),
            name_base: format!("delay_block_{id}"),
            module_name: "blockgraph/delay_block.hpp".to_string(),
            type_name: format!("blockgraph::delay_block<{}>", cpp_type_name(block.output_type(0)?)?),
            function_names: HashMap::from([
                (BlockFunction::Reset, "reset".to_string()),
                (BlockFunction::Step, "step".to_string()),
            ]),
            constructor_arguments: vec![format!("{id}")],
            declaration: Vec::new(),
            definition: Vec::new(),
        },

        BlockKind::Limiter(b) => {
            let fields = if b.is_dynamic() {
                vec!["value".to_string(), "max".to_string(), "min".to_string()]
            } else {
                vec!["value".to_string()]
            };
            let mut args = vec![format!("{id}"), b.is_dynamic().to_string()];
            if !b.is_dynamic() {
                for p in block.parameters() {
                    if let ParameterKind::Value(v) = p.kind() {
                        if p.id().as_str() == "max" || p.id().as_str() == "min" {
                            args.push(v.render());
                        }
                    }
                }
            }
            CodeComponent {
                is_virtual: false,
                input_interface: Some(InterfaceDefinition::new("s_in", fields)),
                output_interface: Some(InterfaceDefinition::new("s_out", vec!["val".to_string()])),
                name_base: format!("limiter_block_{id}"),
                module_name: "blockgraph/limiter_block.hpp".to_string(),
                type_name: format!("blockgraph::limiter_block<{}>", cpp_type_name(block.output_type(0)?)?),
                function_names: HashMap::from([(BlockFunction::Step, "step".to_string())]),
                constructor_arguments: args,
                declaration: Vec::new(),
                definition: Vec::new(),
            }
        }

        BlockKind::Switch(_) => CodeComponent {
            is_virtual: false,
            input_interface: Some(InterfaceDefinition::new(
                "s_in",
                vec!["flag".to_string(), "on_true".to_string(), "on_false".to_string()],
            )),
            output_interface: Some(InterfaceDefinition::new("s_out", vec!["val".to_string()])),
            name_base: format!("switch_block_{id}"),
            module_name: "blockgraph/switch_block.hpp".to_string(),
            type_name: format!("blockgraph::switch_block<{}>", cpp_type_name(block.output_type(0)?)?),
            function_names: HashMap::from([(BlockFunction::Step, "step".to_string())]),
            constructor_arguments: vec![format!("{id}")],
            declaration: Vec::new(),
            definition: Vec::new(),
        },

        // Port blocks are pure wiring between a ModelBlock wrapper and its
        // outer connections; the sub-model wrapper itself emits only
        // through its inner components. Neither has code of its own.
        BlockKind::InputPort(_) => CodeComponent::virtual_component(format!("input_port_{id}")),
        BlockKind::OutputPort(_) => CodeComponent::virtual_component(format!("output_port_{id}")),
        BlockKind::SubModel(b) => CodeComponent::virtual_component(format!("model_block_{}", b.model_name())),
    };

    Ok(finish(component))
}

/// The "other" components a block's own codegen depends on.
///
/// A `SubModel` block would, in a full implementation, recurse into its
/// referenced model and flatten every inner block's components here — the
/// current [`crate::block::SubModelBlock`] only carries the referenced
/// model's exposed input/output types, not the model itself, so this is
/// left empty pending that wiring (the same limitation the executor notes
/// for `SubModel` blocks at runtime).
pub fn codegen_other(_block: &Block) -> Vec<CodeComponent> {
    Vec::new()
}

/// Collects `get_codegen_self()` plus every block's `get_codegen_other()`
/// across the whole model, deduplicating by `name_base` (first occurrence
/// wins) and dropping virtual components, then writes one declaration file
/// and one definition file per surviving component into `path`.
///
/// `language` must be `"CPP"`; anything else fails with
/// [`ModelError::UnsupportedLanguage`].
pub fn write_in_folder(model: &Model, language: &str, path: &Path) -> ModelResult<()> {
    if language != "CPP" {
        return Err(ModelError::UnsupportedLanguage(language.to_string()));
    }

    let mut components: Vec<CodeComponent> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    fn push(c: CodeComponent, components: &mut Vec<CodeComponent>, seen: &mut std::collections::HashSet<String>) {
        if c.is_virtual() || seen.contains(c.name_base()) {
            return;
        }
        seen.insert(c.name_base().to_string());
        components.push(c);
    }

    for block in model.blocks() {
        push(codegen_self(block)?, &mut components, &mut seen);
        for other in codegen_other(block) {
            push(other, &mut components, &mut seen);
        }
    }

    fs::create_dir_all(path).map_err(|e| ModelError::IoError(e.to_string()))?;

    for component in &components {
        for section in [CodeSection::Declaration, CodeSection::Definition] {
            let code = component.write_code(section);
            if code.is_empty() {
                continue;
            }
            let file_path = path.join(format!("{}.{}", component.name_base(), section.file_extension()));
            fs::write(&file_path, code.join("\n") + "\n").map_err(|e| ModelError::IoError(e.to_string()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{ArithmeticBlock, ArithmeticOp, BlockLocation, ConstantBlock};
    use crate::connection::Connection;
    use blockgraph_types::Value;

    fn adder_model() -> Model {
        let mut m = Model::new("m", "", 0.01);
        let c1 = m.add_block(BlockLocation::default(), BlockKind::Constant(ConstantBlock::new(Value::F64(1.0))));
        let c2 = m.add_block(BlockLocation::default(), BlockKind::Constant(ConstantBlock::new(Value::F64(2.0))));
        let add = m.add_block(BlockLocation::default(), BlockKind::Arithmetic(ArithmeticBlock::new(ArithmeticOp::Add, 2)));
        m.add_connection(Connection::new(c1, 0, add, 0)).unwrap();
        m.add_connection(Connection::new(c2, 0, add, 1)).unwrap();
        m.propagate_types().unwrap();
        m
    }

    #[test]
    fn rejects_a_non_cpp_language_tag() {
        let m = adder_model();
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            write_in_folder(&m, "RUST", dir.path()),
            Err(ModelError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn writes_one_declaration_and_definition_file_per_component() {
        let m = adder_model();
        let dir = tempfile::tempdir().unwrap();
        write_in_folder(&m, "CPP", dir.path()).unwrap();

        assert!(dir.path().join("arith_block.h").exists());
        assert!(dir.path().join("arith_block.cpp").exists());
        // two Constant blocks share the same per-id name, so both survive
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert!(entries.len() >= 4);
    }

    #[test]
    fn port_and_submodel_components_are_virtual() {
        use crate::block::{Block, InputPortBlock};
        let block = Block::new(0, BlockKind::InputPort(InputPortBlock::new(DataType::F64)));
        let component = codegen_self(&block).unwrap();
        assert!(component.is_virtual());
        assert!(component.write_code(CodeSection::Declaration).is_empty());
    }
}
