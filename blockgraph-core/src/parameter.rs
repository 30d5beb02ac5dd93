use blockgraph_types::{DataType, Identifier, Value, ValueArray};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// The tagged content a [`Parameter`] can hold.
///
/// The original implementation split this into a small class hierarchy
/// (`ParameterDataType`, `ParameterValue`, `ParameterIdentifier`, plus a
/// separate `DataParameterArray`); here it's one closed union so every
/// parameter-bearing block matches on a single type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ParameterKind {
    /// A parameter whose value is itself a [`DataType`] (e.g. the output
    /// type of a cast block).
    DataType(DataType),
    /// A scalar value parameter.
    Value(Value),
    /// A reference to another named entity (a sub-model input name, say).
    Identifier(Identifier),
    /// A 2D array parameter.
    Array(ValueArray),
}

/// A named, user-editable block or data-dictionary setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    id: Identifier,
    name: String,
    enabled: bool,
    kind: ParameterKind,
}

impl Parameter {
    pub fn new(id: Identifier, name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            id,
            name: name.into(),
            enabled: true,
            kind,
        }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    /// The data type this parameter's content carries, for `Value`/`Array`
    /// kinds. `DataType` parameters report the type they hold as their
    /// value, not their "value's type" (there isn't one); `Identifier`
    /// parameters have no data type.
    pub fn data_type(&self) -> Option<DataType> {
        match &self.kind {
            ParameterKind::Value(v) => Some(v.data_type()),
            ParameterKind::Array(a) => Some(a.data_type()),
            ParameterKind::DataType(_) | ParameterKind::Identifier(_) => None,
        }
    }

    /// Renders the current value to its canonical string form.
    pub fn get_value_string(&self) -> String {
        match &self.kind {
            ParameterKind::DataType(dt) => dt.to_string(),
            ParameterKind::Value(v) => v.render(),
            ParameterKind::Identifier(id) => id.as_str().to_string(),
            ParameterKind::Array(a) => a.render(),
        }
    }

    /// Parses `val` and overwrites the current value, keeping the
    /// parameter's current data type (for `Value`/`Array` kinds).
    pub fn set_value_string(&mut self, val: &str) -> ModelResult<()> {
        match &mut self.kind {
            ParameterKind::DataType(dt) => {
                *dt = val
                    .parse()
                    .map_err(|_| ModelError::UnsupportedType(val.to_string()))?;
            }
            ParameterKind::Value(v) => {
                *v = Value::from_string(val, v.data_type())?;
            }
            ParameterKind::Identifier(id) => {
                id.set(val)?;
            }
            ParameterKind::Array(a) => {
                *a = ValueArray::from_bracketed(val, a.data_type())?;
            }
        }
        Ok(())
    }

    /// Converts the held value/array to `dt` in place. A no-op for
    /// `Identifier` parameters and a replacement for `DataType` parameters.
    pub fn convert_type(&mut self, dt: DataType) {
        match &mut self.kind {
            ParameterKind::DataType(held) => *held = dt,
            ParameterKind::Value(v) => *v = v.convert_type(dt),
            ParameterKind::Array(a) => *a = a.change_type(dt),
            ParameterKind::Identifier(_) => {}
        }
    }

    /// Resizes an `Array` parameter. Returns [`ModelError::TypeMismatch`]
    /// for any other kind.
    pub fn resize(&mut self, rows: usize, cols: usize) -> ModelResult<()> {
        match &mut self.kind {
            ParameterKind::Array(a) => {
                a.resize(rows, cols);
                Ok(())
            }
            _ => Err(ModelError::TypeMismatch {
                expected: "Array".to_string(),
                found: format!("{:?}", self.kind),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(kind: ParameterKind) -> Parameter {
        Parameter::new(Identifier::new("p").unwrap(), "P", kind)
    }

    #[test]
    fn value_parameter_round_trips_string() {
        let mut p = param(ParameterKind::Value(Value::F64(1.5)));
        assert_eq!(p.get_value_string(), "1.5");
        p.set_value_string("2.5").unwrap();
        assert_eq!(p.kind(), &ParameterKind::Value(Value::F64(2.5)));
    }

    #[test]
    fn data_type_parameter_round_trips_string() {
        let mut p = param(ParameterKind::DataType(DataType::NONE));
        p.set_value_string("I32").unwrap();
        assert_eq!(p.kind(), &ParameterKind::DataType(DataType::I32));
        assert!(p.set_value_string("bogus").is_err());
    }

    #[test]
    fn identifier_parameter_validates_on_set() {
        let mut p = param(ParameterKind::Identifier(Identifier::new("a").unwrap()));
        assert!(p.set_value_string("9bad").is_err());
        p.set_value_string("good_name").unwrap();
        assert_eq!(p.get_value_string(), "good_name");
    }

    #[test]
    fn convert_type_changes_value_kind_in_place() {
        let mut p = param(ParameterKind::Value(Value::I32(3)));
        p.convert_type(DataType::F64);
        assert_eq!(p.kind(), &ParameterKind::Value(Value::F64(3.0)));
    }

    #[test]
    fn resize_only_applies_to_array_kind() {
        let mut arr = param(ParameterKind::Array(ValueArray::from_bracketed("[1,2]", DataType::I32).unwrap()));
        arr.resize(2, 2).unwrap();
        assert_eq!(arr.kind(), &ParameterKind::Array(ValueArray::from_bracketed("[1,2;0,0]", DataType::I32).unwrap()));

        let mut scalar = param(ParameterKind::Value(Value::I32(1)));
        assert!(scalar.resize(1, 1).is_err());
    }
}
