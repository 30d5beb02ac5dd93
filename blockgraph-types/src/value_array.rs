use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::data_type::DataType;
use crate::error::TypesError;
use crate::value::Value;

/// A column-major 2D grid of same-typed values.
///
/// Storage index for `(row, col)` is `col * rows + row`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueArray {
    dtype: DataType,
    rows: usize,
    cols: usize,
    data: Vec<Value>,
}

impl ValueArray {
    pub fn data_type(&self) -> DataType {
        self.dtype
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Value {
        self.data[col * self.rows + row]
    }

    pub fn set(&mut self, row: usize, col: usize, value: Value) {
        self.data[col * self.rows + row] = value;
    }

    /// Builds a `0x0` empty array of `dt`.
    pub fn empty(dt: DataType) -> Self {
        Self {
            dtype: dt,
            rows: 0,
            cols: 0,
            data: Vec::new(),
        }
    }

    /// Parses a bracketed string literal: `[a,b,c;d,e,f]` is a 3-row,
    /// 2-column array (commas separate entries within a column, semicolons
    /// separate columns). `[]` is the `0x0` empty array.
    pub fn from_bracketed(s: &str, dt: DataType) -> Result<Self, TypesError> {
        let parse_err = |reason: &str| TypesError::ParseError {
            input: s.to_string(),
            dtype: dt.to_string(),
            reason: reason.to_string(),
        };

        let start = s.find('[').ok_or_else(|| parse_err("unable to find first bracket"))?;
        let bytes = s.as_bytes();

        let mut values = Vec::new();
        let mut rows = 0usize;
        let mut cols = 0usize;
        let mut current_row = 0usize;
        let mut current = start + 1;
        let mut found_end = false;

        while let Some(rel) = s[current..].find([';', ',', ']']) {
            let next = current + rel;
            let raw = &s[current..next];
            let trimmed = raw.trim();

            if !(next == start + 1 && bytes[next] == b']' && trimmed.is_empty()) {
                values.push(Value::from_string(trimmed, dt)?);
            }

            match bytes[next] {
                b',' => {
                    current_row += 1;
                    if cols == 0 {
                        rows = current_row;
                    }
                }
                b']' if rows == 0 && cols == 0 && values.is_empty() => {
                    found_end = true;
                }
                b';' | b']' => {
                    current_row += 1;
                    if cols == 0 {
                        rows = current_row;
                    } else if current_row != rows {
                        return Err(parse_err("each row must have the same values"));
                    }
                    cols += 1;
                    current_row = 0;
                    if bytes[next] == b']' {
                        found_end = true;
                    }
                }
                _ => unreachable!(),
            }

            if found_end {
                break;
            }
            current = next + 1;
        }

        if !found_end {
            return Err(parse_err("unable to find the ending bracket"));
        }
        if rows * cols != values.len() {
            return Err(parse_err("mismatch in rows/cols and output array size"));
        }

        Ok(Self {
            dtype: dt,
            rows,
            cols,
            data: values,
        })
    }

    /// Renders to the canonical bracketed form, column-major:
    /// `[v(0,0), v(1,0); v(0,1), v(1,1)]`.
    pub fn render(&self) -> String {
        if self.rows == 0 || self.cols == 0 {
            return "[]".to_string();
        }

        let mut columns = Vec::with_capacity(self.cols);
        for col in 0..self.cols {
            let entries: Vec<String> = (0..self.rows).map(|row| self.get(row, col).render()).collect();
            columns.push(entries.join(", "));
        }

        format!("[{}]", columns.join("; "))
    }

    /// Converts every element to `dt`, keeping the same shape.
    pub fn change_type(&self, dt: DataType) -> Self {
        Self {
            dtype: dt,
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|v| v.convert_type(dt)).collect(),
        }
    }

    /// Resizes the backing storage to `rows x cols`, truncating or padding
    /// with defaults of `dtype` as needed. Matches the source behavior of
    /// resizing the flat backing buffer directly rather than remapping
    /// existing elements into new row/column positions.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        let new_len = rows * cols;
        self.data.resize(new_len, Value::make_default(self.dtype));
        self.rows = rows;
        self.cols = cols;
    }
}

/// On-disk shape for an array value: `{"value": "[...]", "dtype": "..."}`.
#[derive(Serialize, Deserialize)]
struct ValueArrayRecord {
    value: String,
    dtype: String,
}

impl Serialize for ValueArray {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        ValueArrayRecord {
            value: self.render(),
            dtype: self.dtype.to_string(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValueArray {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let record = ValueArrayRecord::deserialize(deserializer)?;
        let dtype: DataType = record
            .dtype
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("unknown data type '{}'", record.dtype)))?;
        ValueArray::from_bracketed(&record.value, dtype).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_array_parses() {
        let a = ValueArray::from_bracketed("[]", DataType::F64).unwrap();
        assert_eq!(a.rows(), 0);
        assert_eq!(a.cols(), 0);
        assert_eq!(a.render(), "[]");
    }

    #[test]
    fn parses_columns_and_rows() {
        let a = ValueArray::from_bracketed("[1,2,3;4,5,6]", DataType::I32).unwrap();
        assert_eq!(a.rows(), 3);
        assert_eq!(a.cols(), 2);
        assert_eq!(a.get(0, 0), Value::I32(1));
        assert_eq!(a.get(1, 0), Value::I32(2));
        assert_eq!(a.get(2, 0), Value::I32(3));
        assert_eq!(a.get(0, 1), Value::I32(4));
        assert_eq!(a.get(2, 1), Value::I32(6));
    }

    #[test]
    fn render_round_trips() {
        let a = ValueArray::from_bracketed("[1, 2, 3; 4, 5, 6]", DataType::F64).unwrap();
        let rendered = a.render();
        let back = ValueArray::from_bracketed(&rendered, DataType::F64).unwrap();
        assert_eq!(a, back);
    }

    #[test]
    fn mismatched_row_lengths_error() {
        assert!(ValueArray::from_bracketed("[1,2;3]", DataType::I32).is_err());
    }

    #[test]
    fn change_type_converts_every_element() {
        let a = ValueArray::from_bracketed("[1,2;3,4]", DataType::I32).unwrap();
        let b = a.change_type(DataType::F64);
        assert_eq!(b.get(0, 0), Value::F64(1.0));
        assert_eq!(b.get(1, 1), Value::F64(4.0));
    }

    #[test]
    fn resize_grows_and_truncates() {
        let mut a = ValueArray::from_bracketed("[1,2;3,4]", DataType::I32).unwrap();
        a.resize(3, 3);
        assert_eq!(a.rows(), 3);
        assert_eq!(a.cols(), 3);
        assert_eq!(a.get(2, 2), Value::I32(0));

        a.resize(1, 1);
        assert_eq!(a.rows(), 1);
        assert_eq!(a.cols(), 1);
    }

    #[test]
    fn serde_round_trips_through_value_dtype_record() {
        let a = ValueArray::from_bracketed("[1,2;3,4]", DataType::I32).unwrap();
        let json = serde_json::to_string(&a).unwrap();
        let back: ValueArray = serde_json::from_str(&json).unwrap();
        assert_eq!(a, back);
    }
}
