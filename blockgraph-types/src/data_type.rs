use strum::{Display, EnumString};

/// The closed set of data types a [`crate::Value`] can carry.
///
/// `NONE` means "not yet determined" and is never executable — a block with
/// any `NONE` input or output is always in error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum DataType {
    NONE,
    BOOL,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

/// Static flags describing a [`DataType`], mirroring the metadata table in the spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataTypeMeta {
    pub name: &'static str,
    pub is_numeric: bool,
    pub is_integral: bool,
    pub is_float: bool,
    pub is_signed: bool,
}

impl Default for DataType {
    /// `NONE` — "not yet determined" is the natural zero value for a type
    /// that hasn't been propagated yet.
    fn default() -> Self {
        DataType::NONE
    }
}

impl DataType {
    /// Returns the metadata row for this type.
    pub fn meta(self) -> DataTypeMeta {
        use DataType::*;
        match self {
            NONE => DataTypeMeta {
                name: "NONE",
                is_numeric: false,
                is_integral: false,
                is_float: false,
                is_signed: false,
            },
            BOOL => DataTypeMeta {
                name: "BOOL",
                is_numeric: false,
                is_integral: false,
                is_float: false,
                is_signed: false,
            },
            U8 => DataTypeMeta {
                name: "U8",
                is_numeric: true,
                is_integral: true,
                is_float: false,
                is_signed: false,
            },
            I8 => DataTypeMeta {
                name: "I8",
                is_numeric: true,
                is_integral: true,
                is_float: false,
                is_signed: true,
            },
            U16 => DataTypeMeta {
                name: "U16",
                is_numeric: true,
                is_integral: true,
                is_float: false,
                is_signed: false,
            },
            I16 => DataTypeMeta {
                name: "I16",
                is_numeric: true,
                is_integral: true,
                is_float: false,
                is_signed: true,
            },
            U32 => DataTypeMeta {
                name: "U32",
                is_numeric: true,
                is_integral: true,
                is_float: false,
                is_signed: false,
            },
            I32 => DataTypeMeta {
                name: "I32",
                is_numeric: true,
                is_integral: true,
                is_float: false,
                is_signed: true,
            },
            U64 => DataTypeMeta {
                name: "U64",
                is_numeric: true,
                is_integral: true,
                is_float: false,
                is_signed: false,
            },
            I64 => DataTypeMeta {
                name: "I64",
                is_numeric: true,
                is_integral: true,
                is_float: false,
                is_signed: true,
            },
            F32 => DataTypeMeta {
                name: "F32",
                is_numeric: true,
                is_integral: false,
                is_float: true,
                is_signed: true,
            },
            F64 => DataTypeMeta {
                name: "F64",
                is_numeric: true,
                is_integral: false,
                is_float: true,
                is_signed: true,
            },
        }
    }

    pub fn is_numeric(self) -> bool {
        self.meta().is_numeric
    }

    pub fn is_integral(self) -> bool {
        self.meta().is_integral
    }

    pub fn is_float(self) -> bool {
        self.meta().is_float
    }

    pub fn is_signed(self) -> bool {
        self.meta().is_signed
    }
}
