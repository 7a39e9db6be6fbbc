//! Dynamically-typed value container produced by decoding and consumed by
//! encoding.
//!
//! `Value` is a closed sum covering every wire type's in-memory shape.
//! `Struct` maps unique field names to values; insertion order is irrelevant
//! (wire order comes from the schema, never from the struct).

use std::collections::HashMap;

use super::types::DataType;

/// A decoded (or to-be-encoded) field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    /// Zig-zag encoded signed 32-bit
    Varint(i32),
    /// 64-bit domain unsigned varint
    UnsignedVarint(u64),
    Float64(f64),
    /// `None` encodes null, legal only for the nullable string types
    String(Option<std::string::String>),
    /// `None` encodes a null array
    Array(Option<Vec<Value>>),
    Struct(Struct),
}

impl Value {
    /// Whether this value's runtime shape is legal for the declared wire type.
    ///
    /// Null strings are only legal for the nullable variants; null arrays are
    /// legal for both array encodings (each has a null sentinel on the wire).
    pub fn matches(&self, data_type: DataType) -> bool {
        match (self, data_type) {
            (Value::Boolean(_), DataType::Boolean) => true,
            (Value::Int8(_), DataType::Int8) => true,
            (Value::Int16(_), DataType::Int16) => true,
            (Value::Int32(_), DataType::Int32) => true,
            (Value::Int64(_), DataType::Int64) => true,
            (Value::Varint(_), DataType::Varint) => true,
            (Value::UnsignedVarint(_), DataType::UnsignedVarint) => true,
            (Value::Float64(_), DataType::Float64) => true,
            (
                Value::String(Some(_)),
                DataType::String
                | DataType::NullableString
                | DataType::CompactString
                | DataType::CompactNullableString,
            ) => true,
            (
                Value::String(None),
                DataType::NullableString | DataType::CompactNullableString,
            ) => true,
            (Value::Array(_), DataType::Array | DataType::CompactArray) => true,
            (Value::Struct(_), DataType::Struct) => true,
            _ => false,
        }
    }
}

/// A typed, dynamically-keyed value container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Struct {
    values: HashMap<std::string::String, Value>,
}

impl Struct {
    pub fn new() -> Self {
        Struct::default()
    }

    /// Store a value under `name`, checking its shape against the declared
    /// wire type.
    ///
    /// # Panics
    ///
    /// Panics when the value's runtime shape disagrees with `data_type`. That
    /// is a programming-contract violation inside codec or handler code, not
    /// a recoverable decode error: the decoder only ever constructs matching
    /// shapes, so this path is unreachable from wire input.
    pub fn set(&mut self, name: &str, data_type: DataType, value: Value) {
        if !value.matches(data_type) {
            panic!("value for field '{name}' has shape {value:?}, expected {data_type:?}");
        }
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // ===== Typed accessors =====
    // Used by handlers and the encoder; None means absent or a different shape.

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(Value::Boolean(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i8(&self, name: &str) -> Option<i8> {
        match self.values.get(name) {
            Some(Value::Int8(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i16(&self, name: &str) -> Option<i16> {
        match self.values.get(name) {
            Some(Value::Int16(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i32(&self, name: &str) -> Option<i32> {
        match self.values.get(name) {
            Some(Value::Int32(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(Value::Int64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(Value::Float64(v)) => Some(*v),
            _ => None,
        }
    }

    /// Non-null string value; null and absent both return None
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(Value::String(Some(v))) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Non-null array elements; null and absent both return None
    pub fn get_array(&self, name: &str) -> Option<&[Value]> {
        match self.values.get(name) {
            Some(Value::Array(Some(v))) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn get_struct(&self, name: &str) -> Option<&Struct> {
        match self.values.get(name) {
            Some(Value::Struct(v)) => Some(v),
            _ => None,
        }
    }
}
