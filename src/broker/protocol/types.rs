//! The closed set of wire types.
//!
//! Each variant fixes an exact byte encoding (see `decoding` and `encoding`
//! for the two directions). Keeping this a single exhaustively-matched enum
//! means a new type cannot be added to one direction and silently missed in
//! the other.

/// Wire type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 1 byte, 0 = false, nonzero = true
    Boolean,
    /// Big-endian fixed width signed integers
    Int8,
    Int16,
    Int32,
    Int64,
    /// Unsigned varint bytes, zig-zag decoded to signed 32-bit
    Varint,
    /// Base-128 little-endian varint, at most 10 bytes (64-bit domain)
    UnsignedVarint,
    /// Big-endian IEEE-754 double
    Float64,
    /// INT16 length prefix (length >= 0) + UTF-8 bytes
    String,
    /// INT16 length prefix; -1 encodes null
    NullableString,
    /// Unsigned varint of length+1; null not allowed
    CompactString,
    /// Unsigned varint of length+1; varint 0 encodes null
    CompactNullableString,
    /// INT32 count (-1 = null) + elements per the nested schema
    Array,
    /// Unsigned varint of count+1 (0 = null) + elements
    CompactArray,
    /// The nested schema's fields in order, plus a tagged block when flexible
    Struct,
}

impl DataType {
    /// Whether values of this type carry a nested schema on their field
    pub fn is_composite(&self) -> bool {
        matches!(self, DataType::Array | DataType::CompactArray | DataType::Struct)
    }
}
