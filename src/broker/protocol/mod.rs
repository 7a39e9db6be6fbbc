// Schema-driven binary codec
//
// The codec is split into:
// - types: the closed set of wire types (DataType)
// - value: the dynamically-typed value container (Value, Struct)
// - version: inclusive version range arithmetic
// - schema: declarative, versioned field lists (Field, Schema, SchemaSet)
// - decoding: untrusted bytes -> RequestInfo / Struct
// - encoding: Struct -> bytes, the exact inverse of decoding

pub mod decoding;
pub mod encoding;
pub mod schema;
pub mod types;
pub mod value;
pub mod version;

pub use schema::{Field, RequestHeaderVersion, ResponseHeaderVersion, Schema, SchemaSet};
pub use types::DataType;
pub use value::{Struct, Value};
pub use version::VersionRange;
