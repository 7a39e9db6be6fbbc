//! Declarative, versioned, optionally-tagged field lists.
//!
//! A `Schema` is an ordered sequence of `Field`s. Order matters for untagged
//! fields (wire order = declaration order); tagged fields travel out-of-band
//! in the trailing tagged block, each self-describing its tag and byte length.

use std::sync::Arc;

use super::types::DataType;
use super::version::VersionRange;

/// One field of a schema
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub data_type: DataType,
    /// API versions in which this field is present on the wire
    pub versions: VersionRange,
    /// Present for tagged fields only; transmitted out-of-band by tag
    pub tag: Option<u32>,
    /// Element/field schema, required iff the type is composite
    pub nested: Option<Arc<Schema>>,
}

impl Field {
    /// An untagged primitive field
    pub fn plain(name: &'static str, data_type: DataType, versions: VersionRange) -> Self {
        debug_assert!(!data_type.is_composite(), "composite field '{name}' needs a nested schema");
        Field { name, data_type, versions, tag: None, nested: None }
    }

    /// An untagged composite field (array or struct) with its nested schema
    pub fn nested(
        name: &'static str,
        data_type: DataType,
        versions: VersionRange,
        nested: Arc<Schema>,
    ) -> Self {
        debug_assert!(data_type.is_composite(), "field '{name}' does not take a nested schema");
        Field { name, data_type, versions, tag: None, nested: Some(nested) }
    }

    /// A tagged primitive field, present on the wire only when its tag is
    /// explicitly transmitted
    pub fn tagged(
        name: &'static str,
        data_type: DataType,
        versions: VersionRange,
        tag: u32,
    ) -> Self {
        debug_assert!(!data_type.is_composite(), "composite field '{name}' needs a nested schema");
        Field { name, data_type, versions, tag: Some(tag), nested: None }
    }
}

/// An ordered sequence of fields describing one message shape
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Schema { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up the declared field carrying `tag`, if any
    pub fn tagged_field(&self, tag: u32) -> Option<&Field> {
        self.fields.iter().find(|f| f.tag == Some(tag))
    }
}

// ===== Header variants =====
// Selected by the negotiated schema set, not by inheritance: the common
// request header fields are always read by parse_commons; V2 additionally
// carries a trailing tagged-field block.

/// Request header wire variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestHeaderVersion {
    /// INT16-length-prefixed nullable client id, no tagged block
    V1,
    /// Same common fields plus a trailing tagged-field block
    V2,
}

impl RequestHeaderVersion {
    /// Whether messages negotiated under this header carry tagged blocks
    pub fn is_flexible(&self) -> bool {
        matches!(self, RequestHeaderVersion::V2)
    }

    /// Tagged fields declared for the header itself (none today; unknown
    /// transmitted tags are skipped for forward compatibility)
    pub fn tag_schema(&self) -> &'static Schema {
        static EMPTY: Schema = Schema { fields: Vec::new() };
        &EMPTY
    }
}

/// Response header wire variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseHeaderVersion {
    /// Bare INT32 correlation id
    V0,
    /// INT32 correlation id followed by a tagged-field block
    V1,
}

impl ResponseHeaderVersion {
    pub fn is_flexible(&self) -> bool {
        matches!(self, ResponseHeaderVersion::V1)
    }
}

/// The four schemas needed for one (api key, version) pair
#[derive(Debug, Clone)]
pub struct SchemaSet {
    pub request_header: RequestHeaderVersion,
    pub request_body: Arc<Schema>,
    pub response_header: ResponseHeaderVersion,
    pub response_body: Arc<Schema>,
}

impl SchemaSet {
    /// Whether bodies negotiated under this set carry tagged blocks
    pub fn is_flexible(&self) -> bool {
        self.request_header.is_flexible()
    }
}
