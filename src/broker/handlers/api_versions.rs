//! ApiVersions (api key 18): advertises which APIs and version ranges this
//! broker speaks.
//!
//! Versions 0 through 2 use the non-flexible request header (V1); versions 3
//! and 4 use the flexible header (V2) and carry client software name and
//! version as compact strings in the body. The response header is V0 at every
//! version: clients read the ApiVersions response before they know whether
//! the broker understands flexible encodings.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::broker::constants::{API_KEY_API_VERSIONS, ERROR_NONE};
use crate::broker::error::Result;
use crate::broker::messages::{RequestInfo, RequestMessage, SupportedApi};
use crate::broker::protocol::{
    DataType, Field, RequestHeaderVersion, ResponseHeaderVersion, Schema, SchemaSet, Struct,
    Value, VersionRange,
};
use crate::broker::registry::RequestHandler;

/// Element schema for the advertised API table
static API_KEY_SCHEMA: Lazy<Arc<Schema>> = Lazy::new(|| {
    Arc::new(Schema::new(vec![
        Field::plain("api_key", DataType::Int16, VersionRange::since(0)),
        Field::plain("min_version", DataType::Int16, VersionRange::since(0)),
        Field::plain("max_version", DataType::Int16, VersionRange::since(0)),
    ]))
});

/// Request body: empty before version 3, client software identity after
static REQUEST_BODY: Lazy<Arc<Schema>> = Lazy::new(|| {
    Arc::new(Schema::new(vec![
        Field::plain("client_software_name", DataType::CompactString, VersionRange::since(3)),
        Field::plain("client_software_version", DataType::CompactString, VersionRange::since(3)),
    ]))
});

static RESPONSE_BODY: Lazy<Arc<Schema>> = Lazy::new(|| {
    Arc::new(Schema::new(vec![
        Field::plain("error_code", DataType::Int16, VersionRange::since(0)),
        Field::nested(
            "api_keys",
            DataType::Array,
            VersionRange::since(0),
            Arc::clone(&API_KEY_SCHEMA),
        ),
        Field::plain("throttle_time_ms", DataType::Int32, VersionRange::since(1)),
    ]))
});

const SUPPORTED: VersionRange = VersionRange::of(0, 4);

pub struct ApiVersionsHandler {
    schemas: HashMap<i16, SchemaSet>,
}

impl ApiVersionsHandler {
    pub fn new() -> Self {
        let mut schemas = HashMap::new();
        for version in SUPPORTED.min()..=SUPPORTED.max() {
            let request_header = if version >= 3 {
                RequestHeaderVersion::V2
            } else {
                RequestHeaderVersion::V1
            };
            schemas.insert(
                version,
                SchemaSet {
                    request_header,
                    request_body: Arc::clone(&REQUEST_BODY),
                    response_header: ResponseHeaderVersion::V0,
                    response_body: Arc::clone(&RESPONSE_BODY),
                },
            );
        }
        ApiVersionsHandler { schemas }
    }
}

impl Default for ApiVersionsHandler {
    fn default() -> Self {
        ApiVersionsHandler::new()
    }
}

impl RequestHandler for ApiVersionsHandler {
    fn api_key(&self) -> i16 {
        API_KEY_API_VERSIONS
    }

    fn supported_versions(&self) -> VersionRange {
        SUPPORTED
    }

    fn schemas(&self, api_version: i16) -> Option<&SchemaSet> {
        self.schemas.get(&api_version)
    }

    fn handle(
        &self,
        _request: &RequestMessage,
        _info: &RequestInfo,
        supported_apis: &[SupportedApi],
    ) -> Result<Struct> {
        let api_keys: Vec<Value> = supported_apis
            .iter()
            .map(|api| {
                let mut entry = Struct::new();
                entry.set("api_key", DataType::Int16, Value::Int16(api.api_key));
                entry.set("min_version", DataType::Int16, Value::Int16(api.min_version));
                entry.set("max_version", DataType::Int16, Value::Int16(api.max_version));
                Value::Struct(entry)
            })
            .collect();

        let mut body = Struct::new();
        body.set("error_code", DataType::Int16, Value::Int16(ERROR_NONE));
        body.set("api_keys", DataType::Array, Value::Array(Some(api_keys)));
        body.set("throttle_time_ms", DataType::Int32, Value::Int32(0));
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_version_range() {
        let handler = ApiVersionsHandler::new();
        assert_eq!(handler.api_key(), 18);
        assert!(handler.supported_versions().contains(0));
        assert!(handler.supported_versions().contains(4));
        assert!(!handler.supported_versions().contains(5));
    }

    #[test]
    fn test_header_versions_per_api_version() {
        let handler = ApiVersionsHandler::new();
        for version in 0..=2 {
            let set = handler.schemas(version).unwrap();
            assert_eq!(set.request_header, RequestHeaderVersion::V1);
            assert!(!set.is_flexible());
        }
        for version in 3..=4 {
            let set = handler.schemas(version).unwrap();
            assert_eq!(set.request_header, RequestHeaderVersion::V2);
            assert!(set.is_flexible());
        }
        assert!(handler.schemas(5).is_none());
        assert!(handler.schemas(-1).is_none());
    }

    #[test]
    fn test_response_header_always_v0() {
        let handler = ApiVersionsHandler::new();
        for version in 0..=4 {
            let set = handler.schemas(version).unwrap();
            assert_eq!(set.response_header, ResponseHeaderVersion::V0);
        }
    }

    #[test]
    fn test_body_lists_every_supported_api() {
        let handler = ApiVersionsHandler::new();
        let apis = [
            SupportedApi { api_key: 1, min_version: 0, max_version: 16 },
            SupportedApi { api_key: 18, min_version: 0, max_version: 4 },
        ];
        let request = RequestMessage { header: Struct::new(), body: Struct::new() };
        let info = RequestInfo {
            message_size: 10,
            api_key: 18,
            api_version: 0,
            correlation_id: 1,
            client_id: None,
            payload: bytes::Bytes::new(),
        };

        let body = handler.handle(&request, &info, &apis).unwrap();
        assert_eq!(body.get_i16("error_code"), Some(0));
        assert_eq!(body.get_i32("throttle_time_ms"), Some(0));
        let entries = body.get_array("api_keys").unwrap();
        assert_eq!(entries.len(), 2);
        match &entries[1] {
            Value::Struct(entry) => {
                assert_eq!(entry.get_i16("api_key"), Some(18));
                assert_eq!(entry.get_i16("min_version"), Some(0));
                assert_eq!(entry.get_i16("max_version"), Some(4));
            }
            other => panic!("expected struct element, got {other:?}"),
        }
    }
}
