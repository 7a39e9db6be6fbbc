//! Handler registry: maps api keys to their handlers and schema tables.
//!
//! Built once at startup, immutable afterwards; shared across connection
//! tasks behind an `Arc`. Registering two handlers for the same api key is a
//! configuration bug and fails at build time rather than silently replacing.

use std::collections::HashMap;

use crate::broker::error::{BrokerError, Result};
use crate::broker::messages::{RequestInfo, RequestMessage, SupportedApi};
use crate::broker::protocol::{SchemaSet, Struct, VersionRange};

/// One API implementation: its key, version range, per-version schemas and
/// business logic.
pub trait RequestHandler: Send + Sync {
    /// The api key this handler answers
    fn api_key(&self) -> i16;

    /// The inclusive version range this handler accepts
    fn supported_versions(&self) -> VersionRange;

    /// Schemas for one version; `None` outside the supported range
    fn schemas(&self, api_version: i16) -> Option<&SchemaSet>;

    /// Produce the response body for a decoded request.
    ///
    /// `supported_apis` is the broker-wide API table, already sorted by key,
    /// for handlers that advertise it.
    fn handle(
        &self,
        request: &RequestMessage,
        info: &RequestInfo,
        supported_apis: &[SupportedApi],
    ) -> Result<Struct>;
}

/// Immutable api key -> handler table
pub struct HandlerRegistry {
    handlers: HashMap<i16, Box<dyn RequestHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        HandlerRegistry { handlers: HashMap::new() }
    }

    /// Add a handler, rejecting duplicate api keys
    pub fn register(&mut self, handler: Box<dyn RequestHandler>) -> Result<()> {
        let api_key = handler.api_key();
        if self.handlers.contains_key(&api_key) {
            return Err(BrokerError::InvalidConfig(format!(
                "duplicate handler registered for api key {api_key}"
            )));
        }
        self.handlers.insert(api_key, handler);
        Ok(())
    }

    pub fn lookup(&self, api_key: i16) -> Option<&dyn RequestHandler> {
        self.handlers.get(&api_key).map(|h| h.as_ref())
    }

    /// The full advertised API table, sorted by api key for deterministic
    /// response ordering.
    pub fn supported_apis(&self) -> Vec<SupportedApi> {
        let mut apis: Vec<SupportedApi> = self
            .handlers
            .values()
            .map(|h| {
                let versions = h.supported_versions();
                SupportedApi {
                    api_key: h.api_key(),
                    min_version: versions.min(),
                    max_version: versions.max(),
                }
            })
            .collect();
        apis.sort_by_key(|a| a.api_key);
        apis
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        HandlerRegistry::new()
    }
}
