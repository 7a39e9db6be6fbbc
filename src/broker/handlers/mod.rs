// API handlers
//
// Each handler owns its schema tables (one SchemaSet per supported version)
// and its business logic, and plugs into the dispatcher through the
// RequestHandler trait.

pub mod api_versions;

pub use api_versions::ApiVersionsHandler;
