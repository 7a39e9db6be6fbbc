// Wire protocol implementation module
//
// This module contains all protocol-specific code:
// - Schema-driven binary decoding/encoding (protocol)
// - Request/response message types (messages)
// - TCP listener for accepting client connections (listener)
// - Handler registry and per-request dispatch (registry, dispatch)
//
// Architecture Overview:
// =====================
//
// bytes -> decoding::parse_commons -> RequestInfo
//       -> registry lookup by api key, version validation
//       -> decoding::parse_message (header + body Structs per SchemaSet)
//       -> handler business logic -> response body Struct
//       -> encoding (response header + body) -> framed write
//
// Decode and encode are pure functions over a byte buffer and a schema; the
// only shared long-lived state is the HandlerRegistry, which is built once at
// startup and read-only afterwards. A decode failure aborts the current
// request only; it never affects other connections.

pub mod constants;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod listener;
pub mod messages;
pub mod protocol;
pub mod registry;

// Re-export commonly used types for convenience
pub use error::{BrokerError, ErrorCode, Result};
pub use listener::{run as run_listener, ListenerSettings};
pub use messages::{RequestInfo, RequestMessage, ResponseMessage, SupportedApi};
pub use registry::{HandlerRegistry, RequestHandler};
