// wirebroker library root
//
// Module declarations for the broker components

pub mod broker; // Wire protocol implementation (codec, dispatch, listener, handlers)
pub mod config; // Runtime configuration (environment-backed)
