//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs`: Rich domain types (validated, business-logic-ready)
//! - `wire.rs`: Raw serde structs matching provider messages
//! - `convert.rs`: `From` conversions between wire and domain types
//! - `state.rs`: State containers with update methods
//! - `client.rs`: Sub-client with WS request methods

pub mod candles;
