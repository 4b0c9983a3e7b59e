//! License records and the request/response shapes built on them.

pub mod models;
pub mod wire;
