//! Tower middleware applied by the server.

pub mod redirect;
