//! Shared bootstrap for the Lambda binaries.

pub mod bootstrap;
