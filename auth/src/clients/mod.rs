//! Thin read-through clients for the services the authenticator depends on.

pub mod cloudfront;
pub mod secrets;
pub mod ssm;
