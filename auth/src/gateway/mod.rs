//! HTTP gateways to external collaborators.

pub mod cognito;
