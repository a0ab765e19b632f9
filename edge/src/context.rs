//! Execution-context parsing for edge replicas.
//!
//! Lambda@Edge replicates the function out of its home region; the
//! replica's invoked-function ARN carries both the viewer-request region
//! (segment 3) and, in segment 6, the execution region and function name
//! joined by a dot. The execution region is where the parameter and secret
//! stores live, so the SDK clients must be pinned to it.

use crate::error::{event_error, Error, EventErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionContext {
    pub region: String,
    pub function_name: String,
    pub viewer_request_region: String,
}

impl FunctionContext {
    /// Parse a colon-delimited invoked-function ARN, e.g.
    /// `arn:aws:lambda:us-east-1:111122223333:function:us-east-1.viewer-request`.
    pub fn from_arn(invoked_function_arn: &str) -> Result<Self, Error> {
        let parts: Vec<&str> = invoked_function_arn.split(':').collect();
        if parts.len() < 7 {
            return Err(event_error(
                EventErrorKind::MalformedFunctionArn,
                "function ARN has too few segments",
            ));
        }

        let (region, function_name) = match parts[6].split_once('.') {
            Some((region, name)) => (region.to_string(), name.to_string()),
            // Non-replicated functions have no region prefix on the name;
            // they run in the region the ARN names.
            None => (parts[3].to_string(), parts[6].to_string()),
        };

        Ok(Self {
            region,
            function_name,
            viewer_request_region: parts[3].to_string(),
        })
    }
}
