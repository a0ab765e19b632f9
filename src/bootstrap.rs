//! Process setup shared by the two Lambda entry points.
//!
//! Configuration and logging are initialized in `main`, but the
//! [`AuthService`] is built lazily on the first invocation: the execution
//! region comes from the invoked-function ARN, which only the per-invocation
//! context carries. Warm invocations reuse the same service and its caches.

use std::sync::Arc;

use lambda_runtime::LambdaEvent;
use log::*;
use tokio::sync::OnceCell;

use auth::service::AuthService;
use edge::context::FunctionContext;
use edge::event::CloudfrontEvent;
use service::config::Config;
use service::logging::Logger;

pub struct Runtime {
    config: Config,
    service: OnceCell<AuthService>,
}

impl Runtime {
    /// Read configuration, start the logger and return the shared runtime.
    pub fn init() -> Arc<Self> {
        let config = Config::new();
        Logger::init_logger(&config);

        Arc::new(Self {
            config,
            service: OnceCell::new(),
        })
    }

    /// The process-wide [`AuthService`], built on first use.
    pub async fn service(
        &self,
        event: &LambdaEvent<CloudfrontEvent>,
    ) -> Result<&AuthService, lambda_runtime::Error> {
        let region = self.region_for(event);

        self.service
            .get_or_try_init(|| async move {
                info!("Initializing auth service (region: {region:?})");
                AuthService::for_region(region).await
            })
            .await
            .map_err(Into::into)
    }

    /// Region the parameter and secret stores live in: an explicit override
    /// wins, then the execution region parsed from the function ARN, then
    /// the SDK's default chain.
    fn region_for(&self, event: &LambdaEvent<CloudfrontEvent>) -> Option<String> {
        if let Some(region) = &self.config.aws_region_override {
            return Some(region.clone());
        }

        match FunctionContext::from_arn(&event.context.invoked_function_arn) {
            Ok(context) => Some(context.region),
            Err(err) => {
                warn!("Could not derive region from function ARN: {err}");
                None
            }
        }
    }
}
