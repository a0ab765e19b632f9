//! Viewer-request trigger: gate every request on a valid identity token.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};

use cdn_edge_auth::bootstrap::Runtime;
use edge::event::{CloudfrontEvent, CloudfrontResult};
use edge::handlers;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let runtime = Runtime::init();

    run(service_fn(move |event: LambdaEvent<CloudfrontEvent>| {
        let runtime = runtime.clone();
        async move {
            let service = runtime.service(&event).await?;
            Ok::<CloudfrontResult, Error>(handlers::gate(service, &event.payload).await)
        }
    }))
    .await
}
