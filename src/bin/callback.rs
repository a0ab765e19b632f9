//! Login-callback trigger: finish the code exchange and set the session cookie.

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
            Ok::<CloudfrontResult, Error>(handlers::complete_callback(service, &event.payload).await)
        }
    }))
    .await
}
