//! "Bare" version of the plant router Lambda.
//!
//! This executable receives API Gateway events as raw JSON and normalizes the
//! v1 and v2 event shapes itself. It is what we deploy: it copes with
//! whichever gateway flavor happens to be in front of it.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;

use plant_router::Services;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let svcs = Services::init().await?;
    let ref_svcs = &svcs;

    run(service_fn(|event: LambdaEvent<Value>| async move {
        let (payload, _context) = event.into_parts();
        Ok::<_, Error>(ref_svcs.handle_event(payload).await)
    }))
    .await?;
    Ok(())
}
