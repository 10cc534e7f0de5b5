//! "Proxy event" version of the plant router Lambda.
//!
//! Here `lambda_http` does the work of decoding API Gateway's proxy event
//! framework into an HTTP request, and of encoding our response. Any
//! base64-encoded body has already been decoded by the time we see it.

use lambda_http::{run, service_fn, Error, Request};

use plant_router::{InboundRequest, Services};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let svcs = Services::init().await?;
    let ref_svcs = &svcs;

    run(service_fn(|req: Request| async move {
        let req = InboundRequest::from_http(req);
        ref_svcs.dispatch(&req).await.into_http()
    }))
    .await?;
    Ok(())
}
