//! "Oneshot" version of the plant router Lambda.
//!
//! This executable handles one gateway event, given as JSON text on the
//! command line, and prints the response to standard output. Configuration
//! comes from the environment just as it does in the cloud.

use lambda_runtime::Error;
use serde_json::Value;
use std::env;

use plant_router::Services;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let mut args = env::args();
    args.next(); // skip argv[0]

    let json_text = args
        .next()
        .ok_or_else(|| -> Error { "first argument should be the gateway event JSON text".into() })?;
    let event: Value = serde_json::from_str(&json_text)?;

    let svcs = Services::init().await?;
    let response = svcs.handle_event(event).await;

    serde_json::to_writer(std::io::stdout().lock(), &response)?;
    println!();
    Ok(())
}
