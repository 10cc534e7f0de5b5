//! The plant identification and product recommendation Lambda
//!
//! This library crate implements a small request router that sits behind API
//! Gateway. It serves two endpoints: one that identifies a plant from an
//! uploaded photo, by way of the Plant.id API, and one that recommends
//! products from our Shopify storefront for a named plant. The same logic is
//! compiled into three executables:
//!
//! - `plant-router-bare` takes gateway events as raw JSON, and does its own
//!   normalization of the v1 ("REST API") and v2 ("HTTP API") event shapes.
//!   This is what the cloud deployment uses.
//! - `plant-router-proxyevent` lets `lambda_http` decode the proxy event
//!   instead.
//! - `plant-router-oneshot` handles a single event given on the command line,
//!   which is handy for local testing.
//!
//! Every response is a JSON envelope with permissive CORS headers, since the
//! callers are browsers on the storefront's domain.

use futures::FutureExt;
use lambda_runtime::{tracing, Error};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use tracing_subscriber::EnvFilter;

pub mod body;
pub mod care;
pub mod config;
pub mod error;
pub mod event;
pub mod plantid;
pub mod recommend;
pub mod response;
pub mod searchterms;
pub mod storefront;

pub use config::Config;
pub use error::ApiError;
pub use event::{GatewayEvent, InboundRequest};
pub use response::GatewayResponse;

use plantid::{PlantIdClient, PlantIdentifier};
use storefront::{ProductSearch, StorefrontClient};

pub struct Services {
    config: Config,
    identifier: Box<dyn PlantIdentifier>,
    storefront: Box<dyn ProductSearch>,
}

/// Set up logging for the Lambda environment.
///
/// CloudWatch timestamps every line itself, and module names are just noise
/// for a service this size. `RUST_LOG` overrides the default `info` level.
/// Records from the `log` crate, which reqwest uses, are bridged in too.
pub fn init_logging() -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false) // don't print the module name
        .without_time() // don't print time (CloudWatch has it)
        .with_writer(std::io::stderr)
        .try_init()
}

impl Services {
    /// Create a state object for the Lambda, loading configuration and
    /// secrets from the environment.
    pub async fn init() -> Result<Self, Error> {
        init_logging()?;

        let config = Config::from_env().await?;

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let identifier = Box::new(PlantIdClient::new(http.clone(), &config));
        let storefront = Box::new(StorefrontClient::new(http, &config));

        Ok(Services::new(config, identifier, storefront))
    }

    pub fn new(
        config: Config,
        identifier: Box<dyn PlantIdentifier>,
        storefront: Box<dyn ProductSearch>,
    ) -> Self {
        Services {
            config,
            identifier,
            storefront,
        }
    }

    /// Handle a raw gateway event.
    ///
    /// This is the outermost boundary, so it never fails: if the event can't
    /// be understood, or if handling it panics, the client still gets a
    /// well-formed JSON 500.
    pub async fn handle_event(&self, event: Value) -> GatewayResponse {
        tracing::debug!("received event: {event}");

        let handled = AssertUnwindSafe(async {
            let event: GatewayEvent = serde_json::from_value(event)?;
            Ok::<_, serde_json::Error>(self.dispatch(&event.into_request()).await)
        })
        .catch_unwind()
        .await;

        match handled {
            Ok(Ok(resp)) => resp,

            Ok(Err(e)) => {
                tracing::error!("error processing request: {e}");
                GatewayResponse::server_error(&e.to_string())
            }

            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unexpected failure".to_owned());
                tracing::error!("panic while processing request: {message}");
                GatewayResponse::server_error(&message)
            }
        }
    }

    /// Route a normalized request to its handler.
    ///
    /// Any method other than `OPTIONS` is accepted on both endpoints; we match
    /// on the path suffix so that stage prefixes don't matter.
    pub async fn dispatch(&self, req: &InboundRequest) -> GatewayResponse {
        tracing::info!("{} {}", req.method, req.path);

        if req.method == "OPTIONS" {
            return GatewayResponse::preflight();
        }

        let outcome = if req.path.ends_with("/identify-plant") {
            self.identify_plant(req).await
        } else if req.path.ends_with("/get-recommendations") {
            self.get_recommendations(req).await
        } else {
            Err(ApiError::NotFound(format!("Endpoint not found: {}", req.path)))
        };

        match outcome {
            Ok(result) => GatewayResponse::success(result),

            Err(e) => {
                tracing::error!("{} {} failed: {e}", req.method, req.path);
                GatewayResponse::failure(&e)
            }
        }
    }

    async fn identify_plant(&self, req: &InboundRequest) -> Result<Value, ApiError> {
        let image = body::image_payload(req, self.config.max_image_bytes)?;
        let plant = self.identifier.identify(&image).await?;
        Ok(serde_json::to_value(plant)?)
    }

    async fn get_recommendations(&self, req: &InboundRequest) -> Result<Value, ApiError> {
        let plant_name = body::plant_name(req)?;
        tracing::info!("recommendation request for plant: {plant_name}");

        let products = recommend::recommend(self.storefront.as_ref(), &plant_name).await;
        Ok(serde_json::to_value(products)?)
    }
}
