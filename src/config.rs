//! Process-wide configuration, assembled once at startup.
//!
//! Credentials for the third-party services come either straight from the
//! environment or, when `<NAME>_PARAM` is set instead, from the AWS Systems
//! Manager Parameter Store. The latter is what the cloud deployment uses so
//! that no secret ever lands in the function configuration.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::{collections::HashMap, env, time::Duration};

pub const DEFAULT_PLANT_ID_ENDPOINT: &str = "https://plant.id/api/v3/identification";
pub const DEFAULT_STOREFRONT_API_VERSION: &str = "2024-01";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 25;
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub plant_id_api_key: String,
    pub plant_id_endpoint: String,
    pub store_domain: String,
    pub storefront_token: String,
    pub storefront_api_version: String,
    pub http_timeout: Duration,
    pub max_image_bytes: usize,

    /// Report care level and growth info from our lookup tables rather than
    /// the fixed placeholder. Off unless the operator asks for it.
    pub detailed_care: bool,
}

/// Somewhere that secrets can be fetched from by name.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<String>;
}

#[async_trait]
impl SecretStore for aws_sdk_ssm::Client {
    async fn get_secret(&self, name: &str) -> Result<String> {
        let output = self
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .with_context(|| format!("failed to fetch SSM parameter `{name}`"))?;

        output
            .parameter()
            .and_then(|p| p.value())
            .map(ToOwned::to_owned)
            .ok_or_else(|| anyhow!("SSM parameter `{name}` has no value"))
    }
}

/// An in-memory secret store, for local runs and tests.
#[async_trait]
impl SecretStore for HashMap<String, String> {
    async fn get_secret(&self, name: &str) -> Result<String> {
        self.get(name)
            .cloned()
            .ok_or_else(|| anyhow!("no secret named `{name}`"))
    }
}

impl Config {
    /// Load the configuration from the process environment, using the
    /// Parameter Store for any secrets given by reference.
    pub async fn from_env() -> Result<Self> {
        let aws = aws_config::load_from_env().await;
        let ssm = aws_sdk_ssm::Client::new(&aws);
        Self::resolve(|name| env::var(name).ok(), &ssm).await
    }

    pub async fn resolve<F>(vars: F, store: &dyn SecretStore) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let plant_id_api_key = secret(&vars, store, "PLANT_ID_API_KEY").await?;
        let store_domain = secret(&vars, store, "SHOPIFY_STORE_DOMAIN").await?;
        let storefront_token = secret(&vars, store, "SHOPIFY_STOREFRONT_TOKEN").await?;

        let plant_id_endpoint =
            vars("PLANT_ID_ENDPOINT").unwrap_or_else(|| DEFAULT_PLANT_ID_ENDPOINT.to_owned());
        let storefront_api_version = vars("SHOPIFY_API_VERSION")
            .unwrap_or_else(|| DEFAULT_STOREFRONT_API_VERSION.to_owned());

        let http_timeout = match vars("PLANT_ROUTER_HTTP_TIMEOUT_SECS") {
            Some(s) => Duration::from_secs(
                s.parse()
                    .with_context(|| format!("illegal PLANT_ROUTER_HTTP_TIMEOUT_SECS `{s}`"))?,
            ),
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let max_image_bytes = match vars("PLANT_ROUTER_MAX_IMAGE_BYTES") {
            Some(s) => s
                .parse()
                .with_context(|| format!("illegal PLANT_ROUTER_MAX_IMAGE_BYTES `{s}`"))?,
            None => DEFAULT_MAX_IMAGE_BYTES,
        };

        let detailed_care = vars("PLANT_ROUTER_DETAILED_CARE")
            .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Config {
            plant_id_api_key,
            plant_id_endpoint,
            store_domain: store_domain.trim_end_matches('/').to_owned(),
            storefront_token,
            storefront_api_version,
            http_timeout,
            max_image_bytes,
            detailed_care,
        })
    }

    /// The GraphQL endpoint of the storefront API.
    pub fn storefront_endpoint(&self) -> String {
        format!(
            "{}/api/{}/graphql.json",
            self.store_domain, self.storefront_api_version
        )
    }
}

/// A secret given directly wins over one given by parameter name.
async fn secret<F>(vars: &F, store: &dyn SecretStore, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = vars(name) {
        return Ok(v);
    }

    let param_var = format!("{name}_PARAM");

    match vars(&param_var) {
        Some(param) => store.get_secret(&param).await,
        None => Err(anyhow!(
            "configuration error: neither `{name}` nor `{param_var}` is set"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[tokio::test]
    async fn direct_and_parameter_secrets() {
        let mut store = HashMap::new();
        store.insert("/plants/token".to_owned(), "tok".to_owned());

        let cfg = Config::resolve(
            vars(&[
                ("PLANT_ID_API_KEY", "key"),
                ("SHOPIFY_STORE_DOMAIN", "https://shop.example.com/"),
                ("SHOPIFY_STOREFRONT_TOKEN_PARAM", "/plants/token"),
            ]),
            &store,
        )
        .await
        .unwrap();

        assert_eq!(cfg.plant_id_api_key, "key");
        assert_eq!(cfg.storefront_token, "tok");
        assert_eq!(cfg.plant_id_endpoint, DEFAULT_PLANT_ID_ENDPOINT);
        assert_eq!(
            cfg.storefront_endpoint(),
            "https://shop.example.com/api/2024-01/graphql.json"
        );
        assert_eq!(cfg.http_timeout, Duration::from_secs(25));
        assert_eq!(cfg.max_image_bytes, DEFAULT_MAX_IMAGE_BYTES);
        assert!(!cfg.detailed_care);
    }

    #[tokio::test]
    async fn missing_secret_is_an_error() {
        let store = HashMap::new();
        let err = Config::resolve(vars(&[("PLANT_ID_API_KEY", "key")]), &store)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("SHOPIFY_STORE_DOMAIN"));
    }

    #[tokio::test]
    async fn tunables() {
        let store = HashMap::new();
        let cfg = Config::resolve(
            vars(&[
                ("PLANT_ID_API_KEY", "key"),
                ("SHOPIFY_STORE_DOMAIN", "https://shop.example.com"),
                ("SHOPIFY_STOREFRONT_TOKEN", "tok"),
                ("PLANT_ROUTER_HTTP_TIMEOUT_SECS", "3"),
                ("PLANT_ROUTER_MAX_IMAGE_BYTES", "1024"),
                ("PLANT_ROUTER_DETAILED_CARE", "true"),
            ]),
            &store,
        )
        .await
        .unwrap();

        assert_eq!(cfg.http_timeout, Duration::from_secs(3));
        assert_eq!(cfg.max_image_bytes, 1024);
        assert!(cfg.detailed_care);

        let bad = Config::resolve(
            vars(&[
                ("PLANT_ID_API_KEY", "key"),
                ("SHOPIFY_STORE_DOMAIN", "d"),
                ("SHOPIFY_STOREFRONT_TOKEN", "t"),
                ("PLANT_ROUTER_MAX_IMAGE_BYTES", "lots"),
            ]),
            &store,
        )
        .await;
        assert!(bad.is_err());
    }
}
