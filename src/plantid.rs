//! The plant identification service.
//!
//! We forward the uploaded image to the Plant.id v3 identification API and
//! boil its (large) answer down to a single [`PlantRecord`] describing the
//! top-ranked candidate.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use lambda_runtime::tracing;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    care::{self, GrowthInfo},
    config::Config,
    error::ApiError,
};

const INVALID_RESPONSE: &str = "Invalid response from plant identification service";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlantRecord {
    pub name: String,
    pub probability: Option<f64>,
    pub details: PlantDetails,
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlantDetails {
    pub common_names: Vec<String>,
    pub scientific_name: String,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub care_level: String,
    pub growth_info: GrowthInfo,
}

/// Something that can tell us what plant is in a picture.
#[async_trait]
pub trait PlantIdentifier: Send + Sync {
    async fn identify(&self, image: &[u8]) -> Result<PlantRecord, ApiError>;
}

/// Client for the Plant.id HTTP API.
pub struct PlantIdClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    detailed_care: bool,
}

impl PlantIdClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        PlantIdClient {
            http,
            endpoint: config.plant_id_endpoint.clone(),
            api_key: config.plant_id_api_key.clone(),
            detailed_care: config.detailed_care,
        }
    }
}

#[async_trait]
impl PlantIdentifier for PlantIdClient {
    async fn identify(&self, image: &[u8]) -> Result<PlantRecord, ApiError> {
        let request = json!({
            "images": [STANDARD.encode(image)],
            "latitude": null,
            "longitude": null,
            "similar_images": true,
        });

        tracing::info!("sending {} image bytes to Plant.ID API", image.len());

        let resp = self
            .http
            .post(&self.endpoint)
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();

        if !status.is_success() {
            let message = format!(
                "HTTP Error from Plant.ID API: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            );
            tracing::error!("{message}");

            if let Ok(text) = resp.text().await {
                tracing::error!("error response body: {text}");
            }

            return Err(ApiError::Upstream(message));
        }

        let doc: Value = resp.json().await?;
        tracing::debug!("Plant.ID API response: {doc}");

        plant_record_from_response(&doc, self.detailed_care)
    }
}

#[derive(Debug, Deserialize)]
struct IdentificationResult {
    classification: Option<Classification>,
}

#[derive(Debug, Deserialize)]
struct Classification {
    suggestions: Option<Vec<Suggestion>>,
    similar_images: Option<Vec<SimilarImage>>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    name: Option<String>,
    probability: Option<f64>,
    details: Option<SuggestionDetails>,
    similar_images: Option<Vec<SimilarImage>>,
}

#[derive(Debug, Default, Deserialize)]
struct SuggestionDetails {
    common_names: Option<Vec<String>>,
    taxonomy: Option<Taxonomy>,
    cultivation: Option<Value>,
    edible_parts: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Taxonomy {
    family: Option<String>,
    genus: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SimilarImage {
    url: Option<String>,
}

fn first_url(images: Option<&Vec<SimilarImage>>) -> Option<String> {
    images?.first()?.url.clone()
}

fn text_at(v: &Option<Value>, key: &str) -> Option<String> {
    v.as_ref()?.get(key)?.as_str().map(ToOwned::to_owned)
}

/// Reduce a Plant.id identification response to our output record.
pub fn plant_record_from_response(doc: &Value, detailed_care: bool) -> Result<PlantRecord, ApiError> {
    let result = match doc.get("result") {
        None | Some(Value::Null) => None,
        Some(Value::Object(m)) if m.is_empty() => None,
        Some(r) => Some(r),
    };

    let result = result.ok_or_else(|| {
        tracing::error!("no result in Plant.ID response");
        ApiError::Upstream(INVALID_RESPONSE.to_owned())
    })?;

    let result = IdentificationResult::deserialize(result).map_err(|e| {
        tracing::error!("unexpected Plant.ID response shape: {e}");
        ApiError::Upstream(INVALID_RESPONSE.to_owned())
    })?;

    let classification = result.classification;

    let (suggestions, shared_images) = match classification {
        Some(c) => (c.suggestions.unwrap_or_default(), c.similar_images),
        None => (Vec::new(), None),
    };

    let top = suggestions.into_iter().next().ok_or_else(|| {
        tracing::error!("no plant suggestions in Plant.ID response");
        ApiError::NotFound("No plants identified".to_owned())
    })?;

    let scientific_name = top.name.unwrap_or_default();
    let details = top.details.unwrap_or_default();
    let common_names = details.common_names.unwrap_or_default();
    let name = common_names
        .first()
        .cloned()
        .unwrap_or_else(|| scientific_name.clone());

    let image_url =
        first_url(shared_images.as_ref()).or_else(|| first_url(top.similar_images.as_ref()));

    let taxonomy = details.taxonomy.unwrap_or_default();

    let mut growth_info = GrowthInfo {
        soil_ph: text_at(&details.edible_parts, "soil_ph"),
        light: text_at(&details.cultivation, "light"),
        atmospheric_humidity: text_at(&details.cultivation, "atmospheric_humidity"),
        soil_nutrient: text_at(&details.cultivation, "soil_nutrient"),
    };

    let care_level = if detailed_care {
        growth_info = growth_info.or(care::growth_info_for(&scientific_name));
        care::determine_care_level(&scientific_name)
    } else {
        care::PLACEHOLDER_CARE_LEVEL
    };

    tracing::info!(
        "identified plant: {name} (scientific name: {scientific_name}, confidence: {:?})",
        top.probability
    );

    Ok(PlantRecord {
        name,
        probability: top.probability,
        details: PlantDetails {
            common_names,
            scientific_name,
            family: taxonomy.family,
            genus: taxonomy.genus,
            care_level: care_level.to_owned(),
            growth_info,
        },
        image_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monstera_response() -> Value {
        json!({
            "access_token": "abc",
            "result": {
                "is_plant": { "probability": 0.99, "binary": true },
                "classification": {
                    "suggestions": [
                        {
                            "id": "1",
                            "name": "Monstera deliciosa",
                            "probability": 0.93,
                            "details": {
                                "common_names": ["Swiss cheese plant", "Split-leaf philodendron"],
                                "taxonomy": { "family": "Araceae", "genus": "Monstera" },
                                "cultivation": { "light": "Bright, indirect light" }
                            },
                            "similar_images": [
                                { "url": "https://plant.id/media/images/a.jpg", "similarity": 0.8 }
                            ]
                        },
                        { "id": "2", "name": "Philodendron bipinnatifidum", "probability": 0.03 }
                    ]
                }
            }
        })
    }

    #[test]
    fn serializes_known_fields() {
        let record = plant_record_from_response(&monstera_response(), false).unwrap();
        let v = serde_json::to_value(&record).unwrap();

        assert_eq!(
            v,
            json!({
                "name": "Swiss cheese plant",
                "probability": 0.93,
                "details": {
                    "common_names": ["Swiss cheese plant", "Split-leaf philodendron"],
                    "scientific_name": "Monstera deliciosa",
                    "family": "Araceae",
                    "genus": "Monstera",
                    "care_level": "Medium",
                    "growth_info": {
                        "soil_ph": null,
                        "light": "Bright, indirect light",
                        "atmospheric_humidity": null,
                        "soil_nutrient": null
                    }
                },
                "image_url": "https://plant.id/media/images/a.jpg"
            })
        );
    }

    #[test]
    fn falls_back_to_taxonomic_name() {
        let doc = json!({
            "result": {
                "classification": {
                    "suggestions": [
                        { "name": "Crassula ovata", "probability": 0.5, "details": { "common_names": null } }
                    ],
                    "similar_images": [{ "url": "https://example.com/jade.jpg" }]
                }
            }
        });

        let record = plant_record_from_response(&doc, false).unwrap();
        assert_eq!(record.name, "Crassula ovata");
        assert!(record.details.common_names.is_empty());
        assert_eq!(record.details.family, None);
        assert_eq!(record.image_url.as_deref(), Some("https://example.com/jade.jpg"));
    }

    #[test]
    fn detailed_care_uses_lookups() {
        let record = plant_record_from_response(&monstera_response(), true).unwrap();
        assert_eq!(record.details.care_level, "Intermediate");
        assert_eq!(
            record.details.growth_info.soil_ph.as_deref(),
            Some("5.5-7.0 (slightly acidic to neutral)")
        );
        assert_eq!(
            record.details.growth_info.light.as_deref(),
            Some("Bright, indirect light")
        );
    }

    #[test]
    fn empty_suggestions_is_not_found() {
        let doc = json!({ "result": { "classification": { "suggestions": [] } } });
        let err = plant_record_from_response(&doc, false).unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "No plants identified");
    }

    #[test]
    fn missing_result_is_invalid() {
        for doc in [json!({ "status": "COMPLETED" }), json!({ "result": {} }), json!({ "result": null })] {
            let err = plant_record_from_response(&doc, false).unwrap_err();
            assert_eq!(err.status_code(), 500);
            assert_eq!(err.to_string(), INVALID_RESPONSE);
        }
    }
}
