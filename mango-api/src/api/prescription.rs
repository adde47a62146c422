//! Prescription API handler
//!
//! `POST /getPrescription` accepts a multipart form with one or more
//! `files` image parts, the five weather fields, and an optional
//! `verify_first` flag, and renders the orchestrator's tagged outcome.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::{routing::post, Json, Router};

use crate::error::{ApiError, ApiResult};
use crate::models::{AnalysisOutcome, WeatherReading};
use crate::services::orchestrator::{AnalysisRequest, UploadedImage};
use crate::AppState;

/// Leaf photo batches run to ten multi-megabyte camera images
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// POST /getPrescription
pub async fn get_prescription(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalysisOutcome>> {
    let mut images: Vec<UploadedImage> = Vec::new();
    let mut humidity: Option<f64> = None;
    let mut temperature: Option<f64> = None;
    let mut wetness: Option<f64> = None;
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;
    let mut verify_first = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("failed to read image upload: {}", e))
                })?;
                images.push(UploadedImage {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            "humidity" => humidity = Some(parse_float(&name, &text_field(field).await?)?),
            "temperature" => temperature = Some(parse_float(&name, &text_field(field).await?)?),
            "wetness" => wetness = Some(parse_float(&name, &text_field(field).await?)?),
            "lat" => lat = Some(parse_float(&name, &text_field(field).await?)?),
            "lon" => lon = Some(parse_float(&name, &text_field(field).await?)?),
            "verify_first" => verify_first = parse_bool(&text_field(field).await?)?,
            other => {
                tracing::debug!(field = %other, "ignoring unknown form field");
            }
        }
    }

    if images.is_empty() {
        return Err(ApiError::BadRequest(
            "at least one image is required".to_string(),
        ));
    }

    let weather = WeatherReading {
        humidity: required(humidity, "humidity")?,
        temperature: required(temperature, "temperature")?,
        wetness: required(wetness, "wetness")?,
        lat: required(lat, "lat")?,
        lon: required(lon, "lon")?,
    };

    tracing::info!(
        images = images.len(),
        verify_first,
        "received prescription request"
    );

    let request = AnalysisRequest {
        images,
        weather,
        verify_species: verify_first,
    };
    let outcome = state.orchestrator.analyze(request).await?;

    Ok(Json(outcome))
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read field '{}': {}", name, e)))
}

fn required(value: Option<f64>, name: &str) -> Result<f64, ApiError> {
    value.ok_or_else(|| ApiError::BadRequest(format!("missing required field '{}'", name)))
}

fn parse_float(name: &str, raw: &str) -> Result<f64, ApiError> {
    raw.trim().parse().map_err(|_| {
        ApiError::BadRequest(format!("field '{}' must be a number (got '{}')", name, raw))
    })
}

fn parse_bool(raw: &str) -> Result<bool, ApiError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(ApiError::BadRequest(format!(
            "field 'verify_first' must be a boolean (got '{}')",
            other
        ))),
    }
}

/// Build prescription routes
pub fn prescription_routes() -> Router<AppState> {
    Router::new()
        .route("/getPrescription", post(get_prescription))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_parse_with_whitespace() {
        assert_eq!(parse_float("humidity", " 96.5 ").unwrap(), 96.5);
        assert!(parse_float("humidity", "wet").is_err());
    }

    #[test]
    fn verify_flag_accepts_common_spellings() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("True").unwrap());
        assert!(parse_bool("1").unwrap());
        assert!(!parse_bool("false").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(!parse_bool("").unwrap());
        assert!(parse_bool("yes").is_err());
    }
}
