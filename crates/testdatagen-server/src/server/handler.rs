//! HTTP routes.
//!
//! | Route                  | Response                                   |
//! |------------------------|--------------------------------------------|
//! | `/healthcheck`         | JSON liveness probe                        |
//! | `/RandomUUID`          | `antal` UUIDs, one per line                |
//! | `/RandomPerson`        | `antal` persons as `;`-separated CSV       |
//! | `/RandomPersonJson`    | one person as pretty-printed JSON          |
//! | `/formatPersonnummer`  | short and long form of `pnr`               |
//!
//! Every response carries `Cache-Control: no-cache`, and CORS is open to any
//! origin.

use crate::server::{
    error::ApiError,
    person::{BOM, CSV_HEADER},
    service::{PersonService, WindowRequest},
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use testdatagen::MAX_AGE;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

const CSV: &str = "text/csv";
const CSV_UTF8: &str = "text/csv; charset=UTF-8";
const JSON_UTF8: &str = "application/json; charset=UTF-8";

pub fn router(service: PersonService) -> Router {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/RandomUUID", get(random_uuid))
        .route("/RandomPerson", get(random_person))
        .route("/RandomPersonJson", get(random_person_json))
        .route("/formatPersonnummer", get(format_personnummer))
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-cache"),
                )),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub struct CountParams {
    antal: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PersonParams {
    antal: Option<String>,
    #[serde(rename = "minAge")]
    min_age: Option<String>,
    #[serde(rename = "maxAge")]
    max_age: Option<String>,
    #[serde(rename = "minBirthYear")]
    min_birth_year: Option<String>,
    #[serde(rename = "maxBirthYear")]
    max_birth_year: Option<String>,
}

impl PersonParams {
    /// Birth years win over ages when both are given.
    fn window(&self) -> Result<WindowRequest, ApiError> {
        let min_year = optional_int("minBirthYear", self.min_birth_year.as_deref())?;
        let max_year = optional_int("maxBirthYear", self.max_birth_year.as_deref())?;
        if min_year.is_some() || max_year.is_some() {
            return Ok(WindowRequest::BirthYears {
                min: min_year,
                max: max_year,
            });
        }

        let min_age = optional_age("minAge", self.min_age.as_deref())?;
        let max_age = optional_age("maxAge", self.max_age.as_deref())?;
        if min_age.is_some() || max_age.is_some() {
            return Ok(WindowRequest::Ages {
                min: min_age,
                max: max_age,
            });
        }

        Ok(WindowRequest::Default)
    }
}

#[derive(Debug, Deserialize)]
pub struct FormatParams {
    pnr: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FormattedResponse {
    short: String,
    long: String,
}

async fn healthcheck() -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "service": "API Health Check",
    }))
    .into_response()
}

#[tracing::instrument(skip_all)]
async fn random_uuid(
    State(service): State<PersonService>,
    Query(params): Query<CountParams>,
) -> Result<Response, ApiError> {
    let count = parse_count(params.antal.as_deref(), service.config().max_uuids)?;
    let start = Instant::now();
    tracing::info!("Creating RandomUUID: {count}");

    let mut body = String::with_capacity(count * 37);
    for uuid in service.uuids(count) {
        body.push_str(&uuid.to_string());
        body.push('\n');
    }

    tracing::info!("RandomUUID exec time: {}ms", start.elapsed().as_millis());
    Ok(([(header::CONTENT_TYPE, CSV)], body).into_response())
}

#[tracing::instrument(skip_all)]
async fn random_person(
    State(service): State<PersonService>,
    Query(params): Query<PersonParams>,
) -> Result<Response, ApiError> {
    let count = parse_count(params.antal.as_deref(), service.config().max_persons)?;
    let window = params.window()?;
    let start = Instant::now();
    tracing::info!("Creating RandomPerson: {count} ({window:?})");

    let mut body = String::with_capacity(CSV_HEADER.len() + 2 + count * 160);
    body.push(BOM);
    body.push_str(CSV_HEADER);
    body.push('\n');

    if count > 0 {
        for person in service.persons(count, window).await? {
            body.push_str(&person.csv_row());
        }
    }

    tracing::info!("RandomPerson exec time: {}ms", start.elapsed().as_millis());
    Ok((
        [
            (header::CONTENT_TYPE, CSV_UTF8),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"RandomPerson.csv\""),
        ],
        body,
    )
        .into_response())
}

#[tracing::instrument(skip_all)]
async fn random_person_json(
    State(service): State<PersonService>,
    Query(params): Query<PersonParams>,
) -> Result<Response, ApiError> {
    let window = params.window()?;
    let start = Instant::now();

    let person = service
        .persons(1, window)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Internal {
            context: "batch of one came back empty".to_owned(),
        })?;
    let body = serde_json::to_string_pretty(&person).map_err(|e| ApiError::Internal {
        context: e.to_string(),
    })?;

    tracing::info!("RandomPersonJson exec time: {}ms", start.elapsed().as_millis());
    Ok(([(header::CONTENT_TYPE, JSON_UTF8)], body).into_response())
}

#[tracing::instrument(skip_all)]
async fn format_personnummer(
    State(service): State<PersonService>,
    Query(params): Query<FormatParams>,
) -> Result<Json<FormattedResponse>, ApiError> {
    let raw = params
        .pnr
        .ok_or_else(|| ApiError::invalid("parameter pnr is required"))?;
    let formatted = service.format(&raw)?;
    Ok(Json(FormattedResponse {
        short: formatted.short,
        long: formatted.long,
    }))
}

/// Validates `antal`: digits only, at most `limit`.
fn parse_count(raw: Option<&str>, limit: usize) -> Result<usize, ApiError> {
    let raw = raw.unwrap_or_default();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::invalid("parameter must be an integer"));
    }
    match raw.parse::<usize>() {
        Ok(count) if count <= limit => Ok(count),
        _ => Err(ApiError::invalid(format!("parameter limit {limit}"))),
    }
}

/// Parses an optional integer with the same strictness as `antal`: an
/// optional sign followed by digits, no surrounding whitespace.
fn optional_int(name: &str, raw: Option<&str>) -> Result<Option<i32>, ApiError> {
    raw.map(|value| {
        let digits = value.strip_prefix('-').unwrap_or(value);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ApiError::invalid(format!("parameter {name} must be an integer")));
        }
        value
            .parse::<i32>()
            .map_err(|_| ApiError::invalid(format!("parameter {name} must be an integer")))
    })
    .transpose()
}

/// Ages are calendar-year ages in `0..=MAX_AGE`.
fn optional_age(name: &str, raw: Option<&str>) -> Result<Option<i32>, ApiError> {
    match optional_int(name, raw)? {
        Some(age) if !(0..=MAX_AGE).contains(&age) => Err(ApiError::invalid(format!(
            "parameter {name} must be between 0 and {MAX_AGE}"
        ))),
        age => Ok(age),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_validation() {
        assert_eq!(parse_count(Some("0"), 10).unwrap(), 0);
        assert_eq!(parse_count(Some("10"), 10).unwrap(), 10);
        for bad in [None, Some(""), Some("-1"), Some("1.5"), Some("ten"), Some(" 3")] {
            assert_eq!(
                parse_count(bad, 10).unwrap_err().to_string(),
                "parameter must be an integer"
            );
        }
        assert_eq!(
            parse_count(Some("11"), 10).unwrap_err().to_string(),
            "parameter limit 10"
        );
        assert_eq!(
            parse_count(Some("99999999999999999999999"), 10)
                .unwrap_err()
                .to_string(),
            "parameter limit 10"
        );
    }

    #[test]
    fn birth_years_take_precedence() {
        let params = PersonParams {
            min_age: Some("20".into()),
            min_birth_year: Some("1950".into()),
            ..PersonParams::default()
        };
        assert_eq!(
            params.window().unwrap(),
            WindowRequest::BirthYears {
                min: Some(1950),
                max: None
            }
        );
    }

    #[test]
    fn ages_and_default() {
        let params = PersonParams {
            max_age: Some("40".into()),
            ..PersonParams::default()
        };
        assert_eq!(
            params.window().unwrap(),
            WindowRequest::Ages {
                min: None,
                max: Some(40)
            }
        );
        assert_eq!(
            PersonParams::default().window().unwrap(),
            WindowRequest::Default
        );
    }

    #[test]
    fn ages_outside_representable_range_are_rejected() {
        for (min, max) in [(Some("-1"), None), (None, Some("200")), (None, Some("-2147483648"))] {
            let params = PersonParams {
                min_age: min.map(Into::into),
                max_age: max.map(Into::into),
                ..PersonParams::default()
            };
            assert!(params.window().is_err(), "{min:?} {max:?}");
        }
        let params = PersonParams {
            min_age: Some("0".into()),
            max_age: Some("199".into()),
            ..PersonParams::default()
        };
        assert_eq!(
            params.window().unwrap(),
            WindowRequest::Ages {
                min: Some(0),
                max: Some(199)
            }
        );
    }

    #[test]
    fn integers_share_one_parsing_policy() {
        assert_eq!(optional_int("x", Some("1970")).unwrap(), Some(1970));
        assert_eq!(optional_int("x", Some("-5")).unwrap(), Some(-5));
        assert_eq!(optional_int("x", None).unwrap(), None);
        for bad in [" 1970", "1970 ", "+5", "", "-", "19.5", "99999999999"] {
            assert_eq!(
                optional_int("x", Some(bad)).unwrap_err().to_string(),
                "parameter x must be an integer"
            );
        }
    }

    #[test]
    fn non_numeric_age_is_rejected() {
        let params = PersonParams {
            min_age: Some("old".into()),
            ..PersonParams::default()
        };
        assert_eq!(
            params.window().unwrap_err().to_string(),
            "parameter minAge must be an integer"
        );
    }
}
