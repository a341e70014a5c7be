use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Multipart, Path, Request},
    http::request::Parts,
    Json,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{de::DeserializeOwned, de::Error as _, Deserialize, Deserializer};
use validator::Validate;

use crate::error::ApiError;

/// JSON body that has passed `validator` checks. Both parse and validation failures
/// are rejected as [`ApiError::Validation`].
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Path parameters whose parse failures are rejected as [`ApiError::Validation`].
#[derive(Debug, Clone)]
pub struct ValidPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// `multipart/form-data` body. A wrong content type or boundary is rejected as
/// [`ApiError::Validation`].
pub struct FormData(pub Multipart);

#[async_trait]
impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Multipart::from_request(req, state).await?))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

/// Accepts `600`, `"600"`, `""` or `null` for an optional integer.
pub fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => i32::try_from(n).map(Some).map_err(D::Error::custom),
        Some(NumberOrString::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<i32>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected an integer, got \"{}\"", text)))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrText {
    Bool(bool),
    Number(i64),
    Text(String),
}

/// Accepts `true`, `1`, `"true"`, `"yes"`, `"on"` (and their negatives) for a flag.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match BoolOrText::deserialize(deserializer)? {
        BoolOrText::Bool(flag) => Ok(flag),
        BoolOrText::Number(1) => Ok(true),
        BoolOrText::Number(0) => Ok(false),
        BoolOrText::Number(n) => Err(D::Error::custom(format!("expected a boolean, got {}", n))),
        BoolOrText::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
            "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
            _ => Err(D::Error::custom(format!("expected a boolean, got \"{}\"", text))),
        },
    }
}

/// Accepts an RFC 3339 timestamp, or an ISO 8601 one without an offset, read as UTC.
pub fn utc_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| D::Error::custom(format!("expected an ISO 8601 timestamp, got \"{}\"", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Break {
        #[serde(default, deserialize_with = "lenient_i32")]
        seconds: Option<i32>,
    }

    #[test]
    fn test_lenient_i32_accepts_numbers_and_strings() {
        let parse = |json: &str| serde_json::from_str::<Break>(json).map(|b| b.seconds);

        assert_eq!(parse(r#"{"seconds": 600}"#).unwrap(), Some(600));
        assert_eq!(parse(r#"{"seconds": "300"}"#).unwrap(), Some(300));
        assert_eq!(parse(r#"{"seconds": ""}"#).unwrap(), None);
        assert_eq!(parse(r#"{"seconds": null}"#).unwrap(), None);
        assert_eq!(parse("{}").unwrap(), None);
        assert!(parse(r#"{"seconds": "ten"}"#).is_err());
        assert!(parse(r#"{"seconds": 99999999999}"#).is_err());
    }

    #[derive(Debug, Deserialize)]
    struct Schedule {
        #[serde(default, deserialize_with = "lenient_bool")]
        repeat: bool,
        #[serde(deserialize_with = "utc_datetime")]
        at: DateTime<Utc>,
    }

    #[test]
    fn test_lenient_bool_and_naive_timestamps() {
        let parse = |json: &str| serde_json::from_str::<Schedule>(json);
        let expected = Utc.with_ymd_and_hms(2023, 8, 9, 11, 17, 0).unwrap();

        let schedule = parse(r#"{"repeat": "true", "at": "2023-08-09T11:17:00"}"#).unwrap();
        assert!(schedule.repeat);
        assert_eq!(schedule.at, expected);

        let schedule = parse(r#"{"repeat": "False", "at": "2023-08-09T13:17:00+02:00"}"#).unwrap();
        assert!(!schedule.repeat);
        assert_eq!(schedule.at, expected);

        let schedule = parse(r#"{"repeat": 1, "at": "2023-08-09 11:17:00.000"}"#).unwrap();
        assert!(schedule.repeat);
        assert_eq!(schedule.at, expected);

        assert!(!parse(r#"{"at": "2023-08-09T11:17:00Z"}"#).unwrap().repeat);
        assert!(parse(r#"{"repeat": "maybe", "at": "2023-08-09T11:17:00Z"}"#).is_err());
        assert!(parse(r#"{"repeat": true, "at": "next tuesday"}"#).is_err());
    }
}
