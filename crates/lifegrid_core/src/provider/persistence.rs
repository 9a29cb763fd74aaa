//! Remote persistence contract and response validation.
//!
//! # Responsibility
//! - Define the per-user data operations the store calls.
//! - Turn the loosely-typed year-data response into `UserYearData`.
//!
//! # Invariants
//! - `UserYearData` only contains canonical date keys of the requested year.
//! - Falsy day entries are dropped during normalization.
//! - Undecodable date keys reject the whole response.

use crate::calendar::date_key::{decode_date_key, encode_date_key};
use crate::model::data_key::{DataKey, DataKeyId};
use crate::model::day_date::DayDate;
use crate::model::year_data::YearData;
use async_trait::async_trait;
use log::warn;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Persistence provider failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The provider call itself failed.
    Remote { code: String, message: String },
    /// The provider answered with data that fails boundary validation.
    MalformedResponse(String),
}

impl PersistenceError {
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote { code, message } => write!(f, "persistence failed [{code}]: {message}"),
            Self::MalformedResponse(details) => {
                write!(f, "malformed persistence response: {details}")
            }
        }
    }
}

impl Error for PersistenceError {}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Remote per-user data storage.
#[async_trait]
pub trait PersistenceProvider: Send + Sync {
    /// Creates a data key and returns its generated id.
    async fn create_data_key(&self, user_id: &str, label: &str) -> PersistenceResult<DataKeyId>;

    /// Upserts the boolean value of one day for one data key.
    async fn record_day_value(
        &self,
        user_id: &str,
        data_key_id: &str,
        day: DayDate,
        value: bool,
    ) -> PersistenceResult<()>;

    /// Fetches `{dataKeys, yearData}` for one user and year.
    async fn fetch_user_year_data(&self, user_id: &str, year: i32) -> PersistenceResult<Value>;

    /// Deletes a data key and all of its recorded days.
    async fn delete_data_key(&self, user_id: &str, data_key_id: &str) -> PersistenceResult<()>;

    /// Deletes the record of one day for one data key.
    async fn delete_day_value(
        &self,
        user_id: &str,
        data_key_id: &str,
        day: DayDate,
    ) -> PersistenceResult<()>;

    /// Moves every data key and recorded day owned by `from_user_id` to
    /// `to_user_id`. After success `from_user_id` owns nothing.
    async fn transfer_user_data(&self, from_user_id: &str, to_user_id: &str)
        -> PersistenceResult<()>;
}

/// Validated and normalized year-data response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserYearData {
    pub year: i32,
    pub data_keys: Vec<DataKey>,
    pub year_data: YearData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserYearDataWire {
    #[serde(default)]
    data_keys: Option<Vec<DataKey>>,
    #[serde(default, alias = "userYearData")]
    year_data: Option<BTreeMap<String, Option<BTreeMap<String, Value>>>>,
}

impl UserYearData {
    /// Validates a raw `fetch_user_year_data` response for `year`.
    ///
    /// # Errors
    /// - `PersistenceError::MalformedResponse` for shape errors, blank data
    ///   key ids, or undecodable date keys.
    pub fn from_response(year: i32, response: Value) -> PersistenceResult<Self> {
        let wire: UserYearDataWire = serde_json::from_value(response)
            .map_err(|err| PersistenceError::MalformedResponse(err.to_string()))?;

        let mut data_keys: Vec<DataKey> = Vec::new();
        for data_key in wire.data_keys.unwrap_or_default() {
            if data_key.id.trim().is_empty() {
                return Err(PersistenceError::MalformedResponse(
                    "data key with blank id".to_string(),
                ));
            }
            if !data_keys.iter().any(|existing| existing.id == data_key.id) {
                data_keys.push(data_key);
            }
        }

        let mut year_data = YearData::new();
        for (data_key_id, days) in wire.year_data.unwrap_or_default() {
            let bucket = normalize_days(year, &data_key_id, days.unwrap_or_default())?;
            year_data.insert(data_key_id, bucket);
        }

        Ok(Self {
            year,
            data_keys,
            year_data,
        })
    }
}

fn normalize_days(
    year: i32,
    data_key_id: &str,
    days: BTreeMap<String, Value>,
) -> PersistenceResult<BTreeSet<String>> {
    let mut bucket = BTreeSet::new();
    for (raw_key, flag) in days {
        if !is_truthy(&flag) {
            continue;
        }
        let day = decode_date_key(&raw_key).map_err(|err| {
            PersistenceError::MalformedResponse(format!("data key `{data_key_id}`: {err}"))
        })?;
        if day.year != year {
            warn!(
                "event=year_data_normalize module=provider status=skipped reason=year_mismatch requested_year={year} entry_year={}",
                day.year
            );
            continue;
        }
        let canonical = encode_date_key(day)
            .map_err(|err| PersistenceError::MalformedResponse(err.to_string()))?;
        bucket.insert(canonical);
    }
    Ok(bucket)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::{PersistenceError, UserYearData};
    use serde_json::json;

    #[test]
    fn normalizes_truthy_entries_into_sets() {
        let response = json!({
            "dataKeys": [{"id": "k1", "label": "Ran"}, {"id": "k1", "label": "dup"}],
            "yearData": {
                "k1": {"2024_00_05": true, "2024_00_06": 1, "2024_00_07": false, "2024_00_08": null},
                "k2": null
            }
        });

        let data = UserYearData::from_response(2024, response).expect("valid response");
        assert_eq!(data.data_keys.len(), 1);
        assert_eq!(data.data_keys[0].label, "Ran");

        let k1 = data.year_data.get("k1").expect("k1 bucket");
        assert_eq!(
            k1.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["2024_00_05", "2024_00_06"]
        );
        assert!(data.year_data.get("k2").expect("k2 bucket").is_empty());
    }

    #[test]
    fn missing_year_data_yields_empty_map() {
        let data = UserYearData::from_response(2024, json!({"dataKeys": [], "yearData": null}))
            .expect("valid response");
        assert!(data.data_keys.is_empty());
        assert!(data.year_data.is_empty());
    }

    #[test]
    fn accepts_legacy_user_year_data_field() {
        let data = UserYearData::from_response(
            2024,
            json!({"dataKeys": [], "userYearData": {"k1": {"2024_03_01": true}}}),
        )
        .expect("valid response");
        assert_eq!(data.year_data.get("k1").map(|days| days.len()), Some(1));
    }

    #[test]
    fn skips_entries_from_other_years() {
        let data = UserYearData::from_response(
            2024,
            json!({"yearData": {"k1": {"2023_11_31": true, "2024_00_01": true}}}),
        )
        .expect("valid response");
        assert_eq!(data.year_data.get("k1").map(|days| days.len()), Some(1));
    }

    #[test]
    fn rejects_malformed_shapes() {
        assert!(matches!(
            UserYearData::from_response(2024, json!({"dataKeys": "nope"})),
            Err(PersistenceError::MalformedResponse(_))
        ));
        assert!(matches!(
            UserYearData::from_response(2024, json!({"yearData": {"k1": {"not-a-date": true}}})),
            Err(PersistenceError::MalformedResponse(_))
        ));
        assert!(matches!(
            UserYearData::from_response(2024, json!({"dataKeys": [{"id": " ", "label": "x"}]})),
            Err(PersistenceError::MalformedResponse(_))
        ));
    }
}
