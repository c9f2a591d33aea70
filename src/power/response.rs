use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::POWER_FILL_VALUE;

/// One day of point weather values, aligned with `PowerSeries::parameters`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerRow {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

/// Daily values for a set of parameters at one point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSeries {
    pub parameters: Vec<String>,
    pub rows: Vec<PowerRow>,
}

impl PowerSeries {
    /// Build a series from the API's JSON body.
    ///
    /// Values live under `properties.parameter.<PARAM>.<YYYYMMDD>`. The date
    /// axis is taken from the first requested parameter, which must be
    /// present. Any other parameter or date absent from the response, or
    /// carrying the API fill value, is `None`.
    pub fn from_json(body: &Value, parameters: &[String]) -> Result<Self> {
        let table = body
            .pointer("/properties/parameter")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                ProcessingError::InvalidFormat(
                    "POWER response has no properties.parameter object".to_string(),
                )
            })?;

        let first = parameters.first().ok_or_else(|| {
            ProcessingError::Config("At least one POWER parameter is required".to_string())
        })?;

        let mut dates: Vec<(NaiveDate, &str)> = match table.get(first) {
            Some(Value::Object(by_date)) => by_date
                .keys()
                .map(|key| -> Result<(NaiveDate, &str)> {
                    Ok((NaiveDate::parse_from_str(key, "%Y%m%d")?, key.as_str()))
                })
                .collect::<Result<_>>()?,
            Some(_) => {
                return Err(ProcessingError::InvalidFormat(format!(
                    "POWER parameter {} is not an object of dated values",
                    first
                )))
            }
            None => {
                return Err(ProcessingError::InvalidFormat(format!(
                    "POWER response has no values for parameter {}",
                    first
                )))
            }
        };
        dates.sort_by_key(|(date, _)| *date);

        let rows = dates
            .into_iter()
            .map(|(date, key)| PowerRow {
                date,
                values: parameters
                    .iter()
                    .map(|p| {
                        table
                            .get(p)
                            .and_then(|by_date| by_date.get(key))
                            .and_then(Value::as_f64)
                            .filter(|v| *v != POWER_FILL_VALUE)
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            parameters: parameters.to_vec(),
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First and last date covered
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.rows.first()?.date, self.rows.last()?.date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_sorts_dates_and_aligns_parameters() {
        let body = json!({
            "properties": {
                "parameter": {
                    "T2M": { "20100103": 31.5, "20100101": 29.25, "20100102": -999.0 },
                    "PRECTOTCORR": { "20100101": 0.0, "20100103": 1.75 }
                }
            }
        });

        let series = PowerSeries::from_json(&body, &params(&["T2M", "PRECTOTCORR"])).unwrap();
        assert_eq!(series.len(), 3);

        let dates: Vec<String> = series.rows.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2010-01-01", "2010-01-02", "2010-01-03"]);

        assert_eq!(series.rows[0].values, vec![Some(29.25), Some(0.0)]);
        assert_eq!(series.rows[1].values, vec![None, None]);
        assert_eq!(series.rows[2].values, vec![Some(31.5), Some(1.75)]);
    }

    #[test]
    fn test_unknown_parameter_is_empty_column() {
        let body = json!({
            "properties": { "parameter": { "T2M": { "20231231": 25.0 } } }
        });
        let series = PowerSeries::from_json(&body, &params(&["T2M", "RH2M"])).unwrap();
        assert_eq!(series.rows[0].values, vec![Some(25.0), None]);
        let day = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(series.date_range(), Some((day, day)));
    }

    #[test]
    fn test_missing_parameter_table_is_error() {
        let body = json!({ "messages": ["bad request"] });
        let result = PowerSeries::from_json(&body, &params(&["T2M"]));
        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
    }

    #[test]
    fn test_bad_date_key_is_error() {
        let body = json!({
            "properties": { "parameter": { "T2M": { "2010-01-01": 1.0 } } }
        });
        let result = PowerSeries::from_json(&body, &params(&["T2M"]));
        assert!(matches!(result, Err(ProcessingError::DateParse(_))));
    }

    #[test]
    fn test_first_parameter_absent_is_error() {
        let body = json!({
            "properties": { "parameter": { "PRECTOTCORR": { "20100101": 0.5 } } }
        });
        let result = PowerSeries::from_json(&body, &params(&["T2M", "PRECTOTCORR"]));
        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
    }
}
