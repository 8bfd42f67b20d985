//! Snapshot types for the sheet viewer API.
//!
//! These types match the JSON served by `/api/data` and `/api/stats`.
//! Object keys keep the order the server sent them in (serde_json is built
//! with `preserve_order`), which is what the table uses for its columns.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One table row: column name to scalar value, in server order.
pub type Row = Map<String, Value>;

/// Deterministic serialization of a snapshot, used to detect no-op fetches.
///
/// Two snapshots with the same key render identically. The key is
/// order-sensitive: reordered rows or reordered columns produce a new key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComparisonKey(String);

impl ComparisonKey {
    /// Serialize any value into a comparison key.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_string(value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Anything a poller can diff against the last rendered value.
pub trait Snapshot: Send + Sync + 'static {
    /// Compute the comparison key for this snapshot.
    fn comparison_key(&self) -> Result<ComparisonKey, serde_json::Error>;
}

/// Response of `GET /api/data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSnapshot {
    /// Rows in server order. Columns are uniform within one snapshot.
    pub rows: Vec<Row>,

    /// Unix timestamp (seconds, possibly fractional) of the last backend update.
    #[serde(default)]
    pub last_updated: Option<f64>,
}

impl DataSnapshot {
    /// Column names, taken from the first row.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Snapshot for DataSnapshot {
    // Only the rows take part; a new timestamp over the same rows is not a change.
    fn comparison_key(&self) -> Result<ComparisonKey, serde_json::Error> {
        ComparisonKey::of(&self.rows)
    }
}

/// The `stats` object of `GET /api/stats`, with the raw JSON it came from.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub stats: Stats,
    raw: Value,
}

impl StatsSnapshot {
    /// Build from the `stats` value of the response envelope.
    pub fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        let stats = Stats::deserialize(&raw)?;
        Ok(Self { stats, raw })
    }

    /// Extract and parse the `stats` field of a full `/api/stats` response.
    pub fn from_envelope(mut envelope: Value) -> Result<Self, serde_json::Error> {
        match envelope.get_mut("stats").map(Value::take) {
            Some(stats @ Value::Object(_)) => Self::from_value(stats),
            _ => Err(serde_json::Error::custom("response has no stats object")),
        }
    }
}

impl Snapshot for StatsSnapshot {
    fn comparison_key(&self) -> Result<ComparisonKey, serde_json::Error> {
        ComparisonKey::of(&self.raw)
    }
}

/// Summary statistics computed by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Stats {
    #[serde(default, deserialize_with = "optional_count")]
    pub total_rows: Option<u64>,

    /// Per numeric column statistics, in server order.
    #[serde(default, deserialize_with = "ordered_entries")]
    pub numeric_stats: Vec<(String, NumericStat)>,

    /// Missing value count per column, in server order.
    #[serde(default, deserialize_with = "ordered_counts")]
    pub missing_per_column: Vec<(String, u64)>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub categorical_summary: Vec<CategoricalSummary>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub timeseries_monthly: Vec<MonthlyCount>,
}

/// Statistics for one numeric column.
///
/// Columns the backend classifies as identifiers carry `unique` and
/// `examples` instead of meaningful `mean`/`sum`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NumericStat {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub sum: Option<f64>,
    #[serde(default, deserialize_with = "optional_count")]
    pub missing: Option<u64>,
    #[serde(default, deserialize_with = "optional_count")]
    pub unique: Option<u64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub examples: Vec<Value>,
}

impl NumericStat {
    pub fn is_identifier(&self) -> bool {
        self.kind.as_deref() == Some("identifier")
    }
}

/// Most frequent values of one categorical column.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoricalSummary {
    pub column: String,
    #[serde(default, deserialize_with = "optional_count")]
    pub unique: Option<u64>,
    /// Value to occurrence count, in server order.
    #[serde(default, deserialize_with = "ordered_counts")]
    pub top: Vec<(String, u64)>,
}

/// Row count for one month of the time series.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonthlyCount {
    pub period: String,
    #[serde(deserialize_with = "count")]
    pub count: u64,
}

/// Deserialize a JSON object into `(key, value)` pairs, keeping key order.
fn ordered_entries<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(map) = Option::<Map<String, Value>>::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    map.into_iter()
        .map(|(key, value)| {
            serde_json::from_value(value)
                .map(|parsed| (key, parsed))
                .map_err(D::Error::custom)
        })
        .collect()
}

/// A count sent either as an integer or as an integral float (`3.0`).
struct Count(u64);

impl<'de> Deserialize<'de> for Count {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if let Some(n) = value.as_u64() {
            return Ok(Count(n));
        }
        match value.as_f64() {
            Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(Count(f as u64)),
            _ => Err(D::Error::custom(format!("invalid count: {}", value))),
        }
    }
}

fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Count::deserialize(deserializer).map(|c| c.0)
}

fn optional_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(Option::<Count>::deserialize(deserializer)?.map(|c| c.0))
}

fn ordered_counts<'de, D>(deserializer: D) -> Result<Vec<(String, u64)>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Vec<(String, Count)> = ordered_entries(deserializer)?;
    Ok(entries.into_iter().map(|(key, c)| (key, c.0)).collect())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_data_snapshot() {
        let json = r#"{
            "rows": [
                {"id": 1, "name": "A", "plano": null},
                {"id": 2, "name": "B", "plano": "mensal"}
            ],
            "last_updated": 1700000000.5
        }"#;

        let snapshot: DataSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.columns(), vec!["id", "name", "plano"]);
        assert_eq!(snapshot.last_updated, Some(1700000000.5));
    }

    #[test]
    fn test_last_updated_absent_or_null() {
        let absent: DataSnapshot = serde_json::from_str(r#"{"rows": []}"#).unwrap();
        assert!(absent.last_updated.is_none());

        let null: DataSnapshot =
            serde_json::from_str(r#"{"rows": [], "last_updated": null}"#).unwrap();
        assert!(null.last_updated.is_none());
    }

    #[test]
    fn test_missing_rows_is_an_error() {
        assert!(serde_json::from_str::<DataSnapshot>(r#"{"last_updated": 1}"#).is_err());
        assert!(serde_json::from_str::<DataSnapshot>(r#"{"rows": null}"#).is_err());
    }

    #[test]
    fn test_columns_keep_server_order() {
        let snapshot: DataSnapshot =
            serde_json::from_str(r#"{"rows": [{"zeta": 1, "alpha": 2, "mid": 3}]}"#).unwrap();
        assert_eq!(snapshot.columns(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_comparison_key_ignores_timestamp() {
        let a: DataSnapshot =
            serde_json::from_value(json!({"rows": [{"id": 1}], "last_updated": 1})).unwrap();
        let b: DataSnapshot =
            serde_json::from_value(json!({"rows": [{"id": 1}], "last_updated": 2})).unwrap();
        assert_eq!(a.comparison_key().unwrap(), b.comparison_key().unwrap());
    }

    #[test]
    fn test_comparison_key_is_order_sensitive() {
        let a: DataSnapshot =
            serde_json::from_value(json!({"rows": [{"id": 1}, {"id": 2}]})).unwrap();
        let b: DataSnapshot =
            serde_json::from_value(json!({"rows": [{"id": 2}, {"id": 1}]})).unwrap();
        assert_ne!(a.comparison_key().unwrap(), b.comparison_key().unwrap());

        let c: DataSnapshot =
            serde_json::from_value(json!({"rows": [{"id": 1, "name": "A"}]})).unwrap();
        let d: DataSnapshot =
            serde_json::from_value(json!({"rows": [{"name": "A", "id": 1}]})).unwrap();
        assert_ne!(c.comparison_key().unwrap(), d.comparison_key().unwrap());
    }

    #[test]
    fn test_deserialize_stats_envelope() {
        let envelope = json!({
            "stats": {
                "total_rows": 42,
                "numeric_stats": {
                    "idade": {"type": "numeric", "mean": 31.5, "sum": 1323.0, "missing": 2},
                    "matricula": {"type": "identifier", "unique": 40, "examples": [101, 102]}
                },
                "missing_per_column": {"idade": 2, "email": 5},
                "categorical_summary": [
                    {"column": "plano", "unique": 3, "top": {"mensal": 20, "anual": 12}}
                ],
                "timeseries_monthly": [
                    {"period": "2024-01", "count": 10},
                    {"period": "2024-02", "count": 14}
                ]
            }
        });

        let snapshot = StatsSnapshot::from_envelope(envelope).unwrap();
        let stats = &snapshot.stats;
        assert_eq!(stats.total_rows, Some(42));
        assert_eq!(stats.numeric_stats[0].0, "idade");
        assert_eq!(stats.numeric_stats[1].0, "matricula");
        assert!(stats.numeric_stats[1].1.is_identifier());
        assert_eq!(stats.missing_per_column, vec![("idade".to_string(), 2), ("email".to_string(), 5)]);
        assert_eq!(stats.categorical_summary[0].top[0], ("mensal".to_string(), 20));
        assert_eq!(stats.timeseries_monthly.len(), 2);
    }

    #[test]
    fn test_stats_envelope_without_stats() {
        assert!(StatsSnapshot::from_envelope(json!({})).is_err());
        assert!(StatsSnapshot::from_envelope(json!({"stats": null})).is_err());
    }

    #[test]
    fn test_stats_accept_float_counts() {
        let snapshot = StatsSnapshot::from_value(json!({
            "total_rows": 3.0,
            "numeric_stats": {"idade": {"type": "numeric", "mean": 30.0, "missing": 1.0, "unique": 2.0}},
            "missing_per_column": {"a": 1.0, "b": 0},
            "categorical_summary": [{"column": "plano", "unique": 2.0, "top": {"mensal": 2.0}}],
            "timeseries_monthly": [{"period": "2024-01", "count": 3.0}]
        }))
        .unwrap();

        let stats = &snapshot.stats;
        assert_eq!(stats.total_rows, Some(3));
        assert_eq!(stats.numeric_stats[0].1.missing, Some(1));
        assert_eq!(stats.numeric_stats[0].1.unique, Some(2));
        assert_eq!(stats.missing_per_column, vec![("a".to_string(), 1), ("b".to_string(), 0)]);
        assert_eq!(stats.categorical_summary[0].unique, Some(2));
        assert_eq!(stats.categorical_summary[0].top, vec![("mensal".to_string(), 2)]);
        assert_eq!(stats.timeseries_monthly[0].count, 3);
    }

    #[test]
    fn test_stats_reject_fractional_or_negative_counts() {
        assert!(StatsSnapshot::from_value(json!({"total_rows": 2.5})).is_err());
        assert!(StatsSnapshot::from_value(json!({"missing_per_column": {"a": -1}})).is_err());
        assert!(StatsSnapshot::from_value(json!({"total_rows": "3"})).is_err());
    }

    #[test]
    fn test_stats_comparison_key_covers_whole_object() {
        let a = StatsSnapshot::from_value(json!({"total_rows": 3, "extra": {"x": 1}})).unwrap();
        let b = StatsSnapshot::from_value(json!({"total_rows": 3, "extra": {"x": 1}})).unwrap();
        let c = StatsSnapshot::from_value(json!({"total_rows": 3, "extra": {"x": 2}})).unwrap();

        assert_eq!(a.comparison_key().unwrap(), b.comparison_key().unwrap());
        // Fields the dashboard does not read still count as a change.
        assert_ne!(a.comparison_key().unwrap(), c.comparison_key().unwrap());
    }

    #[test]
    fn test_stats_null_collections_default() {
        let snapshot = StatsSnapshot::from_value(json!({
            "total_rows": null,
            "numeric_stats": null,
            "categorical_summary": null
        }))
        .unwrap();
        assert!(snapshot.stats.total_rows.is_none());
        assert!(snapshot.stats.numeric_stats.is_empty());
        assert!(snapshot.stats.categorical_summary.is_empty());
    }
}
