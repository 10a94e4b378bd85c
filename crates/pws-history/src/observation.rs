use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// One row of `weather_data` ready to be inserted.
///
/// `station_id` and `date` are the values the observation was requested
/// under, not anything read from the observation itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewObservation {
    pub station_id: String,
    pub date: String,
    pub temp: Option<f64>,
    pub dewpt: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_dir: Option<f64>,
    pub precip_rate: Option<f64>,
    pub precip_total: Option<f64>,
    pub solar_radiation: Option<f64>,
    pub uv: Option<f64>,
    pub obs_time_utc: Option<String>,
    pub obs_time_local: Option<String>,
}

impl NewObservation {
    /// Maps a raw upstream observation onto the fixed column set.
    ///
    /// Metric-unit readings live under the nested `metric` object, the rest
    /// sit on the observation itself. Anything missing, `null` or of the
    /// wrong JSON type becomes `None`.
    pub fn from_upstream(station_id: &str, date: &str, raw: &Value) -> Self {
        let empty = Map::new();
        let metric = raw
            .get("metric")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        NewObservation {
            station_id: station_id.to_owned(),
            date: date.to_owned(),
            temp: number(metric, "temp"),
            dewpt: number(metric, "dewpt"),
            humidity: field_number(raw, "humidity"),
            pressure: number(metric, "pressure"),
            wind_speed: number(metric, "windSpeed"),
            wind_gust: number(metric, "windGust"),
            wind_dir: field_number(raw, "winddir"),
            precip_rate: number(metric, "precipRate"),
            precip_total: number(metric, "precipTotal"),
            solar_radiation: field_number(raw, "solarRadiation"),
            uv: field_number(raw, "uv"),
            obs_time_utc: field_string(raw, "obsTimeUtc"),
            obs_time_local: field_string(raw, "obsTimeLocal"),
        }
    }
}

fn number(object: &Map<String, Value>, key: &str) -> Option<f64> {
    object.get(key).and_then(Value::as_f64)
}

fn field_number(raw: &Value, key: &str) -> Option<f64> {
    raw.get(key).and_then(Value::as_f64)
}

fn field_string(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// The `observations` list of an upstream payload.
///
/// A payload without that field, or where it isn't an array, has no
/// observations.
pub fn observations_of(payload: &Value) -> &[Value] {
    payload
        .get("observations")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// A row read back from `weather_data`, every column as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct StoredObservation {
    pub id: i64,
    pub station_id: Option<String>,
    pub date: Option<String>,
    pub temp: Option<f64>,
    pub dewpt: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_dir: Option<f64>,
    pub precip_rate: Option<f64>,
    pub precip_total: Option<f64>,
    pub solar_radiation: Option<f64>,
    pub uv: Option<f64>,
    pub obs_time_utc: Option<String>,
    pub obs_time_local: Option<String>,
    pub created_at: Option<String>,
}
