//! ==============================================================================
//! domain.rs - readings, derived views and status classification
//! ==============================================================================
//!
//! purpose:
//!     the value types that flow through the hub. everything here is pure:
//!     no locks, no clocks, "now" is always passed in.
//!
//! relationships:
//!     - used by: store.rs (builds Reading on ingest, views on read)
//!     - used by: server.rs (serializes views as json)
//!
//! wire format:
//!     field names are snake_case and match what the dashboard frontend
//!     polls for: `timestamp`, `foot_press_detected`,
//!     `seconds_since_last_reading`, `is_recent`, `pressure_percentage`.
//!
//! ==============================================================================

use crate::error::IngestError;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

// ==============================================================================
// constants
// ==============================================================================

/// pressure above this counts as a foot press (same boundary as the device firmware)
pub const PRESSURE_THRESHOLD: f64 = 500.0;

/// full-scale raw value of the sensor adc, used for percentage normalization
pub const MAX_PRESSURE: f64 = 4095.0;

/// readings younger than this are `active`
pub const ACTIVE_WINDOW_SECS: f64 = 5.0;

/// readings at least this old are `disconnected`
pub const DISCONNECT_WINDOW_SECS: f64 = 30.0;

// ==============================================================================
// reading
// ==============================================================================

/// the single most recent accepted sensor value
///
/// fields are private so `threshold_exceeded` can only ever be derived from
/// `pressure` at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    #[serde(serialize_with = "serialize_pressure")]
    pressure: f64,
    #[serde(rename = "timestamp")]
    captured_at: DateTime<Utc>,
    #[serde(rename = "foot_press_detected")]
    threshold_exceeded: bool,
}

impl Reading {
    pub fn new(pressure: f64, captured_at: DateTime<Utc>) -> Self {
        Self {
            pressure,
            captured_at,
            threshold_exceeded: pressure > PRESSURE_THRESHOLD,
        }
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    /// when the store accepted this reading (not device time)
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn threshold_exceeded(&self) -> bool {
        self.threshold_exceeded
    }

    /// seconds elapsed since capture, clamped to zero if `now` is earlier
    pub fn age_seconds(&self, now: DateTime<Utc>) -> f64 {
        (now - self.captured_at)
            .to_std()
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or(0.0)
    }

    /// pressure as a share of full scale, capped at 100
    pub fn pressure_percentage(&self) -> f64 {
        (self.pressure / MAX_PRESSURE * 100.0).min(100.0)
    }
}

/// extract and validate the `pressure` field of an ingest payload
///
/// checks run in order and stop at the first failure:
/// object with a `pressure` key, then numeric, then non-negative.
pub fn parse_pressure(payload: Option<&Value>) -> Result<f64, IngestError> {
    let fields = payload
        .and_then(Value::as_object)
        .ok_or(IngestError::MalformedRequest)?;
    let raw = fields.get("pressure").ok_or(IngestError::MalformedRequest)?;

    // as_f64 is None for bools, strings, null, arrays and objects
    let value = raw.as_f64().ok_or(IngestError::InvalidType)?;
    if value < 0.0 {
        return Err(IngestError::OutOfRange { value });
    }

    // folds -0.0 into 0.0
    Ok(value + 0.0)
}

// ==============================================================================
// snapshot view
// ==============================================================================

/// the latest reading plus freshness fields derived at read time
///
/// when nothing has been ingested yet `reading` and `age_seconds` are `None`,
/// `is_recent` is false and `pressure_percentage` is 0. on the wire the
/// reading fields still appear, as `pressure: 0`, `timestamp: null` and
/// `foot_press_detected: false`, so clients never see a missing key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingView {
    pub reading: Option<Reading>,
    pub age_seconds: Option<f64>,
    pub is_recent: bool,
    pub pressure_percentage: f64,
}

impl ReadingView {
    pub fn at(reading: Option<Reading>, now: DateTime<Utc>) -> Self {
        match reading {
            Some(reading) => {
                let age = reading.age_seconds(now);
                Self {
                    reading: Some(reading),
                    age_seconds: Some(age),
                    is_recent: age < ACTIVE_WINDOW_SECS,
                    pressure_percentage: reading.pressure_percentage(),
                }
            }
            None => Self {
                reading: None,
                age_seconds: None,
                is_recent: false,
                pressure_percentage: 0.0,
            },
        }
    }
}

#[derive(Serialize)]
struct ReadingViewWire {
    #[serde(serialize_with = "serialize_pressure")]
    pressure: f64,
    timestamp: Option<DateTime<Utc>>,
    foot_press_detected: bool,
    seconds_since_last_reading: Option<f64>,
    is_recent: bool,
    pressure_percentage: f64,
}

impl Serialize for ReadingView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ReadingViewWire {
            pressure: self.reading.map_or(0.0, |r| r.pressure),
            timestamp: self.reading.map(|r| r.captured_at),
            foot_press_detected: self.reading.is_some_and(|r| r.threshold_exceeded),
            seconds_since_last_reading: self.age_seconds.map(round_hundredths),
            is_recent: self.is_recent,
            pressure_percentage: self.pressure_percentage,
        }
        .serialize(serializer)
    }
}

// ==============================================================================
// status
// ==============================================================================

/// coarse health of the sensor link, recomputed on every read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorStatus {
    NoData,
    Active,
    Inactive,
    Disconnected,
}

impl SensorStatus {
    /// classify by age of the latest reading; lower bounds are inclusive
    pub fn classify(age_seconds: Option<f64>) -> Self {
        match age_seconds {
            None => Self::NoData,
            Some(age) if age < ACTIVE_WINDOW_SECS => Self::Active,
            Some(age) if age < DISCONNECT_WINDOW_SECS => Self::Inactive,
            Some(_) => Self::Disconnected,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::NoData => "No sensor data received yet",
            Self::Active => "Sensor is actively sending data",
            Self::Inactive => "Sensor data is stale",
            Self::Disconnected => "Sensor appears to be disconnected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusView {
    pub status: SensorStatus,
    pub last_reading: Option<DateTime<Utc>>,
    pub age_seconds: Option<f64>,
}

impl StatusView {
    pub fn at(reading: Option<Reading>, now: DateTime<Utc>) -> Self {
        let age_seconds = reading.map(|r| r.age_seconds(now));
        Self {
            status: SensorStatus::classify(age_seconds),
            last_reading: reading.map(|r| r.captured_at),
            age_seconds,
        }
    }

    pub fn message(&self) -> &'static str {
        self.status.message()
    }
}

#[derive(Serialize)]
struct StatusViewWire {
    status: SensorStatus,
    message: &'static str,
    last_reading: Option<DateTime<Utc>>,
    seconds_since_last_reading: Option<f64>,
}

impl Serialize for StatusView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StatusViewWire {
            status: self.status,
            message: self.message(),
            last_reading: self.last_reading,
            seconds_since_last_reading: self.age_seconds.map(round_hundredths),
        }
        .serialize(serializer)
    }
}

/// whole-number pressures go out as json integers, so `{"pressure": 600}`
/// echoes back as `600` rather than `600.0`
fn serialize_pressure<S: Serializer>(pressure: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    // 2^53: above this f64 no longer holds every integer
    const EXACT_INT_LIMIT: f64 = 9_007_199_254_740_992.0;
    if pressure.fract() == 0.0 && *pressure < EXACT_INT_LIMIT {
        serializer.serialize_u64(*pressure as u64)
    } else {
        serializer.serialize_f64(*pressure)
    }
}

fn round_hundredths(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn threshold_is_strictly_greater_than() {
        assert!(!Reading::new(500.0, t0()).threshold_exceeded());
        assert!(Reading::new(500.5, t0()).threshold_exceeded());
        assert!(!Reading::new(0.0, t0()).threshold_exceeded());
    }

    #[test]
    fn percentage_scales_and_caps() {
        let p = Reading::new(600.0, t0()).pressure_percentage();
        assert!((p - 14.652).abs() < 0.001, "{p}");
        assert_eq!(Reading::new(4095.0, t0()).pressure_percentage(), 100.0);
        assert_eq!(Reading::new(9000.0, t0()).pressure_percentage(), 100.0);
        assert_eq!(Reading::new(0.0, t0()).pressure_percentage(), 0.0);
    }

    #[test]
    fn age_is_clamped_when_clock_runs_backwards() {
        let reading = Reading::new(1.0, t0());
        assert_eq!(reading.age_seconds(t0() - Duration::seconds(3)), 0.0);
        assert_eq!(reading.age_seconds(t0() + Duration::milliseconds(2500)), 2.5);
    }

    #[test]
    fn parse_rejects_in_order() {
        assert_eq!(parse_pressure(None), Err(IngestError::MalformedRequest));
        assert_eq!(
            parse_pressure(Some(&json!([1, 2]))),
            Err(IngestError::MalformedRequest)
        );
        assert_eq!(
            parse_pressure(Some(&json!({"value": 3}))),
            Err(IngestError::MalformedRequest)
        );
        assert_eq!(
            parse_pressure(Some(&json!({"pressure": "12"}))),
            Err(IngestError::InvalidType)
        );
        assert_eq!(
            parse_pressure(Some(&json!({"pressure": true}))),
            Err(IngestError::InvalidType)
        );
        assert_eq!(
            parse_pressure(Some(&json!({"pressure": null}))),
            Err(IngestError::InvalidType)
        );
        assert_eq!(
            parse_pressure(Some(&json!({"pressure": -1}))),
            Err(IngestError::OutOfRange { value: -1.0 })
        );
    }

    #[test]
    fn parse_accepts_integers_and_floats() {
        assert_eq!(parse_pressure(Some(&json!({"pressure": 0}))), Ok(0.0));
        assert_eq!(parse_pressure(Some(&json!({"pressure": 1234}))), Ok(1234.0));
        assert_eq!(parse_pressure(Some(&json!({"pressure": 12.75}))), Ok(12.75));
        assert_eq!(
            parse_pressure(Some(&json!({"pressure": 7, "extra": "ignored"}))),
            Ok(7.0)
        );
    }

    #[test]
    fn whole_pressures_echo_as_integers() {
        let whole = serde_json::to_string(&Reading::new(600.0, t0())).unwrap();
        assert_eq!(
            whole,
            r#"{"pressure":600,"timestamp":"2024-03-01T08:00:00Z","foot_press_detected":true}"#
        );

        let fractional = serde_json::to_value(Reading::new(12.5, t0())).unwrap();
        assert_eq!(fractional["pressure"], json!(12.5));

        let view = serde_json::to_value(ReadingView::at(Some(Reading::new(4095.0, t0())), t0()))
            .unwrap();
        assert_eq!(view["pressure"], json!(4095));
    }

    #[test]
    fn status_boundaries() {
        assert_eq!(SensorStatus::classify(None), SensorStatus::NoData);
        assert_eq!(SensorStatus::classify(Some(0.0)), SensorStatus::Active);
        assert_eq!(SensorStatus::classify(Some(4.999)), SensorStatus::Active);
        assert_eq!(SensorStatus::classify(Some(5.0)), SensorStatus::Inactive);
        assert_eq!(SensorStatus::classify(Some(29.999)), SensorStatus::Inactive);
        assert_eq!(SensorStatus::classify(Some(30.0)), SensorStatus::Disconnected);
        assert_eq!(SensorStatus::classify(Some(3600.0)), SensorStatus::Disconnected);
    }

    #[test]
    fn empty_view_serializes_without_missing_keys() {
        let view = serde_json::to_value(ReadingView::at(None, t0())).unwrap();
        assert_eq!(
            view,
            json!({
                "pressure": 0,
                "timestamp": null,
                "foot_press_detected": false,
                "seconds_since_last_reading": null,
                "is_recent": false,
                "pressure_percentage": 0.0,
            })
        );
    }

    #[test]
    fn view_rounds_age_on_the_wire_only() {
        let reading = Reading::new(600.0, t0());
        let view = ReadingView::at(Some(reading), t0() + Duration::milliseconds(1234));
        let age = view.age_seconds.unwrap();
        assert!((age - 1.234).abs() < 1e-9, "{age}");

        let wire = serde_json::to_value(view).unwrap();
        assert_eq!(wire["seconds_since_last_reading"], json!(1.23));
        assert_eq!(wire["foot_press_detected"], json!(true));
        assert_eq!(wire["is_recent"], json!(true));
        assert_eq!(wire["timestamp"], json!("2024-03-01T08:00:00Z"));
    }

    #[test]
    fn status_view_wire_shape() {
        let reading = Reading::new(10.0, t0());
        let wire = serde_json::to_value(StatusView::at(Some(reading), t0() + Duration::seconds(10)))
            .unwrap();
        assert_eq!(
            wire,
            json!({
                "status": "inactive",
                "message": "Sensor data is stale",
                "last_reading": "2024-03-01T08:00:00Z",
                "seconds_since_last_reading": 10.0,
            })
        );

        let empty = serde_json::to_value(StatusView::at(None, t0())).unwrap();
        assert_eq!(empty["status"], json!("no_data"));
        assert_eq!(empty["last_reading"], json!(null));
        assert_eq!(empty["seconds_since_last_reading"], json!(null));
    }
}
