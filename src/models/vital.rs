use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

/// A single timestamped biometric reading, embedded in a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vital {
    pub time: DateTime<Utc>,
    pub heart_rate: f64,
    pub temperature: f64,
    pub oxygen_saturation: f64,
    pub blood_pressure: BloodPressure,
}

/// Merge new readings into an ascending history.
///
/// Existing readings are never removed. Readings with equal timestamps keep
/// their arrival order (stable sort).
pub fn merge_readings(history: &mut Vec<Vital>, incoming: impl IntoIterator<Item = Vital>) {
    history.extend(incoming);
    history.sort_by(|a, b| a.time.cmp(&b.time));
}

/// Readings whose time falls within `[start, end]` (inclusive).
pub fn readings_in_range(
    history: &[Vital],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<Vital> {
    history
        .iter()
        .filter(|v| v.time >= start && v.time <= end)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn reading_at(hour: u32, heart_rate: f64) -> Vital {
        Vital {
            time: Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap(),
            heart_rate,
            temperature: 36.6,
            oxygen_saturation: 98.0,
            blood_pressure: BloodPressure {
                systolic: 118.0,
                diastolic: 76.0,
            },
        }
    }

    #[test]
    fn serializes_camel_case_document_shape() {
        let json = serde_json::to_value(reading_at(8, 72.0)).unwrap();
        assert_eq!(json["heartRate"], 72.0);
        assert_eq!(json["oxygenSaturation"], 98.0);
        assert_eq!(json["bloodPressure"]["systolic"], 118.0);
        assert!(json["time"].as_str().unwrap().starts_with("2026-03-01T08:00:00"));
    }

    #[test]
    fn merge_keeps_ascending_order() {
        let mut history = vec![reading_at(1, 60.0), reading_at(5, 62.0)];
        merge_readings(&mut history, vec![reading_at(3, 70.0), reading_at(9, 80.0)]);
        let hours: Vec<f64> = history.iter().map(|v| v.heart_rate).collect();
        assert_eq!(hours, vec![60.0, 70.0, 62.0, 80.0]);
        assert!(history.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn merge_never_drops_existing_readings() {
        let mut history = vec![reading_at(2, 61.0)];
        merge_readings(&mut history, vec![reading_at(2, 99.0)]);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].heart_rate, 61.0);
    }

    #[test]
    fn range_is_inclusive_on_both_ends() {
        let history: Vec<Vital> = (0..6).map(|h| reading_at(h, 60.0 + h as f64)).collect();
        let start = history[1].time;
        let end = start + Duration::hours(2);
        let window = readings_in_range(&history, start, end);
        assert_eq!(window.len(), 3);
        assert_eq!(window.first().unwrap().heart_rate, 61.0);
        assert_eq!(window.last().unwrap().heart_rate, 63.0);
    }

    #[test]
    fn range_outside_history_is_empty() {
        let history = vec![reading_at(4, 60.0)];
        let start = Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap();
        assert!(readings_in_range(&history, start, start + Duration::days(1)).is_empty());
    }
}
