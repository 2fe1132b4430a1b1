use crate::data::country::Country;
use crate::data::persistence::Persistable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub owner_id: String,
    pub country: Country,
    #[serde(with = "iso_date")]
    pub start_date: NaiveDate,
    #[serde(with = "iso_date")]
    pub end_date: NaiveDate,
}

impl Trip {
    pub fn new(
        id: &str,
        owner_id: &str,
        country: Country,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Trip {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            country,
            start_date,
            end_date,
        }
    }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct TripData {
    pub trips: Vec<Trip>,
}

impl Persistable for TripData {
    fn filename() -> &'static str {
        "trips.json"
    }
    fn is_json() -> bool {
        true
    }
}

impl TripData {
    pub fn add(&mut self, trip: Trip) {
        self.trips.push(trip);
    }

    pub fn get(&self, id: &str) -> Option<&Trip> {
        self.trips.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Trip> {
        self.trips.iter_mut().find(|t| t.id == id)
    }

    /// Removes the trip and returns it, if present.
    pub fn remove(&mut self, id: &str) -> Option<Trip> {
        let idx = self.trips.iter().position(|t| t.id == id)?;
        Some(self.trips.remove(idx))
    }

    /// All trips of one owner, most recently started first.
    pub fn for_owner(&self, owner_id: &str) -> Vec<Trip> {
        let mut trips: Vec<Trip> = self
            .trips
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        trips.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        trips
    }
}

/// Dates cross the storage boundary as ISO-8601 date-times at UTC midnight.
/// Reading accepts any RFC 3339 timestamp or a bare date; only the date part
/// is kept.
pub(crate) mod iso_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("{}T00:00:00Z", date.format("%Y-%m-%d")))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid date '{}'", raw)))
    }

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn trip(id: &str, owner: &str, start: NaiveDate) -> Trip {
        Trip::new(id, owner, Country::Italy, start, start + chrono::Days::new(3))
    }

    #[test]
    fn test_trip_serializes_iso_datetimes_and_camel_case() {
        let t = Trip::new("t1", "u1", Country::Spain, d(2024, 3, 1), d(2024, 3, 8));
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"ownerId\":\"u1\""));
        assert!(json.contains("\"startDate\":\"2024-03-01T00:00:00Z\""));
        assert!(json.contains("\"endDate\":\"2024-03-08T00:00:00Z\""));
        assert!(json.contains("\"country\":\"Spain\""));
    }

    #[test]
    fn test_trip_reads_browser_style_timestamp() {
        let json = r#"{"id":"x","ownerId":"u","country":"France",
            "startDate":"2023-06-01T00:00:00.000Z","endDate":"2023-06-11T00:00:00.000Z"}"#;
        let t: Trip = serde_json::from_str(json).unwrap();
        assert_eq!(t.start_date, d(2023, 6, 1));
        assert_eq!(t.end_date, d(2023, 6, 11));
    }

    #[test]
    fn test_trip_reads_bare_date() {
        let json = r#"{"id":"x","ownerId":"u","country":"France",
            "startDate":"2023-06-01","endDate":"2023-06-02"}"#;
        let t: Trip = serde_json::from_str(json).unwrap();
        assert_eq!(t.start_date, d(2023, 6, 1));
    }

    #[test]
    fn test_trip_rejects_garbage_date() {
        let json = r#"{"id":"x","ownerId":"u","country":"France",
            "startDate":"yesterday","endDate":"2023-06-02"}"#;
        assert!(serde_json::from_str::<Trip>(json).is_err());
    }

    #[test]
    fn test_for_owner_filters_and_sorts_descending() {
        let mut data = TripData::default();
        data.add(trip("a", "alice", d(2024, 1, 1)));
        data.add(trip("b", "bob", d(2024, 2, 1)));
        data.add(trip("c", "alice", d(2024, 3, 1)));
        let trips = data.for_owner("alice");
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].id, "c");
        assert_eq!(trips[1].id, "a");
    }

    #[test]
    fn test_remove_returns_trip() {
        let mut data = TripData::default();
        data.add(trip("a", "alice", d(2024, 1, 1)));
        let removed = data.remove("a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(data.trips.is_empty());
        assert!(data.remove("a").is_none());
    }

    #[test]
    fn test_get_mut_allows_replace() {
        let mut data = TripData::default();
        data.add(trip("a", "alice", d(2024, 1, 1)));
        data.get_mut("a").unwrap().country = Country::Norway;
        assert_eq!(data.get("a").unwrap().country, Country::Norway);
    }
}
