use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub price: Decimal,
    #[serde(default)]
    pub available_seats: Vec<String>,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        starts_at: DateTime<Utc>,
        price: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            starts_at,
            price,
            available_seats: Vec::new(),
        }
    }

    /// An event is active until its start time; it is never stored.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.starts_at
    }

    pub fn has_seat(&self, seat: &str) -> bool {
        self.available_seats.iter().any(|s| s == seat)
    }

    pub fn add_seat(&mut self, seat: impl Into<String>) {
        self.available_seats.push(seat.into());
    }

    /// Removes the first occurrence of `seat`. Returns whether it was present.
    pub fn remove_seat(&mut self, seat: &str) -> bool {
        match self.available_seats.iter().position(|s| s == seat) {
            Some(index) => {
                self.available_seats.remove(index);
                true
            }
            None => false,
        }
    }
}

impl Record for Event {
    const RESOURCE: &'static str = "events";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_is_active_is_strictly_before_start() {
        let now = Utc::now();
        let event = Event::new("Show", "", now, Decimal::from(50));

        assert!(!event.is_active(now));
        assert!(event.is_active(now - Duration::seconds(1)));
        assert!(!event.is_active(now + Duration::seconds(1)));
    }

    #[test]
    fn test_remove_seat_removes_first_occurrence_only() {
        let mut event = Event::new("Show", "", Utc::now(), Decimal::from(50));
        event.add_seat("A1");
        event.add_seat("B2");
        event.add_seat("A1");

        assert!(event.remove_seat("A1"));
        assert_eq!(event.available_seats, vec!["B2", "A1"]);
        assert!(!event.remove_seat("C3"));
        assert_eq!(event.available_seats.len(), 2);
    }
}
