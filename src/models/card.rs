use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub number: String,
    pub expires_on: NaiveDate,
    pub cvv: String,
    /// Stored flag. Use [`Card::is_active`] for the effective state.
    pub active: bool,
}

impl Card {
    pub fn new(
        user_id: Uuid,
        number: impl Into<String>,
        expires_on: NaiveDate,
        cvv: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            number: number.into(),
            expires_on,
            cvv: cvv.into(),
            active: true,
        }
    }

    /// A card is usable through its expiry day. The stored flag can only
    /// switch a card off early, never revive an expired one.
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.active && today <= self.expires_on
    }
}

impl Record for Card {
    const RESOURCE: &'static str = "cards";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_expiry_wins_over_stored_flag() {
        let card = Card::new(Uuid::new_v4(), "4111", date(2030, 6, 30), "123", "Visa");

        assert!(card.is_active(date(2030, 6, 30)));
        assert!(!card.is_active(date(2030, 7, 1)));
        // Reading never flips the stored flag.
        assert!(card.active);
    }

    #[test]
    fn test_stored_flag_disables_before_expiry() {
        let mut card = Card::new(Uuid::new_v4(), "4111", date(2030, 6, 30), "123", "Visa");
        card.active = false;

        assert!(!card.is_active(date(2029, 1, 1)));
    }
}
