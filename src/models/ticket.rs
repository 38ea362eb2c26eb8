use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub price: Decimal,
    pub seat: String,
    pub active: bool,
}

impl Ticket {
    pub fn new(event_id: Uuid, user_id: Uuid, price: Decimal, seat: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            event_id,
            price,
            seat: seat.into(),
            active: true,
        }
    }
}

impl Record for Ticket {
    const RESOURCE: &'static str = "tickets";

    fn id(&self) -> Uuid {
        self.id
    }
}
