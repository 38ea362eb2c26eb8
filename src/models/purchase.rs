use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::Event;
use crate::store::Record;

/// How a purchase was paid. Exactly one reference is ever set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "reference")]
pub enum Payment {
    Card(Uuid),
    /// Deferred payment slip.
    Boleto(Uuid),
}

impl Payment {
    pub fn method(&self) -> &'static str {
        match self {
            Payment::Card(_) => "Card",
            Payment::Boleto(_) => "Boleto",
        }
    }

    pub fn card_id(&self) -> Option<Uuid> {
        match self {
            Payment::Card(id) => Some(*id),
            Payment::Boleto(_) => None,
        }
    }

    pub fn boleto_id(&self) -> Option<Uuid> {
        match self {
            Payment::Card(_) => None,
            Payment::Boleto(id) => Some(*id),
        }
    }
}

impl fmt::Display for Payment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// One seat bought by one user. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub ticket_id: Uuid,
    pub payment: Payment,
    pub purchased_at: DateTime<Utc>,
    pub price: Decimal,
}

impl Purchase {
    pub fn new(
        user_id: Uuid,
        event_id: Uuid,
        ticket_id: Uuid,
        payment: Payment,
        price: Decimal,
        purchased_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            event_id,
            ticket_id,
            payment,
            purchased_at,
            price,
        }
    }

    /// Human-readable receipt delivered to the buyer's mailbox.
    pub fn receipt(&self, event: &Event, seat: &str) -> String {
        format!(
            "Ticket ID: {}\nEvent: {}\nDate: {}\nSeat: {}\nPrice: {}\nPayment method: {}\nTransaction ID: {}",
            self.ticket_id,
            event.name,
            event.starts_at.format("%Y-%m-%d %H:%M UTC"),
            seat,
            self.price,
            self.payment,
            self.id,
        )
    }
}

impl Record for Purchase {
    const RESOURCE: &'static str = "purchases";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_receipt_lists_every_purchase_detail() {
        let starts_at = Utc.with_ymd_and_hms(2031, 3, 14, 21, 30, 0).unwrap();
        let event = Event::new("Opera Night", "Act I", starts_at, Decimal::from(120));
        let purchase = Purchase::new(
            Uuid::new_v4(),
            event.id,
            Uuid::new_v4(),
            Payment::Boleto(Uuid::new_v4()),
            Decimal::new(12050, 2),
            Utc::now(),
        );

        let receipt = purchase.receipt(&event, "C7");
        let lines: Vec<&str> = receipt.lines().collect();

        assert_eq!(lines[0], format!("Ticket ID: {}", purchase.ticket_id));
        assert_eq!(lines[1], "Event: Opera Night");
        assert_eq!(lines[2], "Date: 2031-03-14 21:30 UTC");
        assert_eq!(lines[3], "Seat: C7");
        assert_eq!(lines[4], "Price: 120.50");
        assert_eq!(lines[5], "Payment method: Boleto");
        assert_eq!(lines[6], format!("Transaction ID: {}", purchase.id));
    }

    #[test]
    fn test_payment_serializes_method_tag_with_single_reference() {
        let card = Uuid::new_v4();
        let value = serde_json::to_value(Payment::Card(card)).unwrap();

        assert_eq!(value["method"], "Card");
        assert_eq!(value["reference"], card.to_string());
        assert_eq!(Payment::Card(card).boleto_id(), None);
    }
}
