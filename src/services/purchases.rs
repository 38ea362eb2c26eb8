//! Checkout orchestration.
//!
//! A checkout of N seats is all-or-nothing. Each completed step records the
//! action that undoes it; the first failure replays those actions newest
//! first before the error is returned.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Card, Event, Payment, Purchase, Ticket, User};
use crate::services::cards::CardVault;
use crate::services::events::EventCatalog;
use crate::services::tickets::TicketInventory;
use crate::services::users::UserRegistry;
use crate::store::FileStore;
use crate::utils::clock::Clock;
use crate::utils::error::{BoxOfficeError, Result};

#[derive(Debug)]
enum Compensation {
    VoidTicket(Uuid),
    DeletePurchase(Uuid),
    DetachFromUser {
        user_id: Uuid,
        ticket_id: Uuid,
        receipt: String,
    },
}

#[derive(Clone)]
pub struct PurchaseLedger {
    purchases: Arc<FileStore<Purchase>>,
    tickets: TicketInventory,
    users: UserRegistry,
    events: EventCatalog,
    cards: CardVault,
    clock: Arc<dyn Clock>,
}

impl PurchaseLedger {
    pub fn new(
        purchases: Arc<FileStore<Purchase>>,
        tickets: TicketInventory,
        users: UserRegistry,
        events: EventCatalog,
        cards: CardVault,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            purchases,
            tickets,
            users,
            events,
            cards,
            clock,
        }
    }

    /// Buys `seats` paying with one of the buyer's own, currently valid cards.
    pub async fn purchase_with_card<S: AsRef<str>>(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        seats: &[S],
        card_id: Uuid,
        price: Decimal,
    ) -> Result<Vec<Uuid>> {
        let card = self.cards.require(card_id).await?;
        if card.user_id != user_id {
            return Err(BoxOfficeError::PermissionDenied(
                "card belongs to another user".to_string(),
            ));
        }
        if !self.cards.is_active(&card) {
            return Err(BoxOfficeError::InvalidState(
                "card is expired or deactivated".to_string(),
            ));
        }

        self.checkout(user_id, event_id, seats, Payment::Card(card_id), price)
            .await
    }

    /// Buys `seats` against a deferred boleto reference.
    pub async fn purchase_with_boleto<S: AsRef<str>>(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        seats: &[S],
        boleto_id: Uuid,
        price: Decimal,
    ) -> Result<Vec<Uuid>> {
        self.checkout(user_id, event_id, seats, Payment::Boleto(boleto_id), price)
            .await
    }

    async fn checkout<S: AsRef<str>>(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        seats: &[S],
        payment: Payment,
        price: Decimal,
    ) -> Result<Vec<Uuid>> {
        let user = self.users.require(user_id).await?;
        let event = self.events.require(event_id).await?;
        if !self.events.is_active(&event) {
            return Err(BoxOfficeError::InvalidState(
                "tickets can only be bought before the event starts".to_string(),
            ));
        }

        let mut undo = Vec::new();
        let mut purchase_ids = Vec::with_capacity(seats.len());
        for seat in seats {
            match self
                .purchase_seat(&user, &event, seat.as_ref(), payment, price, &mut undo)
                .await
            {
                Ok(id) => purchase_ids.push(id),
                Err(err) => {
                    err.log();
                    self.roll_back(undo).await;
                    return Err(err);
                }
            }
        }

        info!(
            %user_id,
            %event_id,
            method = payment.method(),
            seats = purchase_ids.len(),
            email = %user.email,
            "Purchase completed, receipts sent"
        );
        Ok(purchase_ids)
    }

    async fn purchase_seat(
        &self,
        user: &User,
        event: &Event,
        seat: &str,
        payment: Payment,
        price: Decimal,
        undo: &mut Vec<Compensation>,
    ) -> Result<Uuid> {
        let ticket = self.tickets.issue(event.id, user.id, price, seat).await?;
        undo.push(Compensation::VoidTicket(ticket.id));

        let purchase = Purchase::new(
            user.id,
            event.id,
            ticket.id,
            payment,
            price,
            self.clock.now(),
        );
        self.purchases.save(purchase.clone()).await?;
        undo.push(Compensation::DeletePurchase(purchase.id));

        let receipt = purchase.receipt(event, seat);
        self.users
            .append_purchase(user.id, ticket.id, receipt.clone())
            .await?;
        undo.push(Compensation::DetachFromUser {
            user_id: user.id,
            ticket_id: ticket.id,
            receipt,
        });

        Ok(purchase.id)
    }

    async fn roll_back(&self, undo: Vec<Compensation>) {
        for step in undo.into_iter().rev() {
            let outcome = match &step {
                Compensation::VoidTicket(ticket_id) => self.tickets.void(*ticket_id).await,
                Compensation::DeletePurchase(purchase_id) => {
                    self.purchases.delete(*purchase_id).await
                }
                Compensation::DetachFromUser {
                    user_id,
                    ticket_id,
                    receipt,
                } => {
                    self.users
                        .remove_purchase(*user_id, *ticket_id, receipt)
                        .await
                }
            };
            if let Err(err) = outcome {
                warn!(?step, error = %err, "Compensation step failed");
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Purchase>> {
        self.purchases.get_by_id(id).await
    }

    pub async fn require(&self, id: Uuid) -> Result<Purchase> {
        self.get(id)
            .await?
            .ok_or_else(|| BoxOfficeError::not_found("Purchase", id))
    }

    pub async fn list(&self) -> Result<Vec<Purchase>> {
        self.purchases.get_all().await
    }

    pub async fn purchases_for_user(&self, user_id: Uuid) -> Result<Vec<Purchase>> {
        self.purchases.filter(|p| p.user_id == user_id).await
    }

    pub async fn event_for(&self, purchase_id: Uuid) -> Result<Event> {
        let purchase = self.require(purchase_id).await?;
        self.events.require(purchase.event_id).await
    }

    pub async fn ticket_for(&self, purchase_id: Uuid) -> Result<Ticket> {
        let purchase = self.require(purchase_id).await?;
        self.tickets.require(purchase.ticket_id).await
    }

    /// `None` for boleto purchases.
    pub async fn card_for(&self, purchase_id: Uuid) -> Result<Option<Card>> {
        let purchase = self.require(purchase_id).await?;
        match purchase.payment.card_id() {
            Some(card_id) => self.cards.get(card_id).await,
            None => Ok(None),
        }
    }

    pub async fn buyer_login_for(&self, purchase_id: Uuid) -> Result<String> {
        let purchase = self.require(purchase_id).await?;
        Ok(self.users.require(purchase.user_id).await?.login)
    }

    pub async fn count(&self) -> Result<usize> {
        self.purchases.count().await
    }

    pub(crate) async fn clear(&self) -> Result<()> {
        self.purchases.delete_all().await
    }
}
