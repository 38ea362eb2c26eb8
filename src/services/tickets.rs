//! Seat-to-ticket binding.
//!
//! Every transition of a seat between "available" and "held by an active
//! ticket" happens here, inside the per-event seat lock, so a seat is never
//! both listed as available and held by an active ticket.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Event, Ticket};
use crate::store::{FileStore, SeatLocks};
use crate::utils::clock::Clock;
use crate::utils::error::{BoxOfficeError, Result};

#[derive(Clone)]
pub struct TicketInventory {
    tickets: Arc<FileStore<Ticket>>,
    events: Arc<FileStore<Event>>,
    seat_locks: Arc<SeatLocks>,
    clock: Arc<dyn Clock>,
}

impl TicketInventory {
    pub fn new(
        tickets: Arc<FileStore<Ticket>>,
        events: Arc<FileStore<Event>>,
        seat_locks: Arc<SeatLocks>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tickets,
            events,
            seat_locks,
            clock,
        }
    }

    /// Binds `seat` of `event_id` to a new active ticket for `user_id`.
    ///
    /// Fails with `SeatUnavailable` when the seat is not in the event's
    /// available list at the time the lock is held.
    pub async fn issue(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        price: Decimal,
        seat: &str,
    ) -> Result<Ticket> {
        let _guard = self.seat_locks.lock(event_id).await?;

        self.take_seat(event_id, seat).await?;
        let ticket = Ticket::new(event_id, user_id, price, seat);
        if let Err(err) = self.tickets.save(ticket.clone()).await {
            self.restore_seat(event_id, seat).await;
            return Err(err);
        }

        info!(ticket_id = %ticket.id, %event_id, %user_id, seat = %seat, "Ticket issued");
        Ok(ticket)
    }

    /// Returns the seat of an active ticket to its event. Only possible
    /// while the event has not started: `Ok(false)` otherwise, with the
    /// ticket left untouched. Cancelling an inactive ticket is also a no-op.
    pub async fn cancel(&self, ticket_id: Uuid) -> Result<bool> {
        let event_id = self.require(ticket_id).await?.event_id;
        let _guard = self.seat_locks.lock(event_id).await?;

        let mut ticket = self.require(ticket_id).await?;
        if !ticket.active {
            return Ok(false);
        }
        let event = self.require_event(event_id).await?;
        if !event.is_active(self.clock.now()) {
            info!(%ticket_id, %event_id, "Cancellation refused, event already took place");
            return Ok(false);
        }

        ticket.active = false;
        self.tickets.update(ticket.clone()).await?;
        if let Err(err) = self.give_seat(event_id, &ticket.seat).await {
            ticket.active = true;
            self.tickets.update(ticket).await?;
            return Err(err);
        }

        info!(%ticket_id, %event_id, seat = %ticket.seat, "Ticket cancelled");
        Ok(true)
    }

    /// Takes the seat of a cancelled ticket back out of availability.
    ///
    /// `Ok(false)` when the ticket is already active or the event has
    /// started. Fails with `SeatUnavailable` if the seat went to someone
    /// else since the cancellation.
    pub async fn reactivate(&self, ticket_id: Uuid) -> Result<bool> {
        let event_id = self.require(ticket_id).await?.event_id;
        let _guard = self.seat_locks.lock(event_id).await?;

        let mut ticket = self.require(ticket_id).await?;
        if ticket.active {
            return Ok(false);
        }
        let event = self.require_event(event_id).await?;
        if !event.is_active(self.clock.now()) {
            info!(%ticket_id, %event_id, "Reactivation skipped, event already took place");
            return Ok(false);
        }

        self.take_seat(event_id, &ticket.seat).await?;
        ticket.active = true;
        if let Err(err) = self.tickets.update(ticket.clone()).await {
            self.restore_seat(event_id, &ticket.seat).await;
            return Err(err);
        }

        info!(%ticket_id, %event_id, seat = %ticket.seat, "Ticket reactivated");
        Ok(true)
    }

    /// Undoes an issuance: the seat goes back whatever the event date and
    /// the ticket record is removed. Missing tickets are ignored.
    pub(crate) async fn void(&self, ticket_id: Uuid) -> Result<()> {
        let Some(ticket) = self.get(ticket_id).await? else {
            return Ok(());
        };
        let _guard = self.seat_locks.lock(ticket.event_id).await?;

        if ticket.active {
            self.give_seat(ticket.event_id, &ticket.seat).await?;
        }
        self.tickets.delete(ticket_id).await?;

        info!(%ticket_id, event_id = %ticket.event_id, seat = %ticket.seat, "Ticket voided");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Ticket>> {
        self.tickets.get_by_id(id).await
    }

    pub async fn require(&self, id: Uuid) -> Result<Ticket> {
        self.get(id)
            .await?
            .ok_or_else(|| BoxOfficeError::not_found("Ticket", id))
    }

    pub async fn list(&self) -> Result<Vec<Ticket>> {
        self.tickets.get_all().await
    }

    pub async fn tickets_for_user(&self, user_id: Uuid) -> Result<Vec<Ticket>> {
        self.tickets.filter(|t| t.user_id == user_id).await
    }

    pub async fn tickets_for_event(&self, event_id: Uuid) -> Result<Vec<Ticket>> {
        self.tickets.filter(|t| t.event_id == event_id).await
    }

    pub async fn event_for_ticket(&self, ticket_id: Uuid) -> Result<Event> {
        let ticket = self.require(ticket_id).await?;
        self.require_event(ticket.event_id).await
    }

    pub async fn count(&self) -> Result<usize> {
        self.tickets.count().await
    }

    pub(crate) async fn clear(&self) -> Result<()> {
        self.tickets.delete_all().await
    }

    async fn require_event(&self, event_id: Uuid) -> Result<Event> {
        self.events
            .get_by_id(event_id)
            .await?
            .ok_or_else(|| BoxOfficeError::not_found("Event", event_id))
    }

    async fn take_seat(&self, event_id: Uuid, seat: &str) -> Result<()> {
        self.events
            .transaction(|events| {
                let event = events
                    .iter_mut()
                    .find(|e| e.id == event_id)
                    .ok_or_else(|| BoxOfficeError::not_found("Event", event_id))?;
                if !event.remove_seat(seat) {
                    return Err(BoxOfficeError::SeatUnavailable {
                        event_id,
                        seat: seat.to_string(),
                    });
                }
                Ok(())
            })
            .await
    }

    async fn give_seat(&self, event_id: Uuid, seat: &str) -> Result<()> {
        self.events
            .transaction(|events| {
                let event = events
                    .iter_mut()
                    .find(|e| e.id == event_id)
                    .ok_or_else(|| BoxOfficeError::not_found("Event", event_id))?;
                if !event.has_seat(seat) {
                    event.add_seat(seat);
                }
                Ok(())
            })
            .await
    }

    /// Best-effort seat return after a failed ticket write.
    async fn restore_seat(&self, event_id: Uuid, seat: &str) {
        if let Err(err) = self.give_seat(event_id, seat).await {
            warn!(%event_id, seat = %seat, error = %err, "Failed to return seat after aborted write");
        }
    }
}
