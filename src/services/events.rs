use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::{Event, Ticket};
use crate::services::users::UserRegistry;
use crate::store::{FileStore, SeatLocks};
use crate::utils::clock::Clock;
use crate::utils::error::{BoxOfficeError, Result};

/// Owns event metadata and the seat-availability lists.
///
/// Seat edits made here take the same per-event lock as ticket issuance.
#[derive(Clone)]
pub struct EventCatalog {
    events: Arc<FileStore<Event>>,
    tickets: Arc<FileStore<Ticket>>,
    users: UserRegistry,
    seat_locks: Arc<SeatLocks>,
    clock: Arc<dyn Clock>,
}

impl EventCatalog {
    pub fn new(
        events: Arc<FileStore<Event>>,
        tickets: Arc<FileStore<Ticket>>,
        users: UserRegistry,
        seat_locks: Arc<SeatLocks>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            events,
            tickets,
            users,
            seat_locks,
            clock,
        }
    }

    pub async fn create(
        &self,
        requested_by: Uuid,
        name: &str,
        description: &str,
        starts_at: DateTime<Utc>,
        price: Decimal,
    ) -> Result<Event> {
        self.users
            .require_admin(requested_by, "create events")
            .await?;
        if starts_at <= self.clock.now() {
            return Err(BoxOfficeError::InvalidState(
                "events cannot be scheduled in the past".to_string(),
            ));
        }

        let event = Event::new(name, description, starts_at, price);
        self.events.save(event.clone()).await?;

        info!(event_id = %event.id, name = %event.name, starts_at = %event.starts_at, "Event created");
        Ok(event)
    }

    /// Events that have not started yet.
    pub async fn list_available(&self) -> Result<Vec<Event>> {
        let now = self.clock.now();
        self.events.filter(|e| e.is_active(now)).await
    }

    pub async fn list(&self) -> Result<Vec<Event>> {
        self.events.get_all().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Event>> {
        self.events.get_by_id(id).await
    }

    pub async fn require(&self, id: Uuid) -> Result<Event> {
        self.get(id)
            .await?
            .ok_or_else(|| BoxOfficeError::not_found("Event", id))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Event>> {
        self.events.find(|e| e.name == name).await
    }

    pub fn is_active(&self, event: &Event) -> bool {
        event.is_active(self.clock.now())
    }

    /// Puts `seat` on sale. A label already listed is left as is; one held
    /// by an active ticket is rejected with `SeatUnavailable`.
    pub async fn add_seat(&self, event_id: Uuid, seat: &str) -> Result<Event> {
        let _guard = self.seat_locks.lock(event_id).await?;
        let held = self
            .tickets
            .find(|t| t.event_id == event_id && t.seat == seat && t.active)
            .await?;
        if held.is_some() {
            return Err(BoxOfficeError::SeatUnavailable {
                event_id,
                seat: seat.to_string(),
            });
        }

        let event = self
            .edit(event_id, |event| {
                if !event.has_seat(seat) {
                    event.add_seat(seat);
                }
                Ok(())
            })
            .await?;

        info!(%event_id, seat = %seat, "Seat added");
        Ok(event)
    }

    /// Value-based removal; a missing seat is not an error.
    pub async fn remove_seat(&self, event_id: Uuid, seat: &str) -> Result<Event> {
        let _guard = self.seat_locks.lock(event_id).await?;
        let event = self
            .edit(event_id, |event| {
                event.remove_seat(seat);
                Ok(())
            })
            .await?;

        info!(%event_id, seat = %seat, "Seat removed");
        Ok(event)
    }

    /// Refused with `InvalidState` while any ticket for the event is active.
    pub async fn delete(&self, requested_by: Uuid, id: Uuid) -> Result<()> {
        self.users
            .require_admin(requested_by, "remove events")
            .await?;
        {
            let _guard = self.seat_locks.lock(id).await?;
            let held = self
                .tickets
                .find(|t| t.event_id == id && t.active)
                .await?;
            if held.is_some() {
                return Err(BoxOfficeError::InvalidState(
                    "event still has active tickets".to_string(),
                ));
            }
            self.events.delete(id).await?;
        }
        self.seat_locks.forget(id);

        info!(event_id = %id, by = %requested_by, "Event removed");
        Ok(())
    }

    pub async fn count(&self) -> Result<usize> {
        self.events.count().await
    }

    pub(crate) async fn clear(&self) -> Result<()> {
        self.events.delete_all().await
    }

    async fn edit<F>(&self, event_id: Uuid, change: F) -> Result<Event>
    where
        F: FnOnce(&mut Event) -> Result<()>,
    {
        self.events
            .transaction(move |events| {
                let event = events
                    .iter_mut()
                    .find(|e| e.id == event_id)
                    .ok_or_else(|| BoxOfficeError::not_found("Event", event_id))?;
                change(event)?;
                Ok(event.clone())
            })
            .await
    }
}
