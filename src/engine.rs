//! Wires every component over one storage root.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::services::{
    CardVault, EventCatalog, PurchaseLedger, ReviewAggregator, TicketInventory, UserRegistry,
};
use crate::store::{FileStore, SeatLocks};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::error::Result;

/// Record counts per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Inventory {
    pub users: usize,
    pub events: usize,
    pub tickets: usize,
    pub purchases: usize,
    pub cards: usize,
    pub reviews: usize,
}

#[derive(Clone)]
pub struct BoxOffice {
    users: UserRegistry,
    events: EventCatalog,
    cards: CardVault,
    tickets: TicketInventory,
    purchases: PurchaseLedger,
    reviews: ReviewAggregator,
}

impl BoxOffice {
    pub async fn open(config: &Config) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        tokio::fs::create_dir_all(&config.data_dir).await?;

        let root = config.data_dir.as_path();
        let timeout = config.lock_timeout;
        let seat_locks = Arc::new(SeatLocks::new(timeout));
        let event_store = Arc::new(FileStore::open(root, timeout));
        let ticket_store = Arc::new(FileStore::open(root, timeout));

        let users = UserRegistry::new(Arc::new(FileStore::open(root, timeout)));
        let events = EventCatalog::new(
            event_store.clone(),
            ticket_store.clone(),
            users.clone(),
            seat_locks.clone(),
            clock.clone(),
        );
        let cards = CardVault::new(
            Arc::new(FileStore::open(root, timeout)),
            users.clone(),
            clock.clone(),
        );
        let tickets = TicketInventory::new(
            ticket_store,
            event_store,
            seat_locks,
            clock.clone(),
        );
        let purchases = PurchaseLedger::new(
            Arc::new(FileStore::open(root, timeout)),
            tickets.clone(),
            users.clone(),
            events.clone(),
            cards.clone(),
            clock,
        );
        let reviews = ReviewAggregator::new(
            Arc::new(FileStore::open(root, timeout)),
            events.clone(),
            users.clone(),
        );

        info!(data_dir = %config.data_dir.display(), "Box office opened");
        Ok(Self {
            users,
            events,
            cards,
            tickets,
            purchases,
            reviews,
        })
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    pub fn events(&self) -> &EventCatalog {
        &self.events
    }

    pub fn cards(&self) -> &CardVault {
        &self.cards
    }

    pub fn tickets(&self) -> &TicketInventory {
        &self.tickets
    }

    pub fn purchases(&self) -> &PurchaseLedger {
        &self.purchases
    }

    pub fn reviews(&self) -> &ReviewAggregator {
        &self.reviews
    }

    pub async fn inventory(&self) -> Result<Inventory> {
        Ok(Inventory {
            users: self.users.count().await?,
            events: self.events.count().await?,
            tickets: self.tickets.count().await?,
            purchases: self.purchases.count().await?,
            cards: self.cards.count().await?,
            reviews: self.reviews.count().await?,
        })
    }

    /// Admin-only wipe of every collection, users included.
    pub async fn clear_all(&self, requested_by: Uuid) -> Result<()> {
        self.users
            .require_admin(requested_by, "clear all records")
            .await?;

        self.reviews.clear().await?;
        self.purchases.clear().await?;
        self.tickets.clear().await?;
        self.cards.clear().await?;
        self.events.clear().await?;
        self.users.clear().await?;

        info!(by = %requested_by, "All records cleared");
        Ok(())
    }
}
