pub mod cards;
pub mod events;
pub mod purchases;
pub mod reviews;
pub mod tickets;
pub mod users;

pub use cards::CardVault;
pub use events::EventCatalog;
pub use purchases::PurchaseLedger;
pub use reviews::ReviewAggregator;
pub use tickets::TicketInventory;
pub use users::UserRegistry;
