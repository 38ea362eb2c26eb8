pub mod card;
pub mod event;
pub mod purchase;
pub mod review;
pub mod ticket;
pub mod user;

pub use card::Card;
pub use event::Event;
pub use purchase::{Payment, Purchase};
pub use review::Review;
pub use ticket::Ticket;
pub use user::User;
