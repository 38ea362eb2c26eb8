pub mod config;
pub mod engine;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use config::Config;
pub use engine::{BoxOffice, Inventory};
pub use utils::clock::{Clock, FixedClock, SystemClock};
pub use utils::error::{BoxOfficeError, Result};
