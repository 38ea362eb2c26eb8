use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use boxoffice::{BoxOffice, Config};

#[tokio::main]
async fn main() {
    dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    tracing::info!(
        data_dir = %config.data_dir.display(),
        lock_timeout_ms = config.lock_timeout.as_millis() as u64,
        "Starting box office"
    );

    let office = match BoxOffice::open(&config).await {
        Ok(office) => office,
        Err(err) => {
            err.log();
            std::process::exit(1);
        }
    };

    match office.inventory().await {
        Ok(inventory) => tracing::info!(
            users = inventory.users,
            events = inventory.events,
            tickets = inventory.tickets,
            purchases = inventory.purchases,
            cards = inventory.cards,
            reviews = inventory.reviews,
            "Collections loaded"
        ),
        Err(err) => {
            err.log();
            std::process::exit(1);
        }
    }

    match office.events().list_available().await {
        Ok(events) => {
            for event in events {
                tracing::info!(
                    event_id = %event.id,
                    name = %event.name,
                    starts_at = %event.starts_at,
                    seats = event.available_seats.len(),
                    "Event on sale"
                );
            }
        }
        Err(err) => err.log(),
    }
}
