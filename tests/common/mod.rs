#![allow(dead_code)]

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;

use boxoffice::models::{Card, Event, User};
use boxoffice::{BoxOffice, Clock, Config, FixedClock};

pub struct TestOffice {
    pub dir: TempDir,
    pub office: BoxOffice,
    pub clock: Arc<FixedClock>,
    pub admin: User,
    pub buyer: User,
}

pub fn config(dir: &TempDir) -> Config {
    Config::new(dir.path()).with_lock_timeout(std::time::Duration::from_millis(1000))
}

pub async fn open() -> TestOffice {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2030, 3, 10, 20, 0, 0).unwrap(),
    ));
    let office = BoxOffice::open_with_clock(&config(&dir), clock.clone())
        .await
        .unwrap();

    let admin = office
        .users()
        .register("admin", "admin-pw", "Admin", "000", "admin@example.com", true)
        .await
        .unwrap();
    let buyer = office
        .users()
        .register("maria", "pw", "Maria", "123", "maria@example.com", false)
        .await
        .unwrap();

    TestOffice {
        dir,
        office,
        clock,
        admin,
        buyer,
    }
}

impl TestOffice {
    /// An event a week out with the given seats on sale.
    pub async fn event(&self, name: &str, seats: &[&str]) -> Event {
        let event = self
            .office
            .events()
            .create(
                self.admin.id,
                name,
                "Main stage",
                self.clock.now() + Duration::days(7),
                rust_decimal::Decimal::new(15050, 2),
            )
            .await
            .unwrap();
        for seat in seats {
            self.office.events().add_seat(event.id, seat).await.unwrap();
        }
        self.office.events().require(event.id).await.unwrap()
    }

    pub async fn card(&self, user: &User, number: &str) -> Card {
        self.office
            .cards()
            .add(
                user.id,
                number,
                "321",
                NaiveDate::from_ymd_opt(2031, 12, 31).unwrap(),
                "Personal",
            )
            .await
            .unwrap()
    }

    pub async fn seats(&self, event_id: uuid::Uuid) -> Vec<String> {
        let mut seats = self
            .office
            .events()
            .require(event_id)
            .await
            .unwrap()
            .available_seats;
        seats.sort();
        seats
    }
}
