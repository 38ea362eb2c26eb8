mod common;

use uuid::Uuid;

use boxoffice::{BoxOffice, BoxOfficeError, Inventory};

#[tokio::test]
async fn test_records_survive_reopening_the_data_dir() {
    let t = common::open().await;
    let event = t.event("Reopen", &["A1", "A2"]).await;
    let card = t.card(&t.buyer, "4111111111111111").await;
    t.office
        .purchases()
        .purchase_with_card(t.buyer.id, event.id, &["A1"], card.id, event.price)
        .await
        .unwrap();

    let reopened = BoxOffice::open_with_clock(&common::config(&t.dir), t.clock.clone())
        .await
        .unwrap();

    assert_eq!(
        reopened.inventory().await.unwrap(),
        Inventory {
            users: 2,
            events: 1,
            tickets: 1,
            purchases: 1,
            cards: 1,
            reviews: 0,
        }
    );
    let stored = reopened.events().require(event.id).await.unwrap();
    assert_eq!(stored.available_seats, vec!["A2"]);
    let buyer = reopened.users().require(t.buyer.id).await.unwrap();
    assert_eq!(buyer.card_ids, vec![card.id]);
    assert_eq!(buyer.receipts.len(), 1);
    assert!(reopened.users().authenticate("maria", "pw").await.unwrap());
}

#[tokio::test]
async fn test_collections_are_written_as_versioned_json() {
    let t = common::open().await;
    t.event("Files", &["A1"]).await;

    let raw = std::fs::read_to_string(t.dir.path().join("events.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["schema_version"], 1);
    assert_eq!(doc["records"][0]["name"], "Files");
    assert!(t.dir.path().join("users.json").exists());
}

#[tokio::test]
async fn test_clear_all_is_admin_only() {
    let t = common::open().await;
    let event = t.event("Wipe", &["A1"]).await;
    t.office
        .purchases()
        .purchase_with_boleto(t.buyer.id, event.id, &["A1"], Uuid::new_v4(), event.price)
        .await
        .unwrap();

    let denied = t.office.clear_all(t.buyer.id).await;
    assert!(matches!(denied, Err(BoxOfficeError::PermissionDenied(_))));
    assert_eq!(t.office.inventory().await.unwrap().tickets, 1);

    t.office.clear_all(t.admin.id).await.unwrap();
    assert_eq!(t.office.inventory().await.unwrap(), Inventory::default());
}

#[tokio::test]
async fn test_concurrent_buyers_never_share_a_seat() {
    let t = common::open().await;
    let seats = ["R1", "R2", "R3"];
    let event = t.event("Stress", &seats).await;

    let mut buyers = Vec::new();
    for i in 0..12 {
        let user = t
            .office
            .users()
            .register(
                &format!("fan{i}"),
                "pw",
                "Fan",
                &format!("id-{i}"),
                &format!("fan{i}@example.com"),
                false,
            )
            .await
            .unwrap();
        buyers.push(user.id);
    }

    let attempts: Vec<_> = buyers
        .into_iter()
        .enumerate()
        .map(|(i, user_id)| {
            let office = t.office.clone();
            let seat = seats[i % seats.len()];
            let price = event.price;
            let event_id = event.id;
            tokio::spawn(async move {
                office
                    .purchases()
                    .purchase_with_boleto(user_id, event_id, &[seat], Uuid::new_v4(), price)
                    .await
            })
        })
        .collect();

    let mut sold = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(ids) => sold += ids.len(),
            Err(BoxOfficeError::SeatUnavailable { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(sold, seats.len());
    assert!(t.seats(event.id).await.is_empty());

    let tickets = t.office.tickets().tickets_for_event(event.id).await.unwrap();
    let mut held: Vec<_> = tickets.iter().map(|ticket| ticket.seat.clone()).collect();
    held.sort();
    assert_eq!(held, seats);
    assert_eq!(t.office.purchases().list().await.unwrap().len(), seats.len());
}
