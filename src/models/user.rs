use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;

/// A registered account.
///
/// `ticket_ids`, `card_ids` and `receipts` are caches maintained by the
/// ticket, card and purchase components through the user registry; the
/// ticket and card stores remain the source of truth.
///
/// The password is stored as given. There is no hashing in this engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub password: String,
    pub name: String,
    pub national_id: String,
    pub email: String,
    pub is_admin: bool,
    #[serde(default)]
    pub ticket_ids: Vec<Uuid>,
    #[serde(default)]
    pub card_ids: Vec<Uuid>,
    #[serde(default)]
    pub receipts: Vec<String>,
}

impl User {
    pub fn new(
        login: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
        national_id: impl Into<String>,
        email: impl Into<String>,
        is_admin: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            login: login.into(),
            password: password.into(),
            name: name.into(),
            national_id: national_id.into(),
            email: email.into(),
            is_admin,
            ticket_ids: Vec::new(),
            card_ids: Vec::new(),
            receipts: Vec::new(),
        }
    }

    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }
}

impl Record for User {
    const RESOURCE: &'static str = "users";

    fn id(&self) -> Uuid {
        self.id
    }
}
