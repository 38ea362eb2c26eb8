use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;

/// Post-event rating. `rating` is nominally 1 to 5 and is not range checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub comment: String,
    pub rating: i32,
    pub user_id: Uuid,
    pub event_id: Uuid,
}

impl Review {
    pub fn new(comment: impl Into<String>, rating: i32, user_id: Uuid, event_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            comment: comment.into(),
            rating,
            user_id,
            event_id,
        }
    }
}

impl Record for Review {
    const RESOURCE: &'static str = "reviews";

    fn id(&self) -> Uuid {
        self.id
    }
}
