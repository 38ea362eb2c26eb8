use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::Review;
use crate::services::events::EventCatalog;
use crate::services::users::UserRegistry;
use crate::store::FileStore;
use crate::utils::error::{BoxOfficeError, Result};

/// Post-event ratings and comments. One review per user and event.
#[derive(Clone)]
pub struct ReviewAggregator {
    reviews: Arc<FileStore<Review>>,
    events: EventCatalog,
    users: UserRegistry,
}

impl ReviewAggregator {
    pub fn new(reviews: Arc<FileStore<Review>>, events: EventCatalog, users: UserRegistry) -> Self {
        Self {
            reviews,
            events,
            users,
        }
    }

    /// Reviews open once the event has taken place.
    pub async fn create(
        &self,
        comment: &str,
        rating: i32,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Review> {
        let event = self.events.require(event_id).await?;
        self.users.require(user_id).await?;
        if self.events.is_active(&event) {
            return Err(BoxOfficeError::InvalidState(
                "events can only be reviewed after they take place".to_string(),
            ));
        }

        let review = Review::new(comment, rating, user_id, event_id);
        let created = review.clone();
        self.reviews
            .transaction(move |reviews| {
                if reviews
                    .iter()
                    .any(|r| r.user_id == review.user_id && r.event_id == review.event_id)
                {
                    return Err(BoxOfficeError::UniquenessViolation(
                        "user already reviewed this event".to_string(),
                    ));
                }
                reviews.push(review);
                Ok(())
            })
            .await?;

        info!(review_id = %created.id, %user_id, %event_id, rating, "Review created");
        Ok(created)
    }

    /// Arithmetic mean of all ratings for the event, `0.0` when unrated.
    pub async fn average_rating(&self, event_id: Uuid) -> Result<f64> {
        let reviews = self.reviews_for_event(event_id).await?;
        if reviews.is_empty() {
            return Ok(0.0);
        }
        let total: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
        Ok(total as f64 / reviews.len() as f64)
    }

    pub async fn reviews_for_event(&self, event_id: Uuid) -> Result<Vec<Review>> {
        self.reviews.filter(|r| r.event_id == event_id).await
    }

    pub async fn reviews_for_user(&self, user_id: Uuid) -> Result<Vec<Review>> {
        self.reviews.filter(|r| r.user_id == user_id).await
    }

    pub async fn find_by_user_and_event(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Review>> {
        self.reviews
            .find(|r| r.user_id == user_id && r.event_id == event_id)
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Review>> {
        self.reviews.get_by_id(id).await
    }

    pub async fn update(&self, id: Uuid, comment: &str, rating: i32) -> Result<Review> {
        let updated = self
            .reviews
            .transaction(|reviews| {
                let review = reviews
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or_else(|| BoxOfficeError::not_found("Review", id))?;
                review.comment = comment.to_string();
                review.rating = rating;
                Ok(review.clone())
            })
            .await?;

        info!(review_id = %id, rating, "Review updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.reviews.delete(id).await
    }

    pub async fn count(&self) -> Result<usize> {
        self.reviews.count().await
    }

    pub(crate) async fn clear(&self) -> Result<()> {
        self.reviews.delete_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, User};
    use crate::store::SeatLocks;
    use crate::utils::clock::{Clock, FixedClock};
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        reviews: ReviewAggregator,
        users: UserRegistry,
        clock: Arc<FixedClock>,
        event: Event,
        fan: User,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let timeout = std::time::Duration::from_millis(200);
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2030, 2, 1, 9, 0, 0).unwrap(),
        ));
        let users = UserRegistry::new(Arc::new(FileStore::open(dir.path(), timeout)));
        let admin = users
            .register("admin", "pw", "Admin", "1", "admin@example.com", true)
            .await
            .unwrap();
        let fan = users
            .register("fan", "pw", "Fan", "2", "fan@example.com", false)
            .await
            .unwrap();
        let events = EventCatalog::new(
            Arc::new(FileStore::open(dir.path(), timeout)),
            Arc::new(FileStore::open(dir.path(), timeout)),
            users.clone(),
            Arc::new(SeatLocks::new(timeout)),
            clock.clone(),
        );
        let event = events
            .create(admin.id, "Festival", "", clock.now() + Duration::days(1), Decimal::from(80))
            .await
            .unwrap();
        let reviews = ReviewAggregator::new(
            Arc::new(FileStore::open(dir.path(), timeout)),
            events,
            users.clone(),
        );

        Fixture {
            _dir: dir,
            reviews,
            users,
            clock,
            event,
            fan,
        }
    }

    #[tokio::test]
    async fn test_review_requires_event_to_have_happened() {
        let f = fixture().await;

        let early = f.reviews.create("Can't wait", 5, f.fan.id, f.event.id).await;
        assert!(matches!(early, Err(BoxOfficeError::InvalidState(_))));
        assert!(f.reviews.reviews_for_event(f.event.id).await.unwrap().is_empty());

        f.clock.advance(Duration::days(2));
        let review = f
            .reviews
            .create("Great show", 5, f.fan.id, f.event.id)
            .await
            .unwrap();
        assert_eq!(
            f.reviews.find_by_user_and_event(f.fan.id, f.event.id).await.unwrap(),
            Some(review)
        );
    }

    #[tokio::test]
    async fn test_average_rating() {
        let f = fixture().await;
        assert_eq!(f.reviews.average_rating(f.event.id).await.unwrap(), 0.0);

        f.clock.advance(Duration::days(2));
        let other = f
            .users
            .register("other", "pw", "Other", "3", "other@example.com", false)
            .await
            .unwrap();
        f.reviews.create("Good", 4, f.fan.id, f.event.id).await.unwrap();
        f.reviews.create("Great", 5, other.id, f.event.id).await.unwrap();

        assert_eq!(f.reviews.average_rating(f.event.id).await.unwrap(), 4.5);
        assert_eq!(f.reviews.reviews_for_user(other.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_review_by_same_user_is_rejected() {
        let f = fixture().await;
        f.clock.advance(Duration::days(2));
        f.reviews.create("Good", 4, f.fan.id, f.event.id).await.unwrap();

        let again = f.reviews.create("Changed my mind", 1, f.fan.id, f.event.id).await;
        assert!(matches!(again, Err(BoxOfficeError::UniquenessViolation(_))));
        assert_eq!(f.reviews.average_rating(f.event.id).await.unwrap(), 4.0);
    }

    #[tokio::test]
    async fn test_review_of_unknown_event_or_user_is_not_found() {
        let f = fixture().await;
        f.clock.advance(Duration::days(2));

        let no_event = f.reviews.create("?", 3, f.fan.id, Uuid::new_v4()).await;
        let no_user = f.reviews.create("?", 3, Uuid::new_v4(), f.event.id).await;
        assert!(matches!(no_event, Err(BoxOfficeError::NotFound(_))));
        assert!(matches!(no_user, Err(BoxOfficeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let f = fixture().await;
        f.clock.advance(Duration::days(2));
        let review = f.reviews.create("Ok", 3, f.fan.id, f.event.id).await.unwrap();

        let updated = f.reviews.update(review.id, "Better on reflection", 4).await.unwrap();
        assert_eq!(updated.rating, 4);
        assert_eq!(f.reviews.get(review.id).await.unwrap(), Some(updated));

        f.reviews.delete(review.id).await.unwrap();
        assert!(f.reviews.get(review.id).await.unwrap().is_none());
        let missing = f.reviews.update(review.id, "", 1).await;
        assert!(matches!(missing, Err(BoxOfficeError::NotFound(_))));
    }
}
