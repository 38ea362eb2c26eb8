use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::Card;
use crate::services::users::UserRegistry;
use crate::store::FileStore;
use crate::utils::clock::Clock;
use crate::utils::error::{BoxOfficeError, Result};

/// Payment cards, scoped to their owner.
#[derive(Clone)]
pub struct CardVault {
    cards: Arc<FileStore<Card>>,
    users: UserRegistry,
    clock: Arc<dyn Clock>,
}

impl CardVault {
    pub fn new(cards: Arc<FileStore<Card>>, users: UserRegistry, clock: Arc<dyn Clock>) -> Self {
        Self {
            cards,
            users,
            clock,
        }
    }

    /// Stores a card for `user_id`. The same number may be registered by
    /// different users but only once per user.
    pub async fn add(
        &self,
        user_id: Uuid,
        number: &str,
        cvv: &str,
        expires_on: NaiveDate,
        name: &str,
    ) -> Result<Card> {
        self.users.require(user_id).await?;

        let card = Card::new(user_id, number, expires_on, cvv, name);
        let stored = card.clone();
        self.cards
            .transaction(move |cards| {
                if cards
                    .iter()
                    .any(|c| c.user_id == card.user_id && c.number == card.number)
                {
                    return Err(BoxOfficeError::UniquenessViolation(
                        "a card with this number is already registered".to_string(),
                    ));
                }
                cards.push(card);
                Ok(())
            })
            .await?;

        if let Err(err) = self.users.link_card(user_id, stored.id).await {
            self.cards.delete(stored.id).await?;
            return Err(err);
        }

        info!(card_id = %stored.id, %user_id, "Card added");
        Ok(stored)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Card>> {
        self.cards.get_by_id(id).await
    }

    pub async fn require(&self, id: Uuid) -> Result<Card> {
        self.get(id)
            .await?
            .ok_or_else(|| BoxOfficeError::not_found("Card", id))
    }

    pub async fn cards_for_user(&self, user_id: Uuid) -> Result<Vec<Card>> {
        self.cards.filter(|c| c.user_id == user_id).await
    }

    pub async fn find_by_number(&self, user_id: Uuid, number: &str) -> Result<Option<Card>> {
        self.cards
            .find(|c| c.user_id == user_id && c.number == number)
            .await
    }

    pub async fn find_by_name(&self, user_id: Uuid, name: &str) -> Result<Option<Card>> {
        self.cards
            .find(|c| c.user_id == user_id && c.name == name)
            .await
    }

    /// Effective state as of today; never writes the stored flag.
    pub fn is_active(&self, card: &Card) -> bool {
        card.is_active(self.clock.today())
    }

    /// Switches the stored flag off. Unknown ids are ignored.
    pub async fn deactivate(&self, id: Uuid) -> Result<()> {
        if let Some(mut card) = self.get(id).await? {
            card.active = false;
            self.cards.update(card).await?;
            info!(card_id = %id, "Card deactivated");
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let card = self.require(id).await?;
        self.cards.delete(id).await?;
        self.users.unlink_card(card.user_id, id).await?;
        info!(card_id = %id, user_id = %card.user_id, "Card removed");
        Ok(())
    }

    pub async fn count(&self) -> Result<usize> {
        self.cards.count().await
    }

    pub(crate) async fn clear(&self) -> Result<()> {
        self.cards.delete_all().await
    }
}
