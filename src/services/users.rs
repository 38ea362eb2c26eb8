use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::User;
use crate::store::FileStore;
use crate::utils::error::{BoxOfficeError, Result};

/// Owns user identity, credentials and the per-user mailbox caches.
#[derive(Clone)]
pub struct UserRegistry {
    users: Arc<FileStore<User>>,
}

impl UserRegistry {
    pub fn new(users: Arc<FileStore<User>>) -> Self {
        Self { users }
    }

    /// Registers a new account. Email, login and national ID are checked in
    /// that order; the check and the insert happen under one store lock.
    pub async fn register(
        &self,
        login: &str,
        password: &str,
        name: &str,
        national_id: &str,
        email: &str,
        is_admin: bool,
    ) -> Result<User> {
        let user = User::new(login, password, name, national_id, email, is_admin);
        let created = user.clone();

        self.users
            .transaction(move |users| {
                if users.iter().any(|u| u.email == user.email) {
                    return Err(taken("email", &user.email));
                }
                if users.iter().any(|u| u.login == user.login) {
                    return Err(taken("login", &user.login));
                }
                if users.iter().any(|u| u.national_id == user.national_id) {
                    return Err(taken("national ID", &user.national_id));
                }
                users.push(user);
                Ok(())
            })
            .await?;

        info!(user_id = %created.id, login = %created.login, admin = created.is_admin, "User registered");
        Ok(created)
    }

    /// Fails closed: an unknown login is simply a failed attempt.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<bool> {
        match self.find_by_login(login).await? {
            Some(user) => Ok(user.password_matches(password)),
            None => {
                warn!(login = %login, "Login attempt for unknown user");
                Ok(false)
            }
        }
    }

    /// Rewrites the editable profile fields. A user may keep its current
    /// email or login; colliding with another user's is rejected.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        login: &str,
        password: &str,
        name: &str,
        email: &str,
    ) -> Result<User> {
        let updated = self
            .users
            .transaction(|users| {
                if users.iter().any(|u| u.id != user_id && u.email == email) {
                    return Err(taken("email", email));
                }
                if users.iter().any(|u| u.id != user_id && u.login == login) {
                    return Err(taken("login", login));
                }
                let user = users
                    .iter_mut()
                    .find(|u| u.id == user_id)
                    .ok_or_else(|| BoxOfficeError::not_found("User", user_id))?;
                user.login = login.to_string();
                user.password = password.to_string();
                user.name = name.to_string();
                user.email = email.to_string();
                Ok(user.clone())
            })
            .await?;

        info!(user_id = %user_id, "Profile updated");
        Ok(updated)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<User>> {
        self.users.get_by_id(id).await
    }

    pub async fn require(&self, id: Uuid) -> Result<User> {
        self.get(id)
            .await?
            .ok_or_else(|| BoxOfficeError::not_found("User", id))
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        self.users.get_all().await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users.find(|u| u.email == email).await
    }

    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        self.users.find(|u| u.login == login).await
    }

    pub async fn find_by_national_id(&self, national_id: &str) -> Result<Option<User>> {
        self.users.find(|u| u.national_id == national_id).await
    }

    /// Fails with `PermissionDenied` unless `requested_by` is an admin.
    pub async fn require_admin(&self, requested_by: Uuid, action: &str) -> Result<User> {
        let user = self.require(requested_by).await?;
        if !user.is_admin {
            return Err(BoxOfficeError::PermissionDenied(format!(
                "only administrators can {}",
                action
            )));
        }
        Ok(user)
    }

    pub async fn delete(&self, requested_by: Uuid, id: Uuid) -> Result<()> {
        self.require_admin(requested_by, "remove users").await?;
        self.users.delete(id).await?;
        info!(user_id = %id, by = %requested_by, "User removed");
        Ok(())
    }

    pub async fn receipts(&self, user_id: Uuid) -> Result<Vec<String>> {
        Ok(self.require(user_id).await?.receipts)
    }

    pub(crate) async fn append_purchase(
        &self,
        user_id: Uuid,
        ticket_id: Uuid,
        receipt: String,
    ) -> Result<()> {
        self.mutate(user_id, move |user| {
            user.receipts.push(receipt);
            user.ticket_ids.push(ticket_id);
        })
        .await
    }

    pub(crate) async fn remove_purchase(
        &self,
        user_id: Uuid,
        ticket_id: Uuid,
        receipt: &str,
    ) -> Result<()> {
        self.mutate(user_id, |user| {
            if let Some(index) = user.receipts.iter().position(|r| r == receipt) {
                user.receipts.remove(index);
            }
            user.ticket_ids.retain(|id| *id != ticket_id);
        })
        .await
    }

    pub(crate) async fn link_card(&self, user_id: Uuid, card_id: Uuid) -> Result<()> {
        self.mutate(user_id, move |user| user.card_ids.push(card_id))
            .await
    }

    pub(crate) async fn unlink_card(&self, user_id: Uuid, card_id: Uuid) -> Result<()> {
        self.mutate(user_id, move |user| user.card_ids.retain(|id| *id != card_id))
            .await
    }

    pub async fn count(&self) -> Result<usize> {
        self.users.count().await
    }

    pub(crate) async fn clear(&self) -> Result<()> {
        self.users.delete_all().await
    }

    async fn mutate<F>(&self, user_id: Uuid, change: F) -> Result<()>
    where
        F: FnOnce(&mut User),
    {
        self.users
            .transaction(move |users| {
                let user = users
                    .iter_mut()
                    .find(|u| u.id == user_id)
                    .ok_or_else(|| BoxOfficeError::not_found("User", user_id))?;
                change(user);
                Ok(())
            })
            .await
    }
}

fn taken(field: &str, value: &str) -> BoxOfficeError {
    BoxOfficeError::UniquenessViolation(format!("{} '{}' is already registered", field, value))
}
