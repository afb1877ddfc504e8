use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicI64, Ordering};

pub struct MemoryUserRepo {
    users: DashMap<UserId, UserCredentialsRecord>,
    by_username: DashMap<String, UserId>,
    next_id: AtomicI64,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        MemoryUserRepo {
            users: DashMap::new(),
            by_username: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryUserRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        created_at: DateTime<Utc>,
    ) -> Result<UserSummary, RepoError> {
        // the username entry stays locked until the id is claimed
        let user_id = match self.by_username.entry(username.to_string()) {
            Entry::Occupied(_) => return Err(RepoError::Duplicate),
            Entry::Vacant(slot) => {
                let user_id = UserId(self.next_id.fetch_add(1, Ordering::SeqCst));
                slot.insert(user_id);
                user_id
            }
        };

        self.users.insert(
            user_id,
            UserCredentialsRecord {
                user_id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at,
            },
        );

        Ok(UserSummary {
            id: user_id,
            username: username.to_string(),
        })
    }

    async fn find_credentials_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentialsRecord>, RepoError> {
        let Some(user_id) = self.by_username.get(username).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&user_id).map(|rec| rec.clone()))
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserSummary>, RepoError> {
        Ok(self.users.get(&user_id).map(|rec| UserSummary {
            id: rec.user_id,
            username: rec.username.clone(),
        }))
    }

    async fn list_except(&self, excluded: UserId) -> Result<Vec<UserSummary>, RepoError> {
        let mut users: Vec<UserSummary> = self
            .users
            .iter()
            .filter(|entry| *entry.key() != excluded)
            .map(|entry| UserSummary {
                id: entry.user_id,
                username: entry.username.clone(),
            })
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }
}
