//! Promo code issuing
//!
//! Hands out codes from the pool through a [`PromoStore`], so the rules can
//! be exercised without a database.

use tracing::{info, warn};

use crate::database::repositories::PromoRepository;
use crate::database::stores::PromoStore;
use crate::models::PromoKind;
use crate::utils::errors::Result;

/// Outcome of a welcome code request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WelcomeClaim {
    Issued(String),
    /// The user already holds a welcome code.
    AlreadyReceived,
    /// No free welcome code left.
    PoolEmpty,
}

#[derive(Debug, Clone)]
pub struct PromoService<S: PromoStore = PromoRepository> {
    store: S,
}

impl<S: PromoStore> PromoService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give `user_id` a welcome code, once per user.
    pub async fn claim_welcome(&self, user_id: i64) -> Result<WelcomeClaim> {
        if self.store.has_code_of_kind(user_id, PromoKind::Welcome).await? {
            return Ok(WelcomeClaim::AlreadyReceived);
        }

        match self.store.claim_free_code(PromoKind::Welcome, user_id).await? {
            Some(code) => {
                info!(user_id = user_id, "Welcome promo issued");
                Ok(WelcomeClaim::Issued(code))
            }
            None => {
                warn!(user_id = user_id, "Welcome promo pool is empty");
                Ok(WelcomeClaim::PoolEmpty)
            }
        }
    }

    /// Take the next free code of `kind` for `user_id`, if any.
    pub async fn issue(&self, kind: PromoKind, user_id: i64) -> Result<Option<String>> {
        let code = self.store.claim_free_code(kind, user_id).await?;
        if code.is_none() {
            warn!(kind = %kind, user_id = user_id, "Promo pool is empty");
        }
        Ok(code)
    }
}
