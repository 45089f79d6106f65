//! Account records and the persistence collaborator.
//!
//! The pipeline and handlers treat persistence as an opaque service behind
//! [`AccountStore`]. The starter ships [`MemoryAccountStore`]; a deployment
//! swaps in a database-backed implementation without touching handlers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use palisade_middleware::BoxFuture;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use palisade_core::HttpError;

/// An account record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    /// Stable identifier; equals the auth subject for this account.
    pub id: Uuid,
    /// Unique email address.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// The identifier assigned by the identity service.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Display name.
    pub full_name: String,
}

/// Partial update to an account.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    /// New email, if changing.
    pub email: Option<String>,
    /// New display name, if changing.
    pub full_name: Option<String>,
}

/// Persistence faults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No account with the given id.
    #[error("account not found")]
    NotFound,
    /// An account with the email already exists.
    #[error("an account with this email already exists")]
    DuplicateEmail,
}

impl StoreError {
    /// Maps this fault to the wire-level error.
    #[must_use]
    pub fn to_http_error(&self) -> HttpError {
        match self {
            Self::NotFound => HttpError::not_found("Account"),
            Self::DuplicateEmail => {
                HttpError::conflict("An account with this email already exists")
            }
        }
    }
}

/// The opaque persistence collaborator.
pub trait AccountStore: Send + Sync + 'static {
    /// Creates an account.
    fn create(&self, new: NewAccount) -> BoxFuture<'_, Result<Account, StoreError>>;

    /// Fetches an account by id.
    fn get(&self, id: Uuid) -> BoxFuture<'_, Result<Account, StoreError>>;

    /// Lists all accounts.
    fn list(&self) -> BoxFuture<'_, Vec<Account>>;

    /// Applies a partial update.
    fn update(&self, id: Uuid, update: AccountUpdate)
        -> BoxFuture<'_, Result<Account, StoreError>>;

    /// Deletes an account, returning its id.
    fn delete(&self, id: Uuid) -> BoxFuture<'_, Result<Uuid, StoreError>>;
}

/// In-memory store for the starter and for tests.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl MemoryAccountStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn email_taken(accounts: &HashMap<Uuid, Account>, email: &str, except: Option<Uuid>) -> bool {
        accounts
            .values()
            .any(|a| a.email == email && Some(a.id) != except)
    }
}

impl AccountStore for MemoryAccountStore {
    fn create(&self, new: NewAccount) -> BoxFuture<'_, Result<Account, StoreError>> {
        Box::pin(async move {
            let mut accounts = self.accounts.write();
            if Self::email_taken(&accounts, &new.email, None) {
                return Err(StoreError::DuplicateEmail);
            }

            let now = Utc::now();
            let account = Account {
                id: new.id,
                email: new.email,
                full_name: new.full_name,
                created_at: now,
                updated_at: now,
            };
            accounts.insert(account.id, account.clone());
            tracing::debug!(account_id = %account.id, "created account");
            Ok(account)
        })
    }

    fn get(&self, id: Uuid) -> BoxFuture<'_, Result<Account, StoreError>> {
        Box::pin(async move {
            self.accounts
                .read()
                .get(&id)
                .cloned()
                .ok_or(StoreError::NotFound)
        })
    }

    fn list(&self) -> BoxFuture<'_, Vec<Account>> {
        Box::pin(async move {
            let mut accounts: Vec<Account> = self.accounts.read().values().cloned().collect();
            accounts.sort_by_key(|a| a.created_at);
            accounts
        })
    }

    fn update(
        &self,
        id: Uuid,
        update: AccountUpdate,
    ) -> BoxFuture<'_, Result<Account, StoreError>> {
        Box::pin(async move {
            let mut accounts = self.accounts.write();

            if let Some(email) = &update.email {
                if Self::email_taken(&accounts, email, Some(id)) {
                    return Err(StoreError::DuplicateEmail);
                }
            }

            let account = accounts.get_mut(&id).ok_or(StoreError::NotFound)?;
            if let Some(email) = update.email {
                account.email = email;
            }
            if let Some(full_name) = update.full_name {
                account.full_name = full_name;
            }
            account.updated_at = Utc::now();
            tracing::info!(account_id = %id, "updated account");
            Ok(account.clone())
        })
    }

    fn delete(&self, id: Uuid) -> BoxFuture<'_, Result<Uuid, StoreError>> {
        Box::pin(async move {
            let removed = self.accounts.write().remove(&id);
            match removed {
                Some(_) => {
                    tracing::info!(account_id = %id, "deleted account");
                    Ok(id)
                }
                None => Err(StoreError::NotFound),
            }
        })
    }
}
