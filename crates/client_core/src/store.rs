//! Per-entity collection cache: fetch, replace wholesale, re-fetch after delete.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde_json::Value;
use shared::{
    domain::{EntityKind, Uid, UserRecord},
    protocol::{empty_params, ListFilters, ListResponse},
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{api::DashboardApi, error::ClientResult, Session};

/// Last server answer for one entity collection.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    pub data: Vec<UserRecord>,
    pub total: u64,
    pub params: Value,
    pub all_data: Vec<UserRecord>,
}

impl Default for EntityState {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            total: 1,
            params: empty_params(),
            all_data: Vec::new(),
        }
    }
}

impl From<ListResponse> for EntityState {
    fn from(value: ListResponse) -> Self {
        Self {
            data: value.data,
            total: value.total,
            params: value.params,
            all_data: value.all_data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { ticket: u64, total: u64 },
    /// A newer fetch already landed; this response was dropped.
    Stale { ticket: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// `None` when the follow-up fetch itself failed.
    pub refresh: Option<FetchOutcome>,
}

struct StoreInner {
    state: EntityState,
    applied_ticket: u64,
    last_filters: ListFilters,
    filters_ticket: u64,
}

pub struct EntityStore {
    kind: EntityKind,
    api: Arc<dyn DashboardApi>,
    session: Arc<Session>,
    next_ticket: AtomicU64,
    inner: RwLock<StoreInner>,
}

impl EntityStore {
    pub fn new(kind: EntityKind, api: Arc<dyn DashboardApi>, session: Arc<Session>) -> Self {
        Self {
            kind,
            api,
            session,
            next_ticket: AtomicU64::new(1),
            inner: RwLock::new(StoreInner {
                state: EntityState::default(),
                applied_ticket: 0,
                last_filters: ListFilters::default(),
                filters_ticket: 0,
            }),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub async fn snapshot(&self) -> EntityState {
        self.inner.read().await.state.clone()
    }

    pub async fn last_filters(&self) -> ListFilters {
        self.inner.read().await.last_filters.clone()
    }

    /// Loads the collection matching `filters`.
    ///
    /// Each call takes a ticket; a response only replaces the stored state
    /// when no later-issued fetch has been applied already. Failures leave
    /// the state as it was.
    pub async fn fetch_data(&self, filters: ListFilters) -> ClientResult<FetchOutcome> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        {
            let mut inner = self.inner.write().await;
            if ticket > inner.filters_ticket {
                inner.last_filters = filters.clone();
                inner.filters_ticket = ticket;
            }
        }

        let response = match self
            .api
            .list_users(&self.session, self.kind, &filters)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(kind = %self.kind, ticket, "fetch failed: {err}");
                return Err(err);
            }
        };

        let mut inner = self.inner.write().await;
        if ticket <= inner.applied_ticket {
            debug!(
                kind = %self.kind,
                ticket,
                applied = inner.applied_ticket,
                "dropping stale list response"
            );
            return Ok(FetchOutcome::Stale { ticket });
        }
        inner.applied_ticket = ticket;
        inner.state = EntityState::from(response);
        let total = inner.state.total;
        debug!(kind = %self.kind, ticket, total, rows = inner.state.data.len(), "list applied");
        Ok(FetchOutcome::Applied { ticket, total })
    }

    /// Deletes `uid`, then re-fetches once with this store's last filters.
    pub async fn delete_user(&self, uid: &Uid) -> ClientResult<DeleteOutcome> {
        if let Err(err) = self.api.delete_user(&self.session, self.kind, uid).await {
            warn!(kind = %self.kind, uid = %uid, "delete failed: {err}");
            return Err(err);
        }
        info!(kind = %self.kind, uid = %uid, "user deleted");

        let filters = self.last_filters().await;
        let refresh = match self.fetch_data(filters).await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!(kind = %self.kind, "refresh after delete failed: {err}");
                None
            }
        };
        Ok(DeleteOutcome { refresh })
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
