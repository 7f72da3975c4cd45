//! Headless list screen: filters, client-side sort and paging, delete confirmation.

use std::sync::Arc;

use shared::{
    domain::{EntityKind, StatusColor, Uid, UserRecord},
    error::GENERIC_FAILURE_MESSAGE,
    protocol::ListFilters,
};
use tokio::sync::broadcast;
use tracing::info;

use crate::{
    error::{ClientError, ClientResult},
    store::{DeleteOutcome, EntityStore, FetchOutcome},
    DashboardEvent, Notification, Route,
};

pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Nik,
    FullName,
    Email,
    Role,
    PhoneNumber,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortModel {
    pub column: SortColumn,
    pub direction: SortDirection,
}

fn sort_key(record: &UserRecord, column: SortColumn) -> String {
    let value = match column {
        SortColumn::Nik => Some(record.nik.as_str()),
        SortColumn::FullName => Some(record.full_name.as_str()),
        SortColumn::Email => Some(record.email.as_str()),
        SortColumn::Role => record.role.as_deref(),
        SortColumn::PhoneNumber => record.phone_number.as_deref(),
        SortColumn::Status => record.status.as_deref(),
    };
    value.unwrap_or_default().to_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    /// 1-based position in the sorted collection.
    pub no: usize,
    pub record: UserRecord,
    pub status_color: Option<StatusColor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    pub rows: Vec<ListRow>,
    pub page: usize,
    pub page_size: usize,
    pub row_count: usize,
    pub page_count: usize,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    pub uid: Uid,
    pub title: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Copy)]
enum FilterField {
    Query,
    Role,
    Status,
    Company,
}

fn filter_slot(filters: &mut ListFilters, field: FilterField) -> &mut Option<String> {
    match field {
        FilterField::Query => &mut filters.q,
        FilterField::Role => &mut filters.role,
        FilterField::Status => &mut filters.status,
        FilterField::Company => &mut filters.company,
    }
}

fn normalize(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Admin rows colour their chip by `state`, anggota rows by `status`.
fn chip_value(kind: EntityKind, record: &UserRecord) -> Option<&str> {
    match kind {
        EntityKind::Admin => record.state.as_deref(),
        EntityKind::Anggota => record.status.as_deref(),
    }
}

pub struct ListView {
    store: Arc<EntityStore>,
    events: broadcast::Sender<DashboardEvent>,
    filters: ListFilters,
    page: usize,
    page_size: usize,
    sort: Option<SortModel>,
    loading: bool,
    pending_delete: Option<DeleteConfirmation>,
}

impl ListView {
    pub fn new(
        store: Arc<EntityStore>,
        events: broadcast::Sender<DashboardEvent>,
        filters: ListFilters,
    ) -> Self {
        Self {
            store,
            events,
            filters,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            sort: None,
            loading: false,
            pending_delete: None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.store.kind()
    }

    pub fn filters(&self) -> &ListFilters {
        &self.filters
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn sort(&self) -> Option<SortModel> {
        self.sort
    }

    pub fn pending_delete(&self) -> Option<&DeleteConfirmation> {
        self.pending_delete.as_ref()
    }

    pub async fn mount(&mut self) -> ClientResult<FetchOutcome> {
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> ClientResult<FetchOutcome> {
        self.loading = true;
        let result = self.store.fetch_data(self.filters.clone()).await;
        self.loading = false;
        if result.is_err() {
            self.notify(Notification::error(GENERIC_FAILURE_MESSAGE));
        }
        result
    }

    pub async fn set_query(&mut self, q: &str) -> ClientResult<Option<FetchOutcome>> {
        self.apply_filter(FilterField::Query, normalize(q)).await
    }

    pub async fn set_role(&mut self, role: &str) -> ClientResult<Option<FetchOutcome>> {
        self.apply_filter(FilterField::Role, normalize(role)).await
    }

    pub async fn set_status(&mut self, status: &str) -> ClientResult<Option<FetchOutcome>> {
        self.apply_filter(FilterField::Status, normalize(status)).await
    }

    pub async fn set_company(&mut self, company: &str) -> ClientResult<Option<FetchOutcome>> {
        self.apply_filter(FilterField::Company, normalize(company)).await
    }

    /// Fetches only when the filter value actually changed.
    async fn apply_filter(
        &mut self,
        field: FilterField,
        next: Option<String>,
    ) -> ClientResult<Option<FetchOutcome>> {
        let current = filter_slot(&mut self.filters, field);
        if *current == next {
            return Ok(None);
        }
        *current = next;
        self.page = 0;
        self.refresh().await.map(Some)
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Returns `false` and keeps the current size for unsupported values.
    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        if !PAGE_SIZE_OPTIONS.contains(&page_size) {
            return false;
        }
        self.page_size = page_size;
        self.page = 0;
        true
    }

    /// Sorting the same column again flips the direction.
    pub fn sort_by(&mut self, column: SortColumn) {
        self.sort = Some(match self.sort {
            Some(current) if current.column == column => SortModel {
                column,
                direction: match current.direction {
                    SortDirection::Ascending => SortDirection::Descending,
                    SortDirection::Descending => SortDirection::Ascending,
                },
            },
            _ => SortModel {
                column,
                direction: SortDirection::Ascending,
            },
        });
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    pub async fn rows(&self) -> ListPage {
        let state = self.store.snapshot().await;
        let mut records = state.data;
        if let Some(sort) = self.sort {
            records.sort_by(|a, b| {
                let ordering = sort_key(a, sort.column).cmp(&sort_key(b, sort.column));
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        let kind = self.kind();
        let row_count = records.len();
        let page_count = row_count.div_ceil(self.page_size).max(1);
        let page = self.page.min(page_count - 1);
        let rows = records
            .into_iter()
            .enumerate()
            .skip(page * self.page_size)
            .take(self.page_size)
            .map(|(idx, record)| ListRow {
                no: idx + 1,
                status_color: chip_value(kind, &record).map(StatusColor::for_status),
                record,
            })
            .collect();

        ListPage {
            rows,
            page,
            page_size: self.page_size,
            row_count,
            page_count,
            total: state.total,
        }
    }

    /// Target of the list's "Add" button.
    pub fn create_route(&self) -> Route {
        Route::Create(self.kind())
    }

    pub fn view_route(&self, uid: &Uid) -> Route {
        Route::Detail(self.kind(), uid.clone())
    }

    pub fn edit_route(&self, uid: &Uid) -> Route {
        Route::Edit(self.kind(), uid.clone())
    }

    /// First step of a delete. Nothing is sent until [`Self::confirm_delete`].
    pub fn request_delete(&mut self, uid: Uid) -> DeleteConfirmation {
        let confirmation = DeleteConfirmation {
            uid,
            title: "Are you sure?",
            text: "You won't be able to revert this!",
        };
        self.pending_delete = Some(confirmation.clone());
        confirmation
    }

    pub fn cancel_delete(&mut self) -> Option<DeleteConfirmation> {
        self.pending_delete.take()
    }

    pub async fn confirm_delete(&mut self) -> ClientResult<DeleteOutcome> {
        let pending = self
            .pending_delete
            .take()
            .ok_or(ClientError::NoPendingDelete)?;

        self.loading = true;
        let result = self.store.delete_user(&pending.uid).await;
        self.loading = false;
        match &result {
            Ok(_) => {
                info!(kind = %self.kind(), uid = %pending.uid, "delete confirmed");
                self.notify(Notification::success("Deleted!"));
            }
            Err(_) => self.notify(Notification::error(GENERIC_FAILURE_MESSAGE)),
        }
        result
    }

    fn notify(&self, notification: Notification) {
        let _ = self.events.send(DashboardEvent::Notification(notification));
    }
}

#[cfg(test)]
#[path = "tests/list_view_tests.rs"]
mod tests;
