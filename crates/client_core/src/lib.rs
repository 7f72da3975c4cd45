use std::sync::Arc;

use futures::try_join;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{EntityKind, Uid, UserProfile, UserRecord},
    error::GENERIC_FAILURE_MESSAGE,
    protocol::{ListFilters, LookupItem},
};
use tokio::sync::broadcast;
use tracing::{info, warn};

pub mod api;
pub mod error;
pub mod forms;
pub mod list_view;
pub mod store;

pub use api::{DashboardApi, HttpDashboardApi};
pub use error::{ClientError, ClientResult};
pub use forms::{FormErrors, FormField, FormMode, UserForm};
pub use list_view::{ListPage, ListRow, ListView, SortColumn, SortDirection};
pub use store::{DeleteOutcome, EntityState, EntityStore, FetchOutcome};

/// Role hidden from the admin create form.
pub const RESERVED_ROLE: &str = "Developer";

/// Credentials and operator profile sent with every request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub profile: UserProfile,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("profile", &self.profile)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient toast shown after an operation settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    List(EntityKind),
    Create(EntityKind),
    Detail(EntityKind, Uid),
    Edit(EntityKind, Uid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    Notification(Notification),
    Navigate(Route),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateFormOptions {
    pub roles: Vec<LookupItem>,
    pub companies: Vec<LookupItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditFormState {
    pub uid: Uid,
    pub record: UserRecord,
    pub form: UserForm,
    pub roles: Vec<LookupItem>,
}

/// Entry point for a signed-in operator: owns both entity stores and the
/// event channel the views publish notifications and navigation on.
pub struct Dashboard {
    api: Arc<dyn DashboardApi>,
    session: Arc<Session>,
    admin: Arc<EntityStore>,
    anggota: Arc<EntityStore>,
    events: broadcast::Sender<DashboardEvent>,
}

impl Dashboard {
    pub fn new(api: Arc<dyn DashboardApi>, session: Session) -> Self {
        let session = Arc::new(session);
        let (events, _) = broadcast::channel(256);
        Self {
            admin: Arc::new(EntityStore::new(
                EntityKind::Admin,
                Arc::clone(&api),
                Arc::clone(&session),
            )),
            anggota: Arc::new(EntityStore::new(
                EntityKind::Anggota,
                Arc::clone(&api),
                Arc::clone(&session),
            )),
            api,
            session,
            events,
        }
    }

    pub fn api(&self) -> &Arc<dyn DashboardApi> {
        &self.api
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self, kind: EntityKind) -> Arc<EntityStore> {
        match kind {
            EntityKind::Admin => Arc::clone(&self.admin),
            EntityKind::Anggota => Arc::clone(&self.anggota),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    /// Filters a freshly mounted list starts from. Anggota lists are scoped
    /// to the operator's company.
    pub fn default_filters(&self, kind: EntityKind) -> ListFilters {
        match kind {
            EntityKind::Admin => ListFilters::default(),
            EntityKind::Anggota => {
                ListFilters::default().with_company(self.session.profile.company_id.as_str())
            }
        }
    }

    pub fn list_view(&self, kind: EntityKind) -> ListView {
        self.filtered_list_view(kind, ListFilters::default())
    }

    /// A list view whose initial filters are `overrides` layered over
    /// [`Dashboard::default_filters`].
    pub fn filtered_list_view(&self, kind: EntityKind, overrides: ListFilters) -> ListView {
        let defaults = self.default_filters(kind);
        let filters = ListFilters {
            q: overrides.q.or(defaults.q),
            role: overrides.role.or(defaults.role),
            status: overrides.status.or(defaults.status),
            company: overrides.company.or(defaults.company),
        };
        ListView::new(self.store(kind), self.events.clone(), filters)
    }

    /// Dropdown data for the create form. Anggota forms have no dropdowns.
    pub async fn create_form_options(&self, kind: EntityKind) -> ClientResult<CreateFormOptions> {
        if kind == EntityKind::Anggota {
            return Ok(CreateFormOptions::default());
        }
        let session = self.session.as_ref();
        let loaded = try_join!(
            self.api.roles_excluding(session, RESERVED_ROLE),
            self.api.companies(session, &session.profile.company_id),
        );
        match loaded {
            Ok((roles, companies)) => Ok(CreateFormOptions { roles, companies }),
            Err(err) => {
                warn!(kind = %kind, "failed to load create form options: {err}");
                Err(err)
            }
        }
    }

    /// Loads the record and role choices for the admin edit form.
    pub async fn edit_form(&self, uid: &Uid) -> ClientResult<EditFormState> {
        let session = self.session.as_ref();
        let loaded = try_join!(self.api.find_user(session, uid), self.api.roles(session));
        match loaded {
            Ok((record, roles)) => Ok(EditFormState {
                uid: uid.clone(),
                form: UserForm::from_record(&record),
                record,
                roles,
            }),
            Err(err) => {
                warn!(uid = %uid, "failed to load edit form: {err}");
                Err(err)
            }
        }
    }

    /// Validates then posts a new record. Invalid forms never reach the
    /// network; their field errors come back in [`ClientError::Validation`].
    pub async fn submit_create(&self, kind: EntityKind, form: &UserForm) -> ClientResult<()> {
        let request = form
            .create_request(kind, &self.session)
            .map_err(ClientError::Validation)?;

        let result = self.api.create_user(&self.session, kind, &request).await;
        self.settle_submission(kind, result, "Successfully Added!")
    }

    pub async fn submit_update(
        &self,
        kind: EntityKind,
        uid: &Uid,
        form: &UserForm,
    ) -> ClientResult<()> {
        if kind.update_path().is_none() {
            return Err(ClientError::Unsupported {
                kind,
                operation: "update",
            });
        }
        let request = form.update_request(uid).map_err(ClientError::Validation)?;

        let result = self.api.update_user(&self.session, kind, &request).await;
        self.settle_submission(kind, result, "Successfully Updated!")
    }

    fn settle_submission(
        &self,
        kind: EntityKind,
        result: ClientResult<()>,
        success_message: &str,
    ) -> ClientResult<()> {
        match result {
            Ok(()) => {
                info!(kind = %kind, "{success_message}");
                self.emit(DashboardEvent::Notification(Notification::success(
                    success_message,
                )));
                self.emit(DashboardEvent::Navigate(Route::List(kind)));
                Ok(())
            }
            Err(err) => {
                warn!(kind = %kind, "form submission failed: {err}");
                self.emit(DashboardEvent::Notification(Notification::error(
                    GENERIC_FAILURE_MESSAGE,
                )));
                Err(err)
            }
        }
    }

    fn emit(&self, event: DashboardEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
