use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{CompanyId, EntityKind, Uid, UserRecord},
    error::ApiError,
    protocol::{
        CompanyLookupRequest, DeleteUserRequest, FindUserRequest, ListFilters, ListResponse,
        LookupItem, RoleExclusionRequest, SaveUserRequest,
    },
};
use tracing::debug;
use url::Url;

use crate::{
    error::{ClientError, ClientResult},
    Session,
};

/// Everything the dashboard asks of the remote backend.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn list_users(
        &self,
        session: &Session,
        kind: EntityKind,
        filters: &ListFilters,
    ) -> ClientResult<ListResponse>;
    async fn create_user(
        &self,
        session: &Session,
        kind: EntityKind,
        request: &SaveUserRequest,
    ) -> ClientResult<()>;
    async fn update_user(
        &self,
        session: &Session,
        kind: EntityKind,
        request: &SaveUserRequest,
    ) -> ClientResult<()>;
    async fn delete_user(&self, session: &Session, kind: EntityKind, uid: &Uid)
        -> ClientResult<()>;
    async fn find_user(&self, session: &Session, uid: &Uid) -> ClientResult<UserRecord>;
    async fn roles(&self, session: &Session) -> ClientResult<Vec<LookupItem>>;
    async fn roles_excluding(
        &self,
        session: &Session,
        role_name: &str,
    ) -> ClientResult<Vec<LookupItem>>;
    async fn states(&self, session: &Session) -> ClientResult<Vec<LookupItem>>;
    async fn statuses(&self, session: &Session) -> ClientResult<Vec<LookupItem>>;
    async fn companies(
        &self,
        session: &Session,
        company_id: &CompanyId,
    ) -> ClientResult<Vec<LookupItem>>;
}

pub struct HttpDashboardApi {
    http: Client,
    base_url: String,
}

impl HttpDashboardApi {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> ClientResult<Self> {
        let parsed = Url::parse(base_url).map_err(|source| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ClientError::ClientBuild)?;
        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        builder
            .header(ACCEPT, "application/json")
            .bearer_auth(&session.token)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        query: Option<&ListFilters>,
    ) -> ClientResult<T> {
        let mut builder = self.http.get(format!("{}{path}", self.base_url));
        if let Some(query) = query {
            builder = builder.query(query);
        }
        let res = self.send(self.authorized(builder, session), path).await?;
        decode(res, path).await
    }

    async fn post_json<B: serde::Serialize + Sync, T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let builder = self.http.post(format!("{}{path}", self.base_url)).json(body);
        let res = self.send(self.authorized(builder, session), path).await?;
        decode(res, path).await
    }

    async fn post_discarding<B: serde::Serialize + Sync>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
    ) -> ClientResult<()> {
        let builder = self.http.post(format!("{}{path}", self.base_url)).json(body);
        self.send(self.authorized(builder, session), path).await?;
        Ok(())
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> ClientResult<Response> {
        let res = builder
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                path: path.to_string(),
                source,
            })?;
        let status = res.status();
        debug!(path, status = status.as_u16(), "api response");
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        let api_error = ApiError::from_response(status.as_u16(), &body);
        Err(ClientError::Http {
            path: path.to_string(),
            status: status.as_u16(),
            message: api_error.message,
        })
    }
}

async fn decode<T: DeserializeOwned>(res: Response, path: &str) -> ClientResult<T> {
    res.json().await.map_err(|source| ClientError::Decode {
        path: path.to_string(),
        source,
    })
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn list_users(
        &self,
        session: &Session,
        kind: EntityKind,
        filters: &ListFilters,
    ) -> ClientResult<ListResponse> {
        self.get_json(session, kind.list_path(), Some(filters)).await
    }

    async fn create_user(
        &self,
        session: &Session,
        kind: EntityKind,
        request: &SaveUserRequest,
    ) -> ClientResult<()> {
        self.post_discarding(session, kind.create_path(), request)
            .await
    }

    async fn update_user(
        &self,
        session: &Session,
        kind: EntityKind,
        request: &SaveUserRequest,
    ) -> ClientResult<()> {
        let path = kind.update_path().ok_or(ClientError::Unsupported {
            kind,
            operation: "update",
        })?;
        self.post_discarding(session, path, request).await
    }

    async fn delete_user(
        &self,
        session: &Session,
        kind: EntityKind,
        uid: &Uid,
    ) -> ClientResult<()> {
        self.post_discarding(
            session,
            kind.delete_path(),
            &DeleteUserRequest { data: uid.clone() },
        )
        .await
    }

    async fn find_user(&self, session: &Session, uid: &Uid) -> ClientResult<UserRecord> {
        self.post_json(
            session,
            "/general/findUsersByUid",
            &FindUserRequest { uid: uid.clone() },
        )
        .await
    }

    async fn roles(&self, session: &Session) -> ClientResult<Vec<LookupItem>> {
        self.get_json(session, "/general/getRole", None).await
    }

    async fn roles_excluding(
        &self,
        session: &Session,
        role_name: &str,
    ) -> ClientResult<Vec<LookupItem>> {
        self.post_json(
            session,
            "/general/getRoleNoDeve",
            &RoleExclusionRequest {
                role_name: role_name.to_string(),
            },
        )
        .await
    }

    async fn states(&self, session: &Session) -> ClientResult<Vec<LookupItem>> {
        self.get_json(session, "/general/getState", None).await
    }

    async fn statuses(&self, session: &Session) -> ClientResult<Vec<LookupItem>> {
        self.get_json(session, "/general/getStatus", None).await
    }

    async fn companies(
        &self,
        session: &Session,
        company_id: &CompanyId,
    ) -> ClientResult<Vec<LookupItem>> {
        self.post_json(
            session,
            "/general/getCompany",
            &CompanyLookupRequest {
                company_id: company_id.clone(),
            },
        )
        .await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
