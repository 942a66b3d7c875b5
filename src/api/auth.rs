//! Authentication endpoints.

use serde::{Deserialize, Serialize};

use crate::http::{HttpClient, HttpResult, RequestOptions};
use crate::session::{MemorySession, SessionStore};

const BASE_URL: &str = "/auth";

/// Header naming the tenant a user logs into.
pub const X_TENANT_CODE: &str = "X-Tenant-Code";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthType {
    Account,
    Phone,
    Email,
    Social,
}

/// Credentials for each login flavour.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Credentials {
    Account {
        username: String,
        password: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        captcha: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        uuid: Option<String>,
    },
    Phone {
        phone: String,
        captcha: String,
    },
    Email {
        email: String,
        captcha: String,
    },
}

impl Credentials {
    pub fn auth_type(&self) -> AuthType {
        match self {
            Credentials::Account { .. } => AuthType::Account,
            Credentials::Phone { .. } => AuthType::Phone,
            Credentials::Email { .. } => AuthType::Email,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub client_id: String,
    pub auth_type: AuthType,
    #[serde(flatten)]
    pub credentials: Credentials,
}

impl LoginRequest {
    pub fn new(client_id: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            client_id: client_id.into(),
            auth_type: credentials.auth_type(),
            credentials,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    pub user_id: u64,
    pub username: String,
    pub nickname: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub dept_id: Option<u64>,
    pub dept_name: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

/// Menu entry returned by `/auth/user/route`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteItem {
    pub id: u64,
    pub parent_id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: u8,
    pub title: String,
    pub path: Option<String>,
    pub name: Option<String>,
    pub component: Option<String>,
    pub permission: Option<String>,
    pub children: Vec<RouteItem>,
}

/// Authentication calls on top of the shared pipeline.
#[derive(Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn login(
        &self,
        req: &LoginRequest,
        tenant_code: Option<&str>,
    ) -> HttpResult<LoginResponse> {
        let mut options = RequestOptions::default();
        if let Some(code) = tenant_code.filter(|c| !c.is_empty()) {
            options = options.header(X_TENANT_CODE, code);
        }
        self.http.post(&format!("{BASE_URL}/login"), req, options).await
    }

    /// Log out on the server. Never runs the unauthorized handler, so an
    /// already-expired session cannot recurse into another logout.
    pub async fn logout(&self) -> HttpResult<()> {
        let options = RequestOptions::default().quiet().skip_unauthorized();
        self.http
            .post(&format!("{BASE_URL}/logout"), &serde_json::json!({}), options)
            .await
    }

    pub async fn user_info(&self) -> HttpResult<UserInfo> {
        self.http
            .get(&format!("{BASE_URL}/user/info"), &(), RequestOptions::default())
            .await
    }

    pub async fn user_routes(&self) -> HttpResult<Vec<RouteItem>> {
        self.http
            .get(&format!("{BASE_URL}/user/route"), &(), RequestOptions::default())
            .await
    }

    /// Log in, store the token and tenant, then fetch the user profile.
    pub async fn sign_in(
        &self,
        session: &MemorySession,
        req: &LoginRequest,
        tenant_code: Option<&str>,
    ) -> HttpResult<UserInfo> {
        let login = self.login(req, tenant_code).await?;
        session.set_token(login.token);
        session.set_tenant_id(login.tenant_id);

        let info = self.user_info().await?;
        tracing::info!(username = %info.username, "Signed in");
        Ok(info)
    }

    /// Log out on the server, ignoring its failures, then clear the session.
    pub async fn sign_out(&self, session: &dyn SessionStore) {
        if let Err(e) = self.logout().await {
            tracing::warn!(error = %e, "Logout call failed, clearing local session anyway");
        }
        self.http.pending().cancel_all();
        session.log_out();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_request_shape() {
        let req = LoginRequest::new(
            "client-1",
            Credentials::Account {
                username: "admin".into(),
                password: "secret".into(),
                captcha: None,
                uuid: None,
            },
        );
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "clientId": "client-1",
                "authType": "ACCOUNT",
                "username": "admin",
                "password": "secret"
            })
        );
    }

    #[test]
    fn test_phone_login_type() {
        let req = LoginRequest::new(
            "c",
            Credentials::Phone {
                phone: "13800000000".into(),
                captcha: "1234".into(),
            },
        );
        assert_eq!(req.auth_type, AuthType::Phone);
    }

    #[test]
    fn test_user_info_tolerates_missing_fields() {
        let info: UserInfo = serde_json::from_value(json!({
            "userId": 1,
            "username": "admin",
            "roles": ["admin"]
        }))
        .unwrap();
        assert_eq!(info.user_id, 1);
        assert!(info.permissions.is_empty());
    }
}
