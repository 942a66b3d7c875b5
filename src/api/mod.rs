//! Domain API modules served by the pipeline.
//!
//! Only the authentication calls live here: they are the ones that depend on
//! pipeline flags (`skip_unauthorized_handler`, tenant-code header).

pub mod auth;
pub mod common;

pub use auth::{AuthApi, Credentials, LoginRequest, LoginResponse, UserInfo};
pub use common::{IdsReq, LabelValue, PageQuery, PageResp};
