//! Types shared by the paged CRUD endpoints.

use serde::{Deserialize, Serialize};

/// Paging parameters, sent as query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// e.g. `createTime,desc`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl PageQuery {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
            sort: None,
        }
    }
}

/// One page of records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct PageResp<T> {
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total: u64,
}

impl<T> PageResp<T> {
    pub fn has_more(&self) -> bool {
        u64::from(self.current) * u64::from(self.size) < self.total
    }
}

/// Option for select boxes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelValue<T> {
    pub label: String,
    pub value: T,
}

/// Body for bulk operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdsReq {
    pub ids: Vec<u64>,
}
