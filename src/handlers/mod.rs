//! Resource handlers, one module per entity.

use serde::Deserialize;
use uuid::Uuid;

use crate::models::{PostFilter, PostStatus, UserFilter};

pub mod auth;
pub mod categories;
pub mod comments;
pub mod contact;
pub mod media;
pub mod pages;
pub mod posts;
pub mod stats;
pub mod users;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// ListParams
///
/// Query parameters accepted by every list endpoint
/// (`?page=&limit=&search=&status=&categoryId=`).
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// 1-based page number.
    pub page: Option<i64>,
    /// Page size, clamped to 1..=100.
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub status: Option<PostStatus>,
    pub category_id: Option<Uuid>,
}

impl ListParams {
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn post_filter(&self) -> PostFilter {
        PostFilter {
            page: self.page(),
            limit: self.limit(),
            search: self.search.clone(),
            status: self.status,
            category_id: self.category_id,
        }
    }

    pub fn user_filter(&self) -> UserFilter {
        UserFilter {
            page: self.page(),
            limit: self.limit(),
            search: self.search.clone(),
        }
    }
}
