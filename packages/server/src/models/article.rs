use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_title};
use crate::entity::article;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateArticleRequest {
    #[schema(example = "How scoring works")]
    pub title: String,
    /// Body in Markdown.
    pub content: String,
    /// Drafts are visible to staff only. Default: false.
    #[serde(default)]
    pub published: bool,
}

pub fn validate_create_article(payload: &CreateArticleRequest) -> Result<(), AppError> {
    validate_title(&payload.title)?;
    validate_content(&payload.content)
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

pub fn validate_update_article(payload: &UpdateArticleRequest) -> Result<(), AppError> {
    if let Some(ref title) = payload.title {
        validate_title(title)?;
    }
    if let Some(ref content) = payload.content {
        validate_content(content)?;
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), AppError> {
    if content.len() > 1024 * 1024 {
        return Err(AppError::Validation(
            "Content must be at most 1 MiB".into(),
        ));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub author_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<article::Model> for ArticleResponse {
    fn from(m: article::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            content: m.content,
            published: m.published,
            author_id: m.author_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ArticleListResponse {
    pub data: Vec<ArticleResponse>,
    pub pagination: Pagination,
}
