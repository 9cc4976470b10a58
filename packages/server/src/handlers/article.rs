use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::*;
use tracing::instrument;

use crate::entity::article;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::article::*;
use crate::models::shared::{Pagination, page_bounds};
use crate::state::AppState;

/// Drafts read as 404 for anyone but staff.
async fn find_visible_article<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    id: i32,
) -> Result<article::Model, AppError> {
    article::Entity::find_by_id(id)
        .one(db)
        .await?
        .filter(|a| a.published || auth_user.is_staff())
        .ok_or_else(|| AppError::NotFound("Article not found".into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Articles",
    operation_id = "createArticle",
    summary = "Write an article",
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Article created", body = ArticleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateArticleRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_article(&payload)?;

    let now = chrono::Utc::now();
    let model = article::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        content: Set(payload.content),
        published: Set(payload.published),
        author_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ArticleResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Articles",
    operation_id = "listArticles",
    summary = "List articles",
    description = "Newest first. Staff also see drafts.",
    params(ArticleListQuery),
    responses(
        (status = 200, description = "Articles", body = ArticleListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_articles(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ArticleListQuery>,
) -> Result<Json<ArticleListResponse>, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let mut select = article::Entity::find();
    if !auth_user.is_staff() {
        select = select.filter(article::Column::Published.eq(true));
    }

    let paginator = select
        .order_by_desc(article::Column::CreatedAt)
        .order_by_desc(article::Column::Id)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let data = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(ArticleResponse::from)
        .collect();

    Ok(Json(ArticleListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        },
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Articles",
    operation_id = "getArticle",
    summary = "Read an article",
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article", body = ArticleResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Article not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ArticleResponse>, AppError> {
    let model = find_visible_article(&state.db, &auth_user, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Articles",
    operation_id = "updateArticle",
    summary = "Edit an article",
    params(("id" = i32, Path, description = "Article ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Article updated", body = ArticleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Article not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateArticleRequest>,
) -> Result<Json<ArticleResponse>, AppError> {
    auth_user.require_admin()?;
    validate_update_article(&payload)?;

    let existing = find_visible_article(&state.db, &auth_user, id).await?;
    if payload == UpdateArticleRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: article::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    if let Some(published) = payload.published {
        active.published = Set(published);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Articles",
    operation_id = "deleteArticle",
    summary = "Delete an article",
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 204, description = "Article deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Article not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;
    let result = article::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Article not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
