use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user::{self, UserStatus};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::{Pagination, normalize_email, page_bounds};
use crate::models::user::*;
use crate::state::AppState;
use crate::utils::account::{email_taken, map_email_conflict};
use crate::utils::hash;

async fn find_admin<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .filter(user::Column::IsAdmin.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin not found".into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Admins",
    operation_id = "createAdmin",
    summary = "Create an admin account",
    request_body = CreateAdminRequest,
    responses(
        (status = 201, description = "Admin created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a super-admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(email = %payload.email))]
pub async fn create_admin(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAdminRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_super()?;
    validate_create_admin(&payload)?;

    let email = normalize_email(&payload.email);
    if email_taken(&state.db, &email).await? {
        return Err(AppError::EmailTaken);
    }

    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let now = chrono::Utc::now();
    let model = user::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        password: Set(password_hash),
        roll_number: Set(None),
        department: Set(clean_optional(payload.department)),
        is_admin: Set(true),
        is_student: Set(false),
        is_super: Set(false),
        status: Set(UserStatus::Active),
        created_by: Set(Some(auth_user.user_id)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(map_email_conflict)?;

    tracing::info!(admin_id = model.id, "Admin created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Admins",
    operation_id = "listAdmins",
    summary = "List admins",
    params(UserListQuery),
    responses(
        (status = 200, description = "Admins", body = UserListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a super-admin (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_admins(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    auth_user.require_super()?;
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let mut select = user::Entity::find().filter(user::Column::IsAdmin.eq(true));
    if let Some(ref department) = query.department {
        select = select.filter(user::Column::Department.eq(department.trim()));
    }

    let paginator = select
        .order_by_asc(user::Column::Id)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let data = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(UserListResponse {
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
    patch,
    path = "/{id}",
    tag = "Admins",
    operation_id = "updateAdmin",
    summary = "Update an admin",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateAdminRequest,
    responses(
        (status = 200, description = "Admin updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a super-admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Admin not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_admin(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateAdminRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_super()?;
    validate_update_admin(&payload)?;

    let existing = find_admin(&state.db, id).await?;
    if payload == UpdateAdminRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: user::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(department) = payload.department {
        active.department = Set(clean_optional(department));
    }
    if let Some(password) = payload.password {
        let hashed = hash::hash_password(&password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
        active.password = Set(hashed);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Admins",
    operation_id = "deleteAdmin",
    summary = "Delete an admin",
    description = "A super-admin cannot delete their own account.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "Admin deleted"),
        (status = 400, description = "Attempt to delete yourself (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a super-admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Admin not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_admin(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_super()?;
    if id == auth_user.user_id {
        return Err(AppError::Validation("You cannot delete your own account".into()));
    }

    let admin = find_admin(&state.db, id).await?;
    user::Entity::delete_by_id(admin.id).exec(&state.db).await?;

    tracing::info!(admin_id = admin.id, "Admin deleted");
    Ok(StatusCode::NO_CONTENT)
}
