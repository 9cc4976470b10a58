use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Cond, Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user::{self, UserStatus};
use crate::entity::{event_attempt, event_result};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::{Pagination, escape_like, normalize_email, page_bounds};
use crate::models::user::*;
use crate::state::AppState;
use crate::utils::account::{email_taken, map_email_conflict};
use crate::utils::hash;

async fn find_student<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .filter(user::Column::IsStudent.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))
}

fn hash_new_password(password: &str) -> Result<String, AppError> {
    hash::hash_password(password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))
}

fn new_student(
    payload: CreateStudentRequest,
    password_hash: String,
    created_by: i32,
) -> user::ActiveModel {
    let now = chrono::Utc::now();
    user::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        email: Set(normalize_email(&payload.email)),
        password: Set(password_hash),
        roll_number: Set(clean_optional(payload.roll_number)),
        department: Set(clean_optional(payload.department)),
        is_admin: Set(false),
        is_student: Set(true),
        is_super: Set(false),
        status: Set(UserStatus::Active),
        created_by: Set(Some(created_by)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Students",
    operation_id = "createStudent",
    summary = "Create a student account",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(email = %payload.email))]
pub async fn create_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_student(&payload)?;

    if email_taken(&state.db, &normalize_email(&payload.email)).await? {
        return Err(AppError::EmailTaken);
    }

    let password_hash = hash_new_password(&payload.password)?;
    let model = new_student(payload, password_hash, auth_user.user_id)
        .insert(&state.db)
        .await
        .map_err(map_email_conflict)?;

    tracing::info!(student_id = model.id, "Student created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(model))))
}

#[utoipa::path(
    post,
    path = "/bulk",
    tag = "Students",
    operation_id = "bulkCreateStudents",
    summary = "Create many student accounts",
    description = "Rows are created independently. Invalid rows and duplicate emails (within the request or already registered) are reported in `failed` and do not stop the rest.",
    request_body = BulkCreateStudentsRequest,
    responses(
        (status = 200, description = "Per-row outcome", body = BulkCreateStudentsResponse),
        (status = 400, description = "Empty or oversized request (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(count = payload.students.len()))]
pub async fn bulk_create_students(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<BulkCreateStudentsRequest>,
) -> Result<Json<BulkCreateStudentsResponse>, AppError> {
    auth_user.require_admin()?;

    if payload.students.is_empty() || payload.students.len() > MAX_BULK_STUDENTS {
        return Err(AppError::Validation(format!(
            "students must contain 1-{MAX_BULK_STUDENTS} entries"
        )));
    }

    let mut created = Vec::new();
    let mut failed = Vec::new();
    let mut seen = HashSet::new();

    for (index, row) in payload.students.into_iter().enumerate() {
        let email = normalize_email(&row.email);
        let fail = |reason: String| BulkFailure {
            index,
            email: email.clone(),
            reason,
        };

        if let Err(AppError::Validation(reason)) = validate_create_student(&row) {
            failed.push(fail(reason));
            continue;
        }
        if !seen.insert(email.clone()) {
            failed.push(fail("Duplicate email in request".into()));
            continue;
        }
        if email_taken(&state.db, &email).await? {
            failed.push(fail("Email is already registered".into()));
            continue;
        }

        let password_hash = hash_new_password(&row.password)?;
        match new_student(row, password_hash, auth_user.user_id)
            .insert(&state.db)
            .await
            .map_err(map_email_conflict)
        {
            Ok(model) => created.push(UserResponse::from(model)),
            Err(AppError::EmailTaken) => failed.push(fail("Email is already registered".into())),
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        created = created.len(),
        failed = failed.len(),
        "Bulk student import finished"
    );
    Ok(Json(BulkCreateStudentsResponse { created, failed }))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Students",
    operation_id = "listStudents",
    summary = "List students",
    description = "Paginated, ordered by ID. `search` matches name or email case-insensitively.",
    params(UserListQuery),
    responses(
        (status = 200, description = "Students", body = UserListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_students(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    auth_user.require_admin()?;
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let mut select = user::Entity::find().filter(user::Column::IsStudent.eq(true));

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Cond::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(user::Column::Name)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(user::Column::Email)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }
    if let Some(ref department) = query.department {
        select = select.filter(user::Column::Department.eq(department.trim()));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let data = select
        .order_by_asc(user::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
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
    get,
    path = "/{id}",
    tag = "Students",
    operation_id = "getStudent",
    summary = "Get a student",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Student", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_admin()?;
    let model = find_student(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Students",
    operation_id = "updateStudent",
    summary = "Update a student",
    description = "PATCH semantics: only provided fields change. `rollNumber` and `department` may be set to null to clear them. `password` resets the password.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateStudentRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_admin()?;
    validate_update_student(&payload)?;

    let existing = find_student(&state.db, id).await?;
    if payload == UpdateStudentRequest::default() {
        return Ok(Json(existing.into()));
    }

    let mut active: user::ActiveModel = existing.clone().into();

    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(email) = payload.email {
        let email = normalize_email(&email);
        if email != existing.email && email_taken(&state.db, &email).await? {
            return Err(AppError::EmailTaken);
        }
        active.email = Set(email);
    }
    if let Some(roll_number) = payload.roll_number {
        active.roll_number = Set(clean_optional(roll_number));
    }
    if let Some(department) = payload.department {
        active.department = Set(clean_optional(department));
    }
    if let Some(password) = payload.password {
        active.password = Set(hash_new_password(&password)?);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await.map_err(map_email_conflict)?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/{id}/status",
    tag = "Students",
    operation_id = "setStudentStatus",
    summary = "Ban or unban a student",
    description = "Banned students cannot sign in. Tokens they already hold stop working for event access and profile endpoints.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = SetUserStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, status = ?payload.status))]
pub async fn set_student_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SetUserStatusRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_admin()?;

    let existing = find_student(&state.db, id).await?;
    if existing.status == payload.status {
        return Ok(Json(existing.into()));
    }

    let mut active: user::ActiveModel = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    tracing::info!(student_id = model.id, "Student status changed");
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Students",
    operation_id = "deleteStudent",
    summary = "Delete a student",
    description = "Also removes the student's attempts and results, so they drop off every leaderboard.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = []), ("cookie" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;

    let txn = state.db.begin().await?;
    let student = find_student(&txn, id).await?;

    event_attempt::Entity::delete_many()
        .filter(event_attempt::Column::UserId.eq(student.id))
        .exec(&txn)
        .await?;
    event_result::Entity::delete_many()
        .filter(event_result::Column::UserId.eq(student.id))
        .exec(&txn)
        .await?;
    user::Entity::delete_by_id(student.id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
