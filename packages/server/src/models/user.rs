use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, double_option, validate_email, validate_name, validate_password};
use crate::entity::user::{self, UserStatus};
use crate::error::AppError;

/// A user account as returned by the API. Never includes the password hash.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "CS-042")]
    pub roll_number: Option<String>,
    #[schema(example = "CSE")]
    pub department: Option<String>,
    pub is_admin: bool,
    pub is_student: bool,
    pub is_super: bool,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            roll_number: m.roll_number,
            department: m.department,
            is_admin: m.is_admin,
            is_student: m.is_student,
            is_super: m.is_super,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    /// Page number (1-based). Default: 1.
    pub page: Option<u64>,
    /// Items per page (1-100). Default: 20.
    pub per_page: Option<u64>,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    /// Exact department filter.
    pub department: Option<String>,
}

/// Request body for creating a student account.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Initial password (8-128 characters).
    pub password: String,
    #[schema(example = "CS-042")]
    pub roll_number: Option<String>,
    #[schema(example = "CSE")]
    pub department: Option<String>,
}

pub fn validate_create_student(payload: &CreateStudentRequest) -> Result<(), AppError> {
    validate_name(&payload.name)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;
    Ok(())
}

/// Maximum number of accounts accepted in one bulk request.
pub const MAX_BULK_STUDENTS: usize = 500;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct BulkCreateStudentsRequest {
    pub students: Vec<CreateStudentRequest>,
}

/// Why one row of a bulk import was skipped.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BulkFailure {
    /// Position of the row in the request.
    pub index: usize,
    pub email: String,
    pub reason: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BulkCreateStudentsResponse {
    pub created: Vec<UserResponse>,
    pub failed: Vec<BulkFailure>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Absent leaves it unchanged; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub roll_number: Option<Option<String>>,
    /// Absent leaves it unchanged; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub department: Option<Option<String>>,
    /// Reset the password.
    pub password: Option<String>,
}

pub fn validate_update_student(payload: &UpdateStudentRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_name(name)?;
    }
    if let Some(ref email) = payload.email {
        validate_email(email)?;
    }
    if let Some(ref password) = payload.password {
        validate_password(password)?;
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetUserStatusRequest {
    pub status: UserStatus,
}

/// Request body for creating an admin account.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAdminRequest {
    #[schema(example = "Grace Hopper")]
    pub name: String,
    #[schema(example = "grace@example.com")]
    pub email: String,
    pub password: String,
    pub department: Option<String>,
}

pub fn validate_create_admin(payload: &CreateAdminRequest) -> Result<(), AppError> {
    validate_name(&payload.name)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;
    Ok(())
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateAdminRequest {
    pub name: Option<String>,
    /// Absent leaves it unchanged; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub department: Option<Option<String>>,
    pub password: Option<String>,
}

pub fn validate_update_admin(payload: &UpdateAdminRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_name(name)?;
    }
    if let Some(ref password) = payload.password {
        validate_password(password)?;
    }
    Ok(())
}

/// Trim an optional free-text field, turning blank input into `None`.
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
