use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::pagination::Page;

// --- Enumerations (Mapped to Postgres enum types) ---

/// Role
///
/// The RBAC field of a user record. Every authorization decision keys off this
/// value through the access policy, never off raw strings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema,
    sqlx::Type,
)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// ComplaintStatus
///
/// Workflow position of a complaint. Values only ever move forward; the
/// permitted moves live in the lifecycle transition table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema,
    sqlx::Type,
)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "complaint_status", rename_all = "kebab-case")]
pub enum ComplaintStatus {
    #[default]
    Pending,
    InProcess,
    Resolved,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::InProcess => "in-process",
            ComplaintStatus::Resolved => "resolved",
        }
    }

    /// Position in the workflow order, used to assert monotonic progress.
    pub fn rank(&self) -> u8 {
        match self {
            ComplaintStatus::Pending => 0,
            ComplaintStatus::InProcess => 1,
            ComplaintStatus::Resolved => 2,
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ComplaintStatus::Pending),
            "in-process" => Ok(ComplaintStatus::InProcess),
            "resolved" => Ok(ComplaintStatus::Resolved),
            other => Err(format!("unknown complaint status: {other}")),
        }
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The Credential Store record. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, TS, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// NewUser
///
/// Insert payload for the Credential Store; the hash is computed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Complaint
///
/// A citizen complaint from the `complaints` table. `user_id` is the owner and is
/// written exactly once, on insert.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Complaint {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub description: String,
    pub category: String,
    // URL of the uploaded image asset, if any.
    pub image: Option<String>,
    pub status: ComplaintStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// NewComplaint
///
/// Insert payload. There is no status field: every complaint starts `pending`.
#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub user_id: Uuid,
    pub subject: String,
    pub description: String,
    pub category: String,
    pub image: Option<String>,
}

/// GovWebData
///
/// An entry in the directory of government web resources.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct GovWebData {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub address: String,
    pub website_url: String,
    pub image_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGovWebData {
    pub name: String,
    pub description: String,
    pub address: String,
    pub website_url: String,
    pub image_url: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// CreateComplaintRequest
///
/// Input payload for filing a complaint (POST /complaints). `image` is the
/// `resource_url` returned by the presigned upload flow.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateComplaintRequest {
    pub subject: String,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// UpdateComplaintRequest
///
/// Partial content update (PATCH /complaints/{id}). Absent fields stay unchanged.
/// An empty `image` explicitly clears the reference.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateComplaintRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// ComplaintFilter
///
/// Filters applied to complaint listings, on top of the ownership scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintFilter {
    /// Case-insensitive substring matched against subject, description, category and status.
    pub search: Option<String>,
    pub subject: Option<String>,
    pub category: Option<String>,
    pub status: Option<ComplaintStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateGovWebDataRequest {
    pub name: String,
    pub description: String,
    pub address: String,
    pub website_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateGovWebDataRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived upload URL (POST /upload/presigned).
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    #[schema(example = "pothole.jpg")]
    pub filename: String,
    #[schema(example = "image/jpeg")]
    pub file_type: String,
}

// --- Response Schemas (Output) ---

/// PresignedUrlResponse
///
/// `resource_url` is what the client passes back as a complaint's `image`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    pub upload_url: String,
    pub resource_key: String,
    pub resource_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, PartialEq, Eq)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct CreatedResponse {
    pub message: String,
    pub id: Uuid,
}

/// StatusUpdateResponse
///
/// Confirmation returned after a successful workflow transition.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct StatusUpdateResponse {
    pub message: String,
    pub status: ComplaintStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct TokenResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

/// UserProfile
///
/// Output schema for the authenticated user's profile (GET /users/profile).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// ComplaintList
///
/// Unpaginated listing envelope (GET /complaints without page/limit).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct ComplaintList {
    pub complains: Vec<Complaint>,
}

/// ComplaintListResponse
///
/// Body of GET /complaints: the full list, or the paginated envelope when the
/// caller passed `page` or `limit`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ComplaintListResponse {
    All(ComplaintList),
    Paged(Page<Complaint>),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct GovWebDataList {
    pub data: Vec<GovWebData>,
}
