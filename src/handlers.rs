use crate::{
    AppState,
    auth::{self, AuthUser},
    complaints::{ComplaintListing, ComplaintService},
    directory::Directory,
    error::AppError,
    extract::{JsonBody, PathParam, QueryParams},
    models::{
        Complaint, ComplaintFilter, ComplaintList, ComplaintListResponse, ComplaintStatus,
        CreateComplaintRequest, CreateGovWebDataRequest, CreatedResponse, GovWebData,
        GovWebDataList, LoginRequest, MessageResponse, NewUser, PresignedUrlRequest,
        PresignedUrlResponse, RegisterUserRequest, Role, StatusUpdateResponse, TokenResponse,
        UpdateComplaintRequest, UpdateGovWebDataRequest, UserProfile,
    },
    pagination::PageRequest,
    validation,
};
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

// --- Query Structs ---

/// ComplaintQuery
///
/// Accepted query parameters for GET /complaints. Supplying `page` or `limit`
/// switches the response to the paginated envelope.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ComplaintQuery {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size, 1 to 100 (default 10).
    pub limit: Option<u32>,
    /// Case-insensitive substring matched against subject, description, category and status.
    pub search: Option<String>,
    pub subject: Option<String>,
    pub category: Option<String>,
    /// `pending`, `in-process` or `resolved`.
    pub status: Option<String>,
}

impl ComplaintQuery {
    /// Splits the query into listing filters and an optional page window.
    /// Blank parameters are treated as absent.
    pub fn into_parts(self) -> Result<(ComplaintFilter, Option<PageRequest>), AppError> {
        let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let status = present(self.status)
            .map(|s| s.parse::<ComplaintStatus>())
            .transpose()
            .map_err(AppError::validation)?;

        let filter = ComplaintFilter {
            search: present(self.search),
            subject: present(self.subject),
            category: present(self.category),
            status,
        };
        Ok((filter, PageRequest::from_query(self.page, self.limit)))
    }
}

// --- User Handlers ---

/// register_user
///
/// [Public Route] Creates a credential record with role `user`. The password is
/// stored only as a bcrypt hash.
#[utoipa::path(
    post,
    path = "/users/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = MessageResponse),
        (status = 400, description = "Invalid input or email already taken")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterUserRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    // 1. Input Validation
    let username = validation::required("username", &payload.username)?;
    let email = validation::required("email", &payload.email)?.to_lowercase();
    if !validation::is_valid_email(&email) {
        return Err(AppError::validation("email must be a valid email address"));
    }
    validation::check_password(&payload.password)?;

    // 2. Uniqueness. Emails are stored lowercased, so the lookup is case-insensitive.
    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::validation("A user with this email already exists"));
    }

    // 3. Persistence. Self-registration never grants the administrator role.
    let password_hash = auth::hash_password(payload.password, state.config.password_hash_cost).await?;
    let user = state
        .repo
        .create_user(NewUser {
            username,
            email,
            password_hash,
            role: Role::User,
        })
        .await?;
    tracing::info!(user = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// login
///
/// [Public Route] Exchanges email and password for a bearer token. Unknown
/// emails and wrong passwords get the same answer.
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = payload.email.trim().to_lowercase();
    let user = state
        .repo
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::validation(INVALID_CREDENTIALS))?;

    if !auth::verify_password(payload.password, user.password_hash).await? {
        return Err(AppError::validation(INVALID_CREDENTIALS));
    }

    let access_token = auth::issue_token(&state.config, user.id)?;
    Ok(Json(TokenResponse { access_token }))
}

/// get_profile
///
/// [Authenticated Route] The caller's own profile, without the password hash.
#[utoipa::path(
    get,
    path = "/users/profile",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, AppError> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or(AppError::Unauthenticated)?;
    Ok(Json(UserProfile::from(user)))
}

// --- Media Pipeline ---

/// get_presigned_url
///
/// [Authenticated Route] Issues a short-lived URL for uploading one complaint
/// image straight to the Asset Store. Only JPEG and PNG are accepted; the
/// returned `resource_url` is what the client sends as the complaint `image`.
#[utoipa::path(
    post,
    path = "/upload/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 400, description = "Unsupported file type")
    )
)]
pub async fn get_presigned_url(
    _user: AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<PresignedUrlRequest>,
) -> Result<Json<PresignedUrlResponse>, AppError> {
    let extension = image_extension(&payload.filename, &payload.file_type)
        .ok_or_else(|| AppError::validation("Only JPEG and PNG images are allowed"))?;
    // A fresh key per request; client filenames never reach the bucket.
    let object_key = format!("complaints/{}.{}", Uuid::new_v4(), extension);

    let upload_url = state
        .storage
        .presign_upload(&object_key, &payload.file_type)
        .await
        .map_err(|e| AppError::Internal(format!("presign failed: {e}")))?;

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_url: state.storage.object_url(&object_key),
        resource_key: object_key,
    }))
}

/// The object key extension for an accepted image upload, if the filename and
/// declared content type agree.
fn image_extension(filename: &str, file_type: &str) -> Option<String> {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)?
        .to_ascii_lowercase();

    match (extension.as_str(), file_type.trim().to_ascii_lowercase().as_str()) {
        ("jpg" | "jpeg", "image/jpeg") | ("png", "image/png") => Some(extension),
        _ => None,
    }
}

// --- Complaint Handlers ---

/// create_complaint
///
/// [Authenticated Route] Files a complaint owned by the caller.
#[utoipa::path(
    post,
    path = "/complaints",
    request_body = CreateComplaintRequest,
    responses(
        (status = 201, description = "Created", body = CreatedResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 401, description = "Unauthenticated")
    )
)]
pub async fn create_complaint(
    user: AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateComplaintRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let complaint = ComplaintService::from_state(&state)
        .file(&user, payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Complaint created successfully".to_string(),
            id: complaint.id,
        }),
    ))
}

/// list_complaints
///
/// [Authenticated Route] Administrators see every complaint, other users their
/// own. Returns `{complains}` or, with `page`/`limit`, `{total, next, prev, data}`.
#[utoipa::path(
    get,
    path = "/complaints",
    params(ComplaintQuery),
    responses(
        (status = 200, description = "Matching complaints", body = ComplaintListResponse),
        (status = 400, description = "Unknown status filter or malformed query")
    )
)]
pub async fn list_complaints(
    user: AuthUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ComplaintQuery>,
) -> Result<Json<ComplaintListResponse>, AppError> {
    let (filter, page) = query.into_parts()?;
    let listing = ComplaintService::from_state(&state)
        .list(&user, &filter, page)
        .await?;

    Ok(Json(match listing {
        ComplaintListing::All(complains) => ComplaintListResponse::All(ComplaintList { complains }),
        ComplaintListing::Paged(page) => ComplaintListResponse::Paged(page),
    }))
}

/// get_complaint
///
/// [Authenticated Route] A single complaint, for its owner or an administrator.
#[utoipa::path(
    get,
    path = "/complaints/{id}",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Found", body = Complaint),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_complaint(
    user: AuthUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<Complaint>, AppError> {
    let complaint = ComplaintService::from_state(&state)
        .get_by_id(id, &user)
        .await?;
    Ok(Json(complaint))
}

/// update_complaint
///
/// [Authenticated Route] Owner-only edit of subject, description, category and image.
#[utoipa::path(
    patch,
    path = "/complaints/{id}",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    request_body = UpdateComplaintRequest,
    responses(
        (status = 200, description = "Updated", body = MessageResponse),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_complaint(
    user: AuthUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<UpdateComplaintRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    ComplaintService::from_state(&state)
        .update_content(id, &user, payload)
        .await?;
    Ok(Json(MessageResponse::new("Complaint updated successfully")))
}

/// update_complaint_status
///
/// [Authenticated Route, admin only] Advances the complaint one workflow step
/// and notifies its owner.
#[utoipa::path(
    patch,
    path = "/complaints/{id}/status",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Advanced", body = StatusUpdateResponse),
        (status = 403, description = "Not an administrator"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Already resolved")
    )
)]
pub async fn update_complaint_status(
    user: AuthUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    let change = ComplaintService::from_state(&state)
        .advance_status(id, &user)
        .await?;
    Ok(Json(StatusUpdateResponse {
        message: change.message,
        status: change.complaint.status,
    }))
}

/// delete_complaint
///
/// [Authenticated Route] Owners delete their own complaints, administrators any.
#[utoipa::path(
    delete,
    path = "/complaints/{id}",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_complaint(
    user: AuthUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ComplaintService::from_state(&state).delete(id, &user).await?;
    Ok(Json(MessageResponse::new("Complaint deleted successfully")))
}

// --- Government Web Directory ---

/// list_gov_web_data
///
/// [Public Route] Every directory entry, ordered by name.
#[utoipa::path(
    get,
    path = "/gov-web-data",
    responses((status = 200, description = "Directory, ordered by name", body = GovWebDataList))
)]
pub async fn list_gov_web_data(
    State(state): State<AppState>,
) -> Result<Json<GovWebDataList>, AppError> {
    let data = Directory::new(state.repo.as_ref()).list().await?;
    Ok(Json(GovWebDataList { data }))
}

/// get_gov_web_data
///
/// [Public Route] A single directory entry.
#[utoipa::path(
    get,
    path = "/gov-web-data/{id}",
    params(("id" = Uuid, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Found", body = GovWebData),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_gov_web_data(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<GovWebData>, AppError> {
    Ok(Json(Directory::new(state.repo.as_ref()).get(id).await?))
}

/// add_gov_web_data
///
/// [Admin Route] Adds a directory entry. Website URLs are unique.
#[utoipa::path(
    post,
    path = "/admin/gov-web-data",
    request_body = CreateGovWebDataRequest,
    responses(
        (status = 201, description = "Created", body = CreatedResponse),
        (status = 400, description = "Invalid input or duplicate URL"),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn add_gov_web_data(
    user: AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateGovWebDataRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let entry = Directory::new(state.repo.as_ref())
        .add(&user, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Government web data added successfully".to_string(),
            id: entry.id,
        }),
    ))
}

/// edit_gov_web_data
///
/// [Admin Route] Partial update of a directory entry. Blank text fields are
/// left unchanged; an empty `image_url` clears the image. A new website URL is
/// normalized and must stay unique.
#[utoipa::path(
    patch,
    path = "/admin/gov-web-data/{id}",
    params(("id" = Uuid, Path, description = "Entry ID")),
    request_body = UpdateGovWebDataRequest,
    responses(
        (status = 200, description = "Updated", body = MessageResponse),
        (status = 403, description = "Not an administrator"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn edit_gov_web_data(
    user: AuthUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<UpdateGovWebDataRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    Directory::new(state.repo.as_ref())
        .edit(&user, id, payload)
        .await?;
    Ok(Json(MessageResponse::new(
        "Government web data updated successfully",
    )))
}

/// delete_gov_web_data
///
/// [Admin Route] Removes a directory entry.
#[utoipa::path(
    delete,
    path = "/admin/gov-web-data/{id}",
    params(("id" = Uuid, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not an administrator"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_gov_web_data(
    user: AuthUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    Directory::new(state.repo.as_ref())
        .remove(&user, id)
        .await?;
    Ok(Json(MessageResponse::new(
        "Government web data deleted successfully",
    )))
}
