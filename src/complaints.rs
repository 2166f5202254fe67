//! Complaint operations: filing, retrieval, listing, content edits, status
//! advancement and deletion, each gated by the access policy.

use url::Url;
use uuid::Uuid;

use crate::{
    AppState,
    access::{self, Action},
    auth::AuthUser,
    error::AppError,
    lifecycle::{self, Transition},
    models::{
        Complaint, ComplaintFilter, CreateComplaintRequest, NewComplaint, UpdateComplaintRequest,
    },
    notifier::Notifier,
    pagination::{Page, PageRequest},
    repository::Repository,
    storage::StorageService,
};

/// Result of a successful `advance_status`.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub complaint: Complaint,
    pub message: String,
}

/// Listing result: everything that matched, or one page of it.
#[derive(Debug, Clone)]
pub enum ComplaintListing {
    All(Vec<Complaint>),
    Paged(Page<Complaint>),
}

/// ComplaintService
///
/// Borrows the three collaborators it coordinates for the duration of one request.
pub struct ComplaintService<'a> {
    repo: &'a dyn Repository,
    storage: &'a dyn StorageService,
    notifier: &'a dyn Notifier,
}

impl<'a> ComplaintService<'a> {
    pub fn new(
        repo: &'a dyn Repository,
        storage: &'a dyn StorageService,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            repo,
            storage,
            notifier,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(
            state.repo.as_ref(),
            state.storage.as_ref(),
            state.notifier.as_ref(),
        )
    }

    async fn load(&self, id: Uuid) -> Result<Complaint, AppError> {
        self.repo
            .get_complaint(id)
            .await?
            .ok_or_else(|| AppError::not_found("Complaint not found"))
    }

    async fn store(&self, complaint: &Complaint) -> Result<Complaint, AppError> {
        self.repo
            .save_complaint(complaint)
            .await?
            .ok_or_else(|| AppError::not_found("Complaint not found"))
    }

    /// Releases an image asset; failures are logged and never propagated.
    async fn release_asset(&self, url: &str) {
        if let Err(e) = self.storage.release(url).await {
            tracing::warn!(%url, error = %e, "failed to release complaint image");
        }
    }

    /// file
    ///
    /// Records a new complaint owned by `requester`, in `pending` state.
    pub async fn file(
        &self,
        requester: &AuthUser,
        request: CreateComplaintRequest,
    ) -> Result<Complaint, AppError> {
        let new = NewComplaint {
            user_id: requester.id,
            subject: required_text("subject", &request.subject)?,
            description: required_text("description", &request.description)?,
            category: required_text("category", &request.category)?,
            image: optional_image(request.image.as_deref())?,
        };

        let complaint = self.repo.insert_complaint(new).await?;
        tracing::info!(complaint = %complaint.id, owner = %requester.id, "complaint filed");
        Ok(complaint)
    }

    pub async fn get_by_id(&self, id: Uuid, requester: &AuthUser) -> Result<Complaint, AppError> {
        let complaint = self.load(id).await?;
        access::authorize(requester, Action::View, Some(complaint.user_id))?;
        Ok(complaint)
    }

    /// list
    ///
    /// Administrators see every match; everyone else only their own complaints.
    pub async fn list(
        &self,
        requester: &AuthUser,
        filter: &ComplaintFilter,
        page: Option<PageRequest>,
    ) -> Result<ComplaintListing, AppError> {
        let owner = (!access::permits(requester, Action::View, None)).then_some(requester.id);
        let (rows, total) = self.repo.list_complaints(owner, filter, page).await?;

        Ok(match page {
            None => ComplaintListing::All(rows),
            Some(page) => ComplaintListing::Paged(Page::new(page, total, rows)),
        })
    }

    /// update_content
    ///
    /// Owner-only partial update of subject, description, category and image.
    /// Owner and status are never touched. A replaced or cleared image is
    /// released before the new reference is saved.
    pub async fn update_content(
        &self,
        id: Uuid,
        requester: &AuthUser,
        fields: UpdateComplaintRequest,
    ) -> Result<Complaint, AppError> {
        let mut complaint = self.load(id).await?;
        access::authorize(requester, Action::EditContent, Some(complaint.user_id))?;

        // Validate everything before any side effect.
        let image = match fields.image.as_deref() {
            None => None,
            Some(raw) => Some(optional_image(Some(raw))?),
        };

        if let Some(subject) = provided(fields.subject) {
            complaint.subject = subject;
        }
        if let Some(description) = provided(fields.description) {
            complaint.description = description;
        }
        if let Some(category) = provided(fields.category) {
            complaint.category = category;
        }

        if let Some(replacement) = image {
            if replacement != complaint.image {
                if let Some(previous) = complaint.image.take() {
                    self.release_asset(&previous).await;
                }
                complaint.image = replacement;
            }
        }

        let saved = self.store(&complaint).await?;
        tracing::info!(complaint = %saved.id, "complaint content updated");
        Ok(saved)
    }

    /// advance_status
    ///
    /// Moves the complaint one step along the workflow and notifies the owner.
    /// Only administrators may advance; for them a terminal complaint is
    /// rejected with `InvalidTransition`. The new status is persisted before the
    /// notification is attempted, and a failed notification does not undo it.
    pub async fn advance_status(
        &self,
        id: Uuid,
        requester: &AuthUser,
    ) -> Result<StatusChange, AppError> {
        let mut complaint = self.load(id).await?;
        access::authorize(requester, Action::ChangeStatus, None)?;

        let transition = lifecycle::next_transition(complaint.status)
            .ok_or(AppError::InvalidTransition(complaint.status))?;

        complaint.status = transition.to;
        let saved = self.store(&complaint).await?;
        tracing::info!(
            complaint = %saved.id,
            from = %transition.from,
            to = %transition.to,
            "complaint status advanced"
        );

        self.notify_owner(transition, &saved).await;

        Ok(StatusChange {
            message: transition.confirmation(),
            complaint: saved,
        })
    }

    async fn notify_owner(&self, transition: &Transition, complaint: &Complaint) {
        let body = transition.render_body(complaint);
        if let Err(e) = self
            .notifier
            .send(complaint.user_id, transition.notice.subject, &body)
            .await
        {
            tracing::warn!(complaint = %complaint.id, error = %e, "status notification failed");
        }
    }

    /// delete
    ///
    /// Owners delete their own complaints, administrators any. The image is
    /// released once the record is gone.
    pub async fn delete(&self, id: Uuid, requester: &AuthUser) -> Result<(), AppError> {
        let complaint = self.load(id).await?;
        access::authorize(requester, Action::Delete, Some(complaint.user_id))?;

        if !self.repo.delete_complaint(id).await? {
            return Err(AppError::not_found("Complaint not found"));
        }
        tracing::info!(complaint = %id, by = %requester.id, "complaint deleted");

        if let Some(image) = complaint.image.as_deref() {
            self.release_asset(image).await;
        }
        Ok(())
    }
}

fn required_text(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Blank strings count as "not provided".
fn provided(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalizes an image reference: blank means none, anything else must be an
/// absolute http(s) URL.
fn optional_image(raw: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(Some(raw.to_string()))
        }
        _ => Err(AppError::validation("image must be an http(s) URL")),
    }
}
