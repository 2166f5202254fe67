//! Government web directory: a public listing of official web resources,
//! curated by administrators.

use uuid::Uuid;

use crate::{
    access::{self, Action},
    auth::AuthUser,
    error::AppError,
    models::{CreateGovWebDataRequest, GovWebData, NewGovWebData, UpdateGovWebDataRequest},
    repository::Repository,
    validation::{normalize_web_url, required},
};

const DUPLICATE_URL: &str = "A government web entry with this website URL already exists";

pub struct Directory<'a> {
    repo: &'a dyn Repository,
}

impl<'a> Directory<'a> {
    pub fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<GovWebData>, AppError> {
        Ok(self.repo.list_gov_web_data().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<GovWebData, AppError> {
        self.repo
            .get_gov_web_data(id)
            .await?
            .ok_or_else(|| AppError::not_found("Government web data not found"))
    }

    /// Rejects a website URL already used by another entry.
    async fn ensure_unique_url(
        &self,
        website_url: &str,
        except: Option<Uuid>,
    ) -> Result<(), AppError> {
        match self.repo.find_gov_web_data_by_url(website_url).await? {
            Some(existing) if Some(existing.id) != except => {
                Err(AppError::validation(DUPLICATE_URL))
            }
            _ => Ok(()),
        }
    }

    pub async fn add(
        &self,
        requester: &AuthUser,
        request: CreateGovWebDataRequest,
    ) -> Result<GovWebData, AppError> {
        access::authorize(requester, Action::ManageDirectory, None)?;

        let website_url = required("website_url", &request.website_url)?;
        let website_url = normalize_web_url("website_url", &website_url)?;
        let image_url = match request.image_url.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(normalize_web_url("image_url", raw)?),
            _ => None,
        };
        let new = NewGovWebData {
            name: required("name", &request.name)?,
            description: required("description", &request.description)?,
            address: required("address", &request.address)?,
            website_url,
            image_url,
        };

        self.ensure_unique_url(&new.website_url, None).await?;

        let created = self.repo.insert_gov_web_data(new).await?;
        tracing::info!(entry = %created.id, url = %created.website_url, "directory entry added");
        Ok(created)
    }

    /// Partial update. Blank text fields are ignored; an empty `image_url`
    /// clears the image.
    pub async fn edit(
        &self,
        requester: &AuthUser,
        id: Uuid,
        request: UpdateGovWebDataRequest,
    ) -> Result<GovWebData, AppError> {
        access::authorize(requester, Action::ManageDirectory, None)?;
        let mut entry = self.get(id).await?;

        if let Some(name) = non_blank(request.name) {
            entry.name = name;
        }
        if let Some(description) = non_blank(request.description) {
            entry.description = description;
        }
        if let Some(address) = non_blank(request.address) {
            entry.address = address;
        }
        if let Some(raw) = non_blank(request.website_url) {
            let website_url = normalize_web_url("website_url", &raw)?;
            self.ensure_unique_url(&website_url, Some(entry.id)).await?;
            entry.website_url = website_url;
        }
        if let Some(raw) = request.image_url {
            entry.image_url = match raw.trim() {
                "" => None,
                url => Some(normalize_web_url("image_url", url)?),
            };
        }

        let saved = self
            .repo
            .save_gov_web_data(&entry)
            .await?
            .ok_or_else(|| AppError::not_found("Government web data not found"))?;
        tracing::info!(entry = %saved.id, "directory entry updated");
        Ok(saved)
    }

    pub async fn remove(&self, requester: &AuthUser, id: Uuid) -> Result<(), AppError> {
        access::authorize(requester, Action::ManageDirectory, None)?;
        if !self.repo.delete_gov_web_data(id).await? {
            return Err(AppError::not_found("Government web data not found"));
        }
        tracing::info!(entry = %id, "directory entry removed");
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
