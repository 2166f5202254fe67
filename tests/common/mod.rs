#![allow(dead_code)]

use std::sync::Arc;

use egov_portal::{
    AppConfig, AppState,
    auth::AuthUser,
    complaints::ComplaintService,
    models::{Complaint, CreateComplaintRequest, NewUser, Role},
    notifier::{MockNotifier, NotifierState},
    repository::{MemoryRepository, Repository, RepositoryState},
    storage::{MockStorageService, StorageState},
};

/// Image URL inside the mock bucket, so `release` accepts it.
pub fn managed_image(name: &str) -> String {
    format!("http://localhost:9000/mock-bucket/complaints/{name}.jpg")
}

/// TestContext
///
/// An in-memory application: memory repository, mock Asset Store and mock
/// Notification Sender. The mocks are kept so tests can inspect what happened.
pub struct TestContext {
    pub repo: Arc<MemoryRepository>,
    pub storage: MockStorageService,
    pub notifier: MockNotifier,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with(MockStorageService::new(), MockNotifier::new())
    }

    pub fn with(storage: MockStorageService, notifier: MockNotifier) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let state = AppState {
            repo: repo.clone() as RepositoryState,
            storage: Arc::new(storage.clone()) as StorageState,
            notifier: Arc::new(notifier.clone()) as NotifierState,
            config: AppConfig::default(),
        };
        Self {
            repo,
            storage,
            notifier,
            state,
        }
    }

    pub fn service(&self) -> ComplaintService<'_> {
        ComplaintService::from_state(&self.state)
    }

    pub async fn seed_user(&self, name: &str, role: Role) -> AuthUser {
        let user = self
            .repo
            .create_user(NewUser {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password_hash: "not-a-real-hash".to_string(),
                role,
            })
            .await
            .expect("seed user");
        AuthUser {
            id: user.id,
            role: user.role,
        }
    }

    pub async fn file(&self, owner: &AuthUser, subject: &str, category: &str) -> Complaint {
        self.file_with_image(owner, subject, category, None).await
    }

    pub async fn file_with_image(
        &self,
        owner: &AuthUser,
        subject: &str,
        category: &str,
        image: Option<String>,
    ) -> Complaint {
        self.service()
            .file(
                owner,
                CreateComplaintRequest {
                    subject: subject.to_string(),
                    description: format!("Details about {subject}"),
                    category: category.to_string(),
                    image,
                },
            )
            .await
            .expect("file complaint")
    }
}
