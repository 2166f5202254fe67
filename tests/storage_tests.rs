use egov_portal::storage::{
    MockStorageService, S3StorageClient, StorageError, StorageService, key_from_url, sanitize_key,
};
use uuid::Uuid;

#[cfg(test)]
mod key_tests {
    use super::*;

    #[test]
    fn test_sanitize_key_strips_traversal() {
        assert_eq!(sanitize_key("../../etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_key("complaints//./a.jpg"), "complaints/a.jpg");
    }

    #[test]
    fn test_key_from_url() {
        let base = "http://localhost:9000/egov-uploads";

        assert_eq!(
            key_from_url(base, "http://localhost:9000/egov-uploads/complaints/a.png").unwrap(),
            "complaints/a.png"
        );
        // Query strings are not part of the key.
        assert_eq!(
            key_from_url(base, "http://localhost:9000/egov-uploads/complaints/a.png?x=1").unwrap(),
            "complaints/a.png"
        );
        assert!(matches!(
            key_from_url(base, "https://elsewhere.example/complaints/a.png"),
            Err(StorageError::ForeignUrl(_))
        ));
        assert!(matches!(
            key_from_url(base, "http://localhost:9000/egov-uploads/"),
            Err(StorageError::ForeignUrl(_))
        ));
    }
}

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let mock = MockStorageService::new();
        let key = "complaints/test.jpg";

        let url = mock.presign_upload(key, "image/jpeg").await.unwrap();

        assert!(url.contains("signature=fake"));
        assert!(url.contains(key));
        assert!(mock.object_url(key).ends_with(key));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockStorageService::new_failing();
        let result = mock.presign_upload("complaints/test.jpg", "image/jpeg").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_release_records_and_rejects_foreign_urls() {
        let mock = MockStorageService::new();
        let managed = mock.object_url("complaints/a.jpg");

        assert!(mock.release(&managed).await.is_ok());
        assert!(matches!(
            mock.release("https://evil.example/a.jpg").await,
            Err(StorageError::ForeignUrl(_))
        ));
        assert_eq!(mock.released().await.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_clones_share_release_log() {
        let mock = MockStorageService::new();
        let clone = mock.clone();

        clone.release(&mock.object_url("complaints/a.jpg")).await.unwrap();

        assert_eq!(mock.released().await.len(), 1);
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    async fn client() -> S3StorageClient {
        S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        )
        .await
    }

    #[tokio::test]
    async fn test_s3_presigned_url_format() {
        let client = client().await;
        let key = format!("complaints/{}.png", Uuid::new_v4());

        // Presigning is computed locally; no server needs to be running.
        let url = client.presign_upload(&key, "image/png").await.unwrap();

        assert!(url.starts_with("http://localhost:9000/testbucket/"));
        assert!(url.contains(&key));
        assert!(url.contains("X-Amz-Signature"));
    }

    #[tokio::test]
    async fn test_s3_object_url_is_path_style() {
        let client = client().await;

        assert_eq!(
            client.object_url("complaints/a.png"),
            "http://localhost:9000/testbucket/complaints/a.png"
        );
    }

    #[tokio::test]
    async fn test_s3_release_rejects_foreign_url_without_network() {
        let client = client().await;

        let result = client.release("https://elsewhere.example/a.png").await;

        assert!(matches!(result, Err(StorageError::ForeignUrl(_))));
    }
}
