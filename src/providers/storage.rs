use async_trait::async_trait;

use crate::error::{AppError, AppResult};

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Remove a stored asset. `Ok(false)` means the provider refused or did
    /// not find it.
    async fn delete(&self, public_id: &str) -> anyhow::Result<bool>;
}

/// Asset store that only records deletions in the log.
pub struct LogAssetStore;

#[async_trait]
impl AssetStore for LogAssetStore {
    async fn delete(&self, public_id: &str) -> anyhow::Result<bool> {
        tracing::info!(public_id, "asset deleted");
        Ok(true)
    }
}

/// Provider id of an uploaded asset URL, e.g.
/// `https://cdn/x/image/upload/v1712/shop/products/mug.png` -> `shop/products/mug`.
///
/// Returns `None` for URLs that were not produced by the upload provider
/// (seeded static paths and the like).
pub fn managed_public_id(url: &str) -> Option<String> {
    let (_, path) = url.split_once("/upload/")?;
    let mut parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();

    let is_version = parts.first().is_some_and(|first| {
        first.len() > 1
            && first.starts_with('v')
            && first[1..].chars().all(|c| c.is_ascii_digit())
    });
    if is_version {
        parts.remove(0);
    }

    let file = parts.pop()?;
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    parts.push(stem);
    Some(parts.join("/"))
}

/// Delete the asset behind `url` when it is managed by the store. A refused
/// or failed deletion is reported as `BadRequest(failure_message)`.
pub async fn delete_managed(
    store: &dyn AssetStore,
    url: &str,
    failure_message: &str,
) -> AppResult<()> {
    let Some(public_id) = managed_public_id(url) else {
        tracing::debug!(url, "skipping unmanaged asset");
        return Ok(());
    };

    match store.delete(&public_id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(AppError::bad_request(failure_message)),
        Err(err) => {
            tracing::warn!(error = %err, public_id, "asset deletion failed");
            Err(AppError::bad_request(failure_message))
        }
    }
}

/// Best-effort variant used when the owning row is going away anyway.
pub async fn delete_managed_quietly(store: &dyn AssetStore, url: &str) {
    if let Err(err) = delete_managed(store, url, "Failed to delete asset").await {
        tracing::warn!(error = %err, url, "ignoring asset cleanup failure");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RefusingStore;

    #[async_trait]
    impl AssetStore for RefusingStore {
        async fn delete(&self, _public_id: &str) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn strips_version_and_extension() {
        assert_eq!(
            managed_public_id("https://res.example.com/demo/image/upload/v1712345/shop/products/mug.png")
                .as_deref(),
            Some("shop/products/mug")
        );
    }

    #[test]
    fn keeps_non_version_first_segment() {
        assert_eq!(
            managed_public_id("https://res.example.com/demo/image/upload/vintage/cover.final.jpg")
                .as_deref(),
            Some("vintage/cover.final")
        );
    }

    #[test]
    fn ignores_unmanaged_urls() {
        assert_eq!(managed_public_id("/modern-laptop.png"), None);
        assert_eq!(managed_public_id("https://res.example.com/demo/image/upload/"), None);
    }

    #[tokio::test]
    async fn refused_deletion_becomes_bad_request() {
        let err = delete_managed(
            &RefusingStore,
            "https://res.example.com/image/upload/v1/a.png",
            "Failed to delete old image",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Failed to delete old image"));
    }

    #[tokio::test]
    async fn unmanaged_urls_are_not_sent_to_the_store() {
        delete_managed(&RefusingStore, "/static/a.png", "nope")
            .await
            .unwrap();
    }
}
