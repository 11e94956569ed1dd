use std::sync::Arc;
use tracing::{info, warn};

use super::ArtifactSync;
use crate::database::{Menu, MenuRepository, MenuWithDishes};
use crate::utils::error::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedMenu {
    pub id: i32,
    pub name: String,
    pub qr_url: String,
}

/// Request-level menu operations. Combines the menu store with QR artifact
/// sync so that a menu's `qr_url` is only ever written with the URL of an
/// artifact that encodes that same menu.
pub struct MenuService {
    repository: Arc<dyn MenuRepository>,
    artifact_sync: Arc<ArtifactSync>,
}

impl MenuService {
    pub fn new(repository: Arc<dyn MenuRepository>, artifact_sync: Arc<ArtifactSync>) -> Self {
        Self {
            repository,
            artifact_sync,
        }
    }

    pub async fn list_menus(&self) -> Result<Vec<Menu>, ApiError> {
        Ok(self.repository.list_menus().await?)
    }

    pub async fn get_menu(&self, id: i32) -> Result<MenuWithDishes, ApiError> {
        Ok(self.repository.get_menu_with_dishes(id).await?)
    }

    /// Two-phase creation: the row exists with no QR URL until the artifact
    /// has been published. A sync failure leaves it that way.
    pub async fn create_menu(&self, name: &str) -> Result<CreatedMenu, ApiError> {
        let name = require_name(name)?;

        let id = self.repository.create_menu(&name).await?;
        info!("Menu {} created, syncing QR", id);

        let qr_url = self.artifact_sync.sync_for_menu(id).await?;

        let affected = self.repository.set_qr_url(id, &qr_url).await?;
        if affected == 0 {
            warn!("Menu {} vanished before QR write-back; artifact {} left orphaned", id, qr_url);
            return Err(ApiError::NotFound(format!("Menu {} not found", id)));
        }

        Ok(CreatedMenu { id, name, qr_url })
    }

    /// Publishes the QR artifact first, then commits name, status and URL in
    /// a single statement. Nothing is written if the sync fails.
    pub async fn update_menu(
        &self,
        id: i32,
        name: &str,
        status: Option<&str>,
    ) -> Result<String, ApiError> {
        let name = require_name(name)?;

        let qr_url = self.artifact_sync.sync_for_menu(id).await?;

        let affected = self
            .repository
            .update_menu(id, &name, status, Some(&qr_url))
            .await?;

        if affected == 0 {
            warn!("Update for missing menu {}; artifact {} left orphaned", id, qr_url);
            return Err(ApiError::NotFound(format!("Menu {} not found", id)));
        }

        info!("Menu {} updated", id);
        Ok(qr_url)
    }

    pub async fn ping(&self) -> Result<(), ApiError> {
        self.repository
            .ping()
            .await
            .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))
    }

    /// Dishes and the stored QR artifact are intentionally left behind.
    pub async fn delete_menu(&self, id: i32) -> Result<(), ApiError> {
        self.repository.delete_menu(id).await?;
        info!("Menu {} deleted", id);
        Ok(())
    }
}

fn require_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::ValidationError("nombre is required".to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::RepositoryError;
    use crate::services::QrRenderer;
    use crate::storage::{MockObjectStorage, StorageError};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Minimal store that records the write-back calls. With `lose_rows`
    /// set, every row is dropped right after insert, as if a concurrent
    /// DELETE won the race.
    #[derive(Default)]
    struct FakeRepository {
        menus: Mutex<Vec<Menu>>,
        lose_rows: bool,
    }

    #[async_trait]
    impl MenuRepository for FakeRepository {
        async fn create_menu(&self, name: &str) -> Result<i32, RepositoryError> {
            let mut menus = self.menus.lock().unwrap();
            let id = menus.len() as i32 + 1;
            menus.push(Menu {
                id,
                name: name.to_string(),
                status: None,
                qr_url: None,
            });
            if self.lose_rows {
                menus.clear();
            }
            Ok(id)
        }

        async fn get_menu_with_dishes(&self, id: i32) -> Result<MenuWithDishes, RepositoryError> {
            let menus = self.menus.lock().unwrap();
            let menu = menus
                .iter()
                .find(|m| m.id == id)
                .cloned()
                .ok_or(RepositoryError::NotFound(id))?;
            Ok(MenuWithDishes {
                menu,
                dishes: Vec::new(),
            })
        }

        async fn update_menu(
            &self,
            id: i32,
            name: &str,
            status: Option<&str>,
            qr_url: Option<&str>,
        ) -> Result<u64, RepositoryError> {
            let mut menus = self.menus.lock().unwrap();
            match menus.iter_mut().find(|m| m.id == id) {
                Some(menu) => {
                    menu.name = name.to_string();
                    menu.status = status.map(str::to_string);
                    menu.qr_url = qr_url.map(str::to_string);
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        async fn set_qr_url(&self, id: i32, qr_url: &str) -> Result<u64, RepositoryError> {
            let mut menus = self.menus.lock().unwrap();
            match menus.iter_mut().find(|m| m.id == id) {
                Some(menu) => {
                    menu.qr_url = Some(qr_url.to_string());
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        async fn list_menus(&self) -> Result<Vec<Menu>, RepositoryError> {
            Ok(self.menus.lock().unwrap().clone())
        }

        async fn delete_menu(&self, id: i32) -> Result<bool, RepositoryError> {
            let mut menus = self.menus.lock().unwrap();
            let before = menus.len();
            menus.retain(|m| m.id != id);
            if menus.len() == before {
                return Err(RepositoryError::NotFound(id));
            }
            Ok(true)
        }
    }

    fn service(storage: MockObjectStorage) -> (MenuService, Arc<FakeRepository>) {
        service_over(FakeRepository::default(), storage)
    }

    fn service_over(
        repository: FakeRepository,
        storage: MockObjectStorage,
    ) -> (MenuService, Arc<FakeRepository>) {
        let repository = Arc::new(repository);
        let sync = ArtifactSync::new(
            "http://localhost:3000",
            QrRenderer::default(),
            Arc::new(storage),
            Duration::from_secs(5),
        );
        (
            MenuService::new(repository.clone(), Arc::new(sync)),
            repository,
        )
    }

    fn accepting_storage() -> MockObjectStorage {
        let mut storage = MockObjectStorage::new();
        storage
            .expect_save()
            .returning(|key, _, _| Ok(format!("https://storage.googleapis.com/restaurante/{}", key)));
        storage
    }

    fn failing_storage() -> MockObjectStorage {
        let mut storage = MockObjectStorage::new();
        storage
            .expect_save()
            .returning(|_, _, _| Err(StorageError::Config("no credentials".to_string())));
        storage
    }

    #[tokio::test]
    async fn test_create_writes_back_qr_url() {
        let (service, repository) = service(accepting_storage());

        let created = service.create_menu("  Lunch ").await.unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.name, "Lunch");
        assert!(created.qr_url.ends_with("/menu_1.png"));
        let stored = repository.get_menu_with_dishes(1).await.unwrap();
        assert_eq!(stored.menu.qr_url.as_deref(), Some(created.qr_url.as_str()));
    }

    #[tokio::test]
    async fn test_create_write_back_to_missing_row_is_not_found() {
        let repository = FakeRepository {
            lose_rows: true,
            ..Default::default()
        };
        let (service, repository) = service_over(repository, accepting_storage());

        let err = service.create_menu("Lunch").await.unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(repository.set_qr_url(1, "x").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let mut storage = MockObjectStorage::new();
        storage.expect_save().never();
        let (service, repository) = service(storage);

        let err = service.create_menu("   ").await.unwrap_err();

        assert!(matches!(err, ApiError::ValidationError(_)));
        assert!(repository.list_menus().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_sync_failure_leaves_row_without_qr() {
        let (service, repository) = service(failing_storage());

        let err = service.create_menu("Lunch").await.unwrap_err();

        assert!(matches!(err, ApiError::SyncError(_)));
        let stored = repository.get_menu_with_dishes(1).await.unwrap();
        assert!(stored.menu.qr_url.is_none());
    }

    #[tokio::test]
    async fn test_update_commits_fields_and_url() {
        let (service, repository) = service(accepting_storage());
        let created = service.create_menu("Lunch").await.unwrap();

        let qr = service
            .update_menu(created.id, "Dinner", Some("active"))
            .await
            .unwrap();

        assert_eq!(qr, created.qr_url);
        let stored = repository.get_menu_with_dishes(created.id).await.unwrap();
        assert_eq!(stored.menu.name, "Dinner");
        assert_eq!(stored.menu.status.as_deref(), Some("active"));
    }

    #[tokio::test]
    async fn test_update_sync_failure_writes_nothing() {
        let (service, repository) = service(failing_storage());
        repository.create_menu("Lunch").await.unwrap();

        let err = service
            .update_menu(1, "Dinner", Some("active"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::SyncError(_)));
        let stored = repository.get_menu_with_dishes(1).await.unwrap();
        assert_eq!(stored.menu.name, "Lunch");
        assert!(stored.menu.status.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_menu_is_not_found() {
        let (service, _) = service(accepting_storage());

        let err = service.update_menu(42, "Dinner", None).await.unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let (service, _) = service(accepting_storage());
        let created = service.create_menu("Lunch").await.unwrap();

        service.delete_menu(created.id).await.unwrap();

        assert!(matches!(
            service.get_menu(created.id).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_menu(created.id).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
