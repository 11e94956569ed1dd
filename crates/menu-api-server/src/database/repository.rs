use super::{DbPool, Menu, MenuDishRow, MenuWithDishes};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Menu not found: {0}")]
    NotFound(i32),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable CRUD for menus and their dishes.
#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// Inserts a menu with no QR URL and returns its id.
    async fn create_menu(&self, name: &str) -> Result<i32, RepositoryError>;

    async fn get_menu_with_dishes(&self, id: i32) -> Result<MenuWithDishes, RepositoryError>;

    /// Overwrites all mutable fields. A missing id is not an error: the
    /// affected count is simply 0.
    async fn update_menu(
        &self,
        id: i32,
        name: &str,
        status: Option<&str>,
        qr_url: Option<&str>,
    ) -> Result<u64, RepositoryError>;

    async fn set_qr_url(&self, id: i32, qr_url: &str) -> Result<u64, RepositoryError>;

    async fn list_menus(&self) -> Result<Vec<Menu>, RepositoryError>;

    /// Fails with `NotFound` when no row was removed. Dishes are left in place.
    async fn delete_menu(&self, id: i32) -> Result<bool, RepositoryError>;

    /// Readiness check. Stores without a remote connection are always ready.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

pub struct PgMenuRepository {
    pool: DbPool,
}

impl PgMenuRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuRepository for PgMenuRepository {
    async fn create_menu(&self, name: &str) -> Result<i32, RepositoryError> {
        let id = sqlx::query_scalar::<_, i32>("INSERT INTO menu (nombre) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(self.pool.get_pool())
            .await
            .map_err(|e| {
                error!("Database error creating menu: {}", e);
                RepositoryError::Database(e)
            })?;

        debug!("Created menu {}", id);
        Ok(id)
    }

    async fn get_menu_with_dishes(&self, id: i32) -> Result<MenuWithDishes, RepositoryError> {
        let rows = sqlx::query_as::<_, MenuDishRow>(
            r#"SELECT
                m.id,
                m.nombre,
                m.status,
                m.codigo_qr,
                p.id AS plato_id,
                p.nombre AS plato_nombre,
                p.descripcion,
                p.precio::float8 AS precio
               FROM menu m
               LEFT JOIN plato p ON m.id = p.menu_id
               WHERE m.id = $1
               ORDER BY p.id"#,
        )
        .bind(id)
        .fetch_all(self.pool.get_pool())
        .await?;

        MenuWithDishes::from_rows(rows).ok_or(RepositoryError::NotFound(id))
    }

    async fn update_menu(
        &self,
        id: i32,
        name: &str,
        status: Option<&str>,
        qr_url: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE menu SET nombre = $1, status = $2, codigo_qr = $3 WHERE id = $4",
        )
        .bind(name)
        .bind(status)
        .bind(qr_url)
        .bind(id)
        .execute(self.pool.get_pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn set_qr_url(&self, id: i32, qr_url: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE menu SET codigo_qr = $1 WHERE id = $2")
            .bind(qr_url)
            .bind(id)
            .execute(self.pool.get_pool())
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_menus(&self) -> Result<Vec<Menu>, RepositoryError> {
        let menus = sqlx::query_as::<_, Menu>(
            "SELECT id, nombre, status, codigo_qr FROM menu ORDER BY id",
        )
        .fetch_all(self.pool.get_pool())
        .await?;

        Ok(menus)
    }

    async fn delete_menu(&self, id: i32) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM menu WHERE id = $1")
            .bind(id)
            .execute(self.pool.get_pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }

        Ok(true)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(self.pool.ping().await?)
    }
}
