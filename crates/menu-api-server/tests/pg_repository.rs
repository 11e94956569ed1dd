//! `PgMenuRepository` against a real PostgreSQL database.
//!
//! Each test gets a fresh database with the crate migrations applied.
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use sqlx::PgPool;

use menu_api_server::database::{DbPool, MenuRepository, PgMenuRepository, RepositoryError};

fn repository(pool: PgPool) -> PgMenuRepository {
    PgMenuRepository::new(DbPool::from_pool(pool))
}

async fn add_dish(
    pool: &PgPool,
    menu_id: i32,
    name: &str,
    description: Option<&str>,
    price: Option<&str>,
) {
    sqlx::query(
        "INSERT INTO plato (menu_id, nombre, descripcion, precio) VALUES ($1, $2, $3, $4::numeric)",
    )
    .bind(menu_id)
    .bind(name)
    .bind(description)
    .bind(price)
    .execute(pool)
    .await
    .unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn create_returns_generated_ids(pool: PgPool) {
    let repo = repository(pool);

    let first = repo.create_menu("Lunch").await.unwrap();
    let second = repo.create_menu("Dinner").await.unwrap();

    assert!(second > first);
    let menu = repo.get_menu_with_dishes(first).await.unwrap();
    assert_eq!(menu.menu.name, "Lunch");
    assert!(menu.menu.status.is_none());
    assert!(menu.menu.qr_url.is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn menu_without_dishes_has_empty_platos(pool: PgPool) {
    let repo = repository(pool);
    let id = repo.create_menu("Lunch").await.unwrap();

    let menu = repo.get_menu_with_dishes(id).await.unwrap();

    assert!(menu.dishes.is_empty());
    let json = serde_json::to_value(&menu).unwrap();
    assert_eq!(json["platos"], serde_json::json!([]));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn dishes_are_joined_in_id_order(pool: PgPool) {
    let repo = repository(pool.clone());
    let id = repo.create_menu("Lunch").await.unwrap();
    let other = repo.create_menu("Dinner").await.unwrap();
    add_dish(&pool, id, "Sopa", Some("de verduras"), Some("4.50")).await;
    add_dish(&pool, id, "Pan", None, None).await;
    add_dish(&pool, other, "Flan", None, Some("3.00")).await;

    let menu = repo.get_menu_with_dishes(id).await.unwrap();

    assert_eq!(menu.menu.name, "Lunch");
    assert_eq!(menu.dishes.len(), 2);
    assert_eq!(menu.dishes[0].name, "Sopa");
    assert_eq!(menu.dishes[0].description.as_deref(), Some("de verduras"));
    assert_eq!(menu.dishes[0].price, Some(4.5));
    assert_eq!(menu.dishes[1].name, "Pan");
    assert!(menu.dishes[1].description.is_none());
    assert!(menu.dishes[1].price.is_none());
    assert!(menu.dishes[0].id < menu.dishes[1].id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn update_and_write_back_report_affected_rows(pool: PgPool) {
    let repo = repository(pool);
    let id = repo.create_menu("Lunch").await.unwrap();

    assert_eq!(repo.set_qr_url(id, "https://s/b/menu.png").await.unwrap(), 1);
    assert_eq!(
        repo.update_menu(id, "Dinner", Some("active"), Some("https://s/b/menu.png"))
            .await
            .unwrap(),
        1
    );
    assert_eq!(repo.update_menu(id + 100, "X", None, None).await.unwrap(), 0);
    assert_eq!(repo.set_qr_url(id + 100, "https://s/b/x.png").await.unwrap(), 0);

    let menu = repo.get_menu_with_dishes(id).await.unwrap();
    assert_eq!(menu.menu.name, "Dinner");
    assert_eq!(menu.menu.status.as_deref(), Some("active"));
    assert_eq!(menu.menu.qr_url.as_deref(), Some("https://s/b/menu.png"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn list_returns_menus_in_id_order(pool: PgPool) {
    let repo = repository(pool);
    assert!(repo.list_menus().await.unwrap().is_empty());

    let lunch = repo.create_menu("Lunch").await.unwrap();
    let dinner = repo.create_menu("Dinner").await.unwrap();

    let menus = repo.list_menus().await.unwrap();
    assert_eq!(menus.len(), 2);
    assert_eq!((menus[0].id, menus[0].name.as_str()), (lunch, "Lunch"));
    assert_eq!((menus[1].id, menus[1].name.as_str()), (dinner, "Dinner"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn delete_then_get_is_not_found(pool: PgPool) {
    let repo = repository(pool.clone());
    let id = repo.create_menu("Lunch").await.unwrap();
    add_dish(&pool, id, "Sopa", None, Some("4.50")).await;

    assert!(repo.delete_menu(id).await.unwrap());

    assert!(matches!(
        repo.get_menu_with_dishes(id).await,
        Err(RepositoryError::NotFound(missing)) if missing == id
    ));
    assert!(matches!(
        repo.delete_menu(id).await,
        Err(RepositoryError::NotFound(_))
    ));

    // dishes are not cascaded
    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plato WHERE menu_id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orphans, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn ping_reaches_database(pool: PgPool) {
    let repo = repository(pool);

    repo.ping().await.unwrap();
}
