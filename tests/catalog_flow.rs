use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use shopfront_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        categories::CreateCategoryRequest,
        heroes::{CreateHeroRequest, HeroListQuery, UpdateHeroRequest},
        products::{CreateProductRequest, UpdateProductRequest},
    },
    middleware::auth::AuthUser,
    models::{HeroView, ProductView},
    providers::storage::AssetStore,
    services::{category_service, hero_service, product_service},
    state::AppState,
};
use uuid::Uuid;

/// Asset store that remembers what it was asked to delete.
struct RecordingStore {
    accept: bool,
    deleted: Mutex<Vec<String>>,
}

impl RecordingStore {
    fn new(accept: bool) -> Arc<Self> {
        Arc::new(Self {
            accept,
            deleted: Mutex::new(Vec::new()),
        })
    }

    fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetStore for RecordingStore {
    async fn delete(&self, public_id: &str) -> anyhow::Result<bool> {
        self.deleted.lock().unwrap().push(public_id.to_string());
        Ok(self.accept)
    }
}

fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run catalog flow tests.");
            None
        }
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;
    let orm = create_orm_conn(database_url).await?;
    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        app_env: "test".into(),
        jwt_secret: "access-secret".into(),
        refresh_token_secret: "refresh-secret".into(),
        access_token_ttl_minutes: 15,
        refresh_token_ttl_days: 7,
        reset_token_ttl_days: 7,
        frontend_url: "http://localhost:3000".into(),
        demo_account_email: "demo@gmail.com".into(),
    };
    Ok(AppState::new(pool, orm, config))
}

async fn create_admin(state: &AppState) -> anyhow::Result<AuthUser> {
    sqlx::query("INSERT INTO roles (id, name, score) VALUES ($1, 'ADMIN', 999) ON CONFLICT (name) DO NOTHING")
        .bind(Uuid::new_v4())
        .execute(&state.pool)
        .await?;
    let (role_id,): (Uuid,) = sqlx::query_as("SELECT id FROM roles WHERE name = 'ADMIN'")
        .fetch_one(&state.pool)
        .await?;

    let user_id = Uuid::new_v4();
    let email = format!("{user_id}@example.com");
    sqlx::query(
        "INSERT INTO users (id, email, password_hash, name, role_id) VALUES ($1, $2, 'x', 'Catalog', $3)",
    )
    .bind(user_id)
    .bind(&email)
    .bind(role_id)
    .execute(&state.pool)
    .await?;

    Ok(AuthUser {
        user_id,
        email,
        name: "Catalog".into(),
        role: "ADMIN".into(),
        role_id,
    })
}

fn uploaded(name: &str) -> String {
    format!("https://res.example.com/demo/image/upload/v1712/shop/{name}.png")
}

async fn product_with_image(
    state: &AppState,
    admin: &AuthUser,
    image: &str,
) -> anyhow::Result<ProductView> {
    let category = category_service::create_category(
        state,
        admin,
        CreateCategoryRequest {
            name: format!("Catalog {}", Uuid::new_v4()),
            description: None,
            icon: None,
        },
    )
    .await?
    .data
    .expect("category");

    let product = product_service::create_product(
        state,
        admin,
        CreateProductRequest {
            name: format!("Lamp {}", Uuid::new_v4()),
            description: None,
            price: Some(Decimal::new(2500, 2)),
            images: vec![image.to_string()],
            category_id: Some(category.id),
            stock: Some(2),
            status: None,
        },
    )
    .await?
    .data
    .expect("product");
    Ok(product)
}

async fn hero_with_image(
    state: &AppState,
    admin: &AuthUser,
    title: &str,
    description: &str,
    image: &str,
) -> anyhow::Result<HeroView> {
    let hero = hero_service::create_hero(
        state,
        admin,
        CreateHeroRequest {
            title: title.to_string(),
            subtitle: None,
            description: Some(description.to_string()),
            image: image.to_string(),
            bg_color: None,
            cta: None,
            category_id: None,
            product_id: None,
            price: None,
            badge: None,
            order: None,
            status: None,
        },
    )
    .await?
    .data
    .expect("hero");
    Ok(hero)
}

// Rejected product updates leave the stored images alone.
#[tokio::test]
async fn invalid_product_update_keeps_old_images() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let store = RecordingStore::new(true);
    let state = setup_state(&database_url).await?.with_assets(store.clone());
    let admin = create_admin(&state).await?;
    let old_image = uploaded(&format!("products/{}", Uuid::new_v4()));
    let product = product_with_image(&state, &admin, &old_image).await?;

    let err = product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            name: Some("   ".into()),
            images: Some(vec![uploaded("products/new")]),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Product name cannot be empty");

    let err = product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            images: Some(vec![uploaded("products/new")]),
            rating: Some(Decimal::new(7, 0)),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Rating must be between 0 and 5");

    let err = product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            images: Some(vec![uploaded("products/new")]),
            category_id: Some(Uuid::new_v4()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Category not found");

    assert!(store.deleted().is_empty());
    let stored = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(stored.images, vec![old_image]);

    Ok(())
}

// The old image is deleted only after the row write, and a refused deletion
// rolls the write back.
#[tokio::test]
async fn product_image_swap_deletes_after_write() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&database_url).await?;
    let admin = create_admin(&state).await?;
    let old_name = format!("products/{}", Uuid::new_v4());
    let old_image = uploaded(&old_name);
    let new_image = uploaded(&format!("products/{}", Uuid::new_v4()));
    let product = product_with_image(&state, &admin, &old_image).await?;

    let refusing = RecordingStore::new(false);
    let refused_state = state.clone().with_assets(refusing.clone());
    let err = product_service::update_product(
        &refused_state,
        &admin,
        product.id,
        UpdateProductRequest {
            name: Some("Renamed lamp".into()),
            images: Some(vec![new_image.clone()]),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Failed to delete old image");
    assert_eq!(refusing.deleted(), vec![format!("shop/{old_name}")]);

    let untouched = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(untouched.images, vec![old_image.clone()]);
    assert_eq!(untouched.name, product.name);

    let accepting = RecordingStore::new(true);
    let accepted_state = state.clone().with_assets(accepting.clone());
    let updated = product_service::update_product(
        &accepted_state,
        &admin,
        product.id,
        UpdateProductRequest {
            images: Some(vec![new_image.clone()]),
            rating: Some(Decimal::new(45, 1)),
            reviews: Some(12),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(updated.images, vec![new_image]);
    assert_eq!(updated.rating, Decimal::new(45, 1));
    assert_eq!(accepting.deleted(), vec![format!("shop/{old_name}")]);

    Ok(())
}

// A hero update that fails validation never reaches the asset store.
#[tokio::test]
async fn invalid_hero_update_keeps_old_image() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let store = RecordingStore::new(true);
    let state = setup_state(&database_url).await?.with_assets(store.clone());
    let admin = create_admin(&state).await?;
    let old_image = uploaded(&format!("heroes/{}", Uuid::new_v4()));
    let hero =
        hero_with_image(&state, &admin, "Autumn sale", "Autumn collection", &old_image).await?;

    let err = hero_service::update_hero(
        &state,
        &admin,
        hero.id,
        UpdateHeroRequest {
            title: Some(String::new()),
            image: Some(uploaded("heroes/new")),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Title cannot be empty");

    let err = hero_service::update_hero(
        &state,
        &admin,
        hero.id,
        UpdateHeroRequest {
            image: Some(uploaded("heroes/new")),
            product_id: Some(Uuid::new_v4()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Product not found");

    assert!(store.deleted().is_empty());
    let stored = hero_service::get_hero(&state, hero.id)
        .await?
        .data
        .expect("hero");
    assert_eq!(stored.image, old_image);

    hero_service::delete_hero(&state, &admin, hero.id).await?;
    Ok(())
}

// Admin hero listing matches the search text against title and description.
#[tokio::test]
async fn hero_listing_searches_title_and_description() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&database_url).await?;
    let admin = create_admin(&state).await?;
    let marker = Uuid::new_v4().simple().to_string();
    let season = Uuid::new_v4().simple().to_string();
    let hero = hero_with_image(
        &state,
        &admin,
        &format!("Winter {}", marker.to_uppercase()),
        &format!("Collection {season}"),
        "/static/winter.png",
    )
    .await?;

    let found = hero_service::list_heroes(
        &state,
        HeroListQuery {
            search: Some(format!("  {marker} ")),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("heroes");
    assert_eq!(found.heroes.len(), 1);
    assert_eq!(found.heroes[0].id, hero.id);

    let by_description = hero_service::list_heroes(
        &state,
        HeroListQuery {
            search: Some(format!("COLLECTION {}", season.to_uppercase())),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("heroes");
    assert_eq!(by_description.heroes.len(), 1);
    assert_eq!(by_description.heroes[0].id, hero.id);

    let missing = hero_service::list_heroes(
        &state,
        HeroListQuery {
            search: Some(Uuid::new_v4().simple().to_string()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("heroes");
    assert!(missing.heroes.is_empty());

    hero_service::delete_hero(&state, &admin, hero.id).await?;
    Ok(())
}
