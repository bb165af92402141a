use rust_decimal::Decimal;
use shopfront_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    services::token_service::hash_password,
};
use uuid::Uuid;

const ROLES: &[(&str, i32, &str)] = &[
    ("ADMIN", 999, "Super administrator with full access"),
    ("MANAGER", 50, "Back-office staff managing catalogue and orders"),
    ("USER", 0, "Regular customer"),
];

/// (module, action, required_score)
const PERMISSIONS: &[(&str, &str, i32)] = &[
    ("permission", "view_permission", 10),
    ("permission", "create_permission", 30),
    ("permission", "update_permission", 30),
    ("permission", "delete_permission", 50),
    ("role", "view_role", 10),
    ("role", "create_role", 30),
    ("role", "update_role", 30),
    ("role", "delete_role", 50),
    ("category", "manage_categories", 50),
    ("product", "manage_products", 50),
    ("hero", "manage_heroes", 50),
    ("order", "create_order", 0),
    ("order", "view_own_orders", 0),
    ("order", "view_order", 0),
    ("order", "cancel_order", 0),
    ("order", "manage_orders", 50),
    ("transaction", "view_own_transactions", 0),
    ("transaction", "manage_transactions", 50),
    ("address", "list_addresses", 50),
    ("address", "delete_address", 0),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    for (name, score, description) in ROLES {
        ensure_role(&pool, name, *score, description).await?;
    }
    seed_permissions(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@gmail.com", "Admin", "admin@123", "ADMIN").await?;
    let user_id = ensure_user(&pool, "user@gmail.com", "User", "user@123", "USER").await?;
    ensure_user(&pool, &config.demo_account_email, "Demo", "demo@123", "USER").await?;
    seed_catalogue(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_role(
    pool: &sqlx::PgPool,
    name: &str,
    score: i32,
    description: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO roles (id, name, score, description)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(score)
    .bind(description)
    .execute(pool)
    .await?;
    println!("Ensured role {name} (score={score})");
    Ok(())
}

async fn seed_permissions(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    for (module, action, required_score) in PERMISSIONS {
        sqlx::query(
            r#"
            INSERT INTO permissions (module, action, required_score)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(*module)
        .bind(*action)
        .bind(*required_score)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    println!("Seeded {} permissions", PERMISSIONS.len());
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password.to_string()).await?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, name, role_id)
        SELECT $1, $2, $3, $4, r.id FROM roles r WHERE r.name = $5
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // Already present: keep the stored password.
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_catalogue(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = [
        ("Laptops", "Portable computers"),
        ("Smartphones", "Phones and handsets"),
        ("Accessories", "Hubs, keyboards and audio"),
    ];
    for (name, description) in categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
    }

    // (name, description, price in cents, stock, category)
    let products = [
        ("Dell XPS 13", "13-inch ultrabook", 129_999, 15, "Laptops"),
        ("iPhone 15 Pro", "Titanium smartphone", 99_999, 30, "Smartphones"),
        ("USB-C Hub Pro", "7-in-1 hub with HDMI", 4_999, 120, "Accessories"),
        ("Mechanical Gaming Keyboard", "Hot-swappable switches", 8_999, 0, "Accessories"),
    ];
    for (name, description, cents, stock, category) in products {
        let status = if stock > 0 { "active" } else { "out_of_stock" };
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, stock, status, category_id)
            SELECT $1, $2, $3, $4, $5, $6, c.id FROM categories c
            WHERE c.name = $7
              AND NOT EXISTS (SELECT 1 FROM products p WHERE p.name = $2)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(Decimal::new(cents, 2))
        .bind(stock)
        .bind(status)
        .bind(category)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalogue");
    Ok(())
}
