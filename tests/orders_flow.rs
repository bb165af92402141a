use rust_decimal::Decimal;
use shopfront_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        categories::CreateCategoryRequest,
        orders::{CreateOrderRequest, OrderItemInput, UpdateOrderStatusRequest},
        products::{CreateProductRequest, UpdateStockRequest},
        transactions::{ProcessPaymentRequest, UpdateTransactionStatusRequest},
    },
    entity::{
        orders::{OrderStatus, PaymentMethod},
        products::ProductStatus,
        transactions::TransactionStatus,
    },
    middleware::auth::AuthUser,
    models::{OrderView, ProductView},
    services::{category_service, order_service, product_service, transaction_service},
    state::AppState,
};
use serde_json::json;
use uuid::Uuid;

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

async fn create_user(state: &AppState, role: &str, score: i32) -> anyhow::Result<AuthUser> {
    sqlx::query("INSERT INTO roles (id, name, score) VALUES ($1, $2, $3) ON CONFLICT (name) DO NOTHING")
        .bind(Uuid::new_v4())
        .bind(role)
        .bind(score)
        .execute(&state.pool)
        .await?;
    let (role_id,): (Uuid,) = sqlx::query_as("SELECT id FROM roles WHERE name = $1")
        .bind(role)
        .fetch_one(&state.pool)
        .await?;

    let user_id = Uuid::new_v4();
    let email = format!("{user_id}@example.com");
    sqlx::query(
        "INSERT INTO users (id, email, password_hash, name, role_id) VALUES ($1, $2, 'x', 'Flow', $3)",
    )
    .bind(user_id)
    .bind(&email)
    .bind(role_id)
    .execute(&state.pool)
    .await?;

    Ok(AuthUser {
        user_id,
        email,
        name: "Flow".into(),
        role: role.into(),
        role_id,
    })
}

fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            None
        }
    }
}

async fn stocked_product(
    state: &AppState,
    admin: &AuthUser,
    stock: i32,
) -> anyhow::Result<ProductView> {
    let category = category_service::create_category(
        state,
        admin,
        CreateCategoryRequest {
            name: format!("Flow {}", Uuid::new_v4()),
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
            name: format!("Widget {}", Uuid::new_v4()),
            description: None,
            price: Some(Decimal::new(1000, 2)),
            images: Vec::new(),
            category_id: Some(category.id),
            stock: Some(stock),
            status: None,
        },
    )
    .await?
    .data
    .expect("product");
    Ok(product)
}

async fn place_order(
    state: &AppState,
    shopper: &AuthUser,
    product_id: Uuid,
    quantity: i32,
) -> anyhow::Result<OrderView> {
    let order = order_service::create_order(
        state,
        shopper,
        CreateOrderRequest {
            items: vec![OrderItemInput {
                product_id,
                quantity,
            }],
            payment_method: Some(PaymentMethod::Stripe),
            shipping_address: Some("1 Test Street".into()),
            notes: None,
        },
    )
    .await?
    .data
    .expect("order");
    Ok(order)
}

async fn set_order_status(
    state: &AppState,
    admin: &AuthUser,
    order_id: Uuid,
    status: &str,
) -> anyhow::Result<OrderView> {
    let order = order_service::update_order_status(
        state,
        admin,
        order_id,
        UpdateOrderStatusRequest {
            status: Some(status.into()),
            tracking_number: None,
        },
    )
    .await?
    .data
    .expect("order");
    Ok(order)
}

async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = product_service::get_product(state, product_id)
        .await?
        .data
        .expect("product");
    Ok(product.stock)
}

// Order placement reserves stock, cancellation gives it back, and a drained
// product flips to out_of_stock.
#[tokio::test]
async fn order_reserves_and_cancel_restores_stock() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };

    let state = setup_state(&database_url).await?;
    let admin = create_user(&state, "ADMIN", 999).await?;
    let shopper = create_user(&state, "USER", 0).await?;

    let category = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: format!("Flow {}", Uuid::new_v4()),
            description: None,
            icon: None,
        },
    )
    .await?
    .data
    .expect("category");

    let product = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: format!("Widget {}", Uuid::new_v4()),
            description: Some("Flow test product".into()),
            price: Some(Decimal::new(1500, 2)),
            images: Vec::new(),
            category_id: Some(category.id),
            stock: Some(3),
            status: None,
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(product.status, ProductStatus::Active);

    let order = order_service::create_order(
        &state,
        &shopper,
        CreateOrderRequest {
            items: vec![
                OrderItemInput {
                    product_id: product.id,
                    quantity: 1,
                },
                OrderItemInput {
                    product_id: product.id,
                    quantity: 2,
                },
            ],
            payment_method: Some(PaymentMethod::CashOnDelivery),
            shipping_address: Some("1 Test Street".into()),
            notes: None,
        },
    )
    .await?
    .data
    .expect("order");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, Decimal::new(4500, 2));
    assert_eq!(order.items.len(), 1);
    let transaction = order.transaction.as_ref().expect("transaction");
    assert_eq!(transaction.status, TransactionStatus::Pending);
    assert_eq!(transaction.amount, order.total_amount);

    let drained = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(drained.stock, 0);
    assert_eq!(drained.status, ProductStatus::OutOfStock);

    let err = order_service::create_order(
        &state,
        &shopper,
        CreateOrderRequest {
            items: vec![OrderItemInput {
                product_id: product.id,
                quantity: 1,
            }],
            payment_method: Some(PaymentMethod::Stripe),
            shipping_address: Some("1 Test Street".into()),
            notes: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), format!("Product {} is not available", product.name));

    let cancelled = order_service::cancel_order(&state, &shopper, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let restored = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(restored.stock, 3);
    assert_eq!(restored.status, ProductStatus::Active);

    let err = order_service::cancel_order(&state, &shopper, order.id)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Only pending or processing orders can be cancelled"
    );

    let err = order_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: Some("SHIPPED".into()),
            tracking_number: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot change order status from CANCELLED to SHIPPED"
    );

    let err = product_service::update_stock(
        &state,
        &admin,
        product.id,
        UpdateStockRequest {
            quantity: 10,
            operation: Some("subtract".into()),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Insufficient stock");

    Ok(())
}

// A pending transaction is charged once; a second charge attempt is refused.
#[tokio::test]
async fn payment_is_processed_only_once() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&database_url).await?;
    let admin = create_user(&state, "ADMIN", 999).await?;
    let shopper = create_user(&state, "USER", 0).await?;
    let product = stocked_product(&state, &admin, 5).await?;
    let order = place_order(&state, &shopper, product.id, 1).await?;
    let transaction_id = order.transaction.as_ref().expect("transaction").id;

    let paid = transaction_service::process_payment(
        &state,
        &shopper,
        transaction_id,
        ProcessPaymentRequest {
            payment_details: Some(json!({ "transaction_id": "ch_flow_1" })),
        },
    )
    .await?;
    assert!(paid.success);
    let paid = paid.data.expect("transaction");
    assert_eq!(paid.status, TransactionStatus::Completed);
    assert_eq!(paid.transaction_id.as_deref(), Some("ch_flow_1"));

    let processing = order_service::get_order(&state, &shopper, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(processing.status, OrderStatus::Processing);

    let err = transaction_service::process_payment(
        &state,
        &shopper,
        transaction_id,
        ProcessPaymentRequest {
            payment_details: Some(json!({ "transaction_id": "ch_flow_2" })),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Transaction is not in pending state");

    let transaction = transaction_service::get_transaction(&state, &shopper, transaction_id)
        .await?
        .data
        .expect("transaction");
    assert_eq!(transaction.transaction_id.as_deref(), Some("ch_flow_1"));

    Ok(())
}

// A category cannot be removed while products still point at it.
#[tokio::test]
async fn category_delete_waits_for_its_products() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&database_url).await?;
    let admin = create_user(&state, "ADMIN", 999).await?;
    let product = stocked_product(&state, &admin, 1).await?;
    let category_id = product.category_id;

    let err = category_service::delete_category(&state, &admin, category_id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete category with associated products");

    product_service::delete_product(&state, &admin, product.id).await?;
    let deleted = category_service::delete_category(&state, &admin, category_id).await?;
    assert!(deleted.success);

    let err = category_service::get_category(&state, category_id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Category not found");

    Ok(())
}

// Customers can only cancel orders that have not shipped; later states stay put.
#[tokio::test]
async fn shipped_and_settled_orders_cannot_be_cancelled() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&database_url).await?;
    let admin = create_user(&state, "ADMIN", 999).await?;
    let shopper = create_user(&state, "USER", 0).await?;
    let product = stocked_product(&state, &admin, 4).await?;
    let order = place_order(&state, &shopper, product.id, 2).await?;

    for (status, expected) in [
        ("SHIPPED", OrderStatus::Shipped),
        ("DELIVERED", OrderStatus::Delivered),
        ("REFUNDED", OrderStatus::Refunded),
    ] {
        let moved = set_order_status(&state, &admin, order.id, status).await?;
        assert_eq!(moved.status, expected);

        let err = order_service::cancel_order(&state, &shopper, order.id)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only pending or processing orders can be cancelled"
        );

        let unchanged = order_service::get_order(&state, &shopper, order.id)
            .await?
            .data
            .expect("order");
        assert_eq!(unchanged.status, expected);
        assert_eq!(stock_of(&state, product.id).await?, 2);
    }

    Ok(())
}

// A failed payment on a shipped order cancels it and puts the stock back.
#[tokio::test]
async fn failed_transaction_cancels_shipped_order_and_restocks() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&database_url).await?;
    let admin = create_user(&state, "ADMIN", 999).await?;
    let shopper = create_user(&state, "USER", 0).await?;
    let product = stocked_product(&state, &admin, 5).await?;
    let order = place_order(&state, &shopper, product.id, 3).await?;
    let transaction_id = order.transaction.as_ref().expect("transaction").id;
    assert_eq!(stock_of(&state, product.id).await?, 2);

    set_order_status(&state, &admin, order.id, "SHIPPED").await?;

    let failed = transaction_service::update_transaction_status(
        &state,
        &admin,
        transaction_id,
        UpdateTransactionStatusRequest {
            status: Some("FAILED".into()),
            metadata: Some(json!({ "reason": "chargeback" })),
        },
    )
    .await?
    .data
    .expect("transaction");
    assert_eq!(failed.status, TransactionStatus::Failed);

    let cancelled = order_service::get_order(&state, &admin, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&state, product.id).await?, 5);

    // Already cancelled: a second failure must not restock again.
    transaction_service::update_transaction_status(
        &state,
        &admin,
        transaction_id,
        UpdateTransactionStatusRequest {
            status: Some("CANCELLED".into()),
            metadata: None,
        },
    )
    .await?;
    assert_eq!(stock_of(&state, product.id).await?, 5);

    let refunded = set_order_status(&state, &admin, order.id, "REFUNDED").await?;
    assert_eq!(refunded.status, OrderStatus::Refunded);
    assert_eq!(stock_of(&state, product.id).await?, 5);

    Ok(())
}
