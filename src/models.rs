use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    addresses, categories,
    heroes::{self, HeroStatus},
    order_items,
    orders::{self, OrderStatus, PaymentMethod},
    permissions, products,
    products::ProductStatus,
    roles,
    transactions::{self, TransactionStatus},
    users,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoleSummary {
    pub id: Uuid,
    pub name: String,
    pub score: i32,
    pub description: Option<String>,
}

impl From<roles::Model> for RoleSummary {
    fn from(model: roles::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            score: model.score,
            description: model.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoleView {
    pub id: Uuid,
    pub name: String,
    pub score: i32,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<roles::Model> for RoleView {
    fn from(model: roles::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            score: model.score,
            description: model.description,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// User without credentials. `role` is present when the role was loaded.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleSummary>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserView {
    pub fn with_role(model: users::Model, role: Option<roles::Model>) -> Self {
        let mut view = Self::from(model);
        view.role = role.map(RoleSummary::from);
        view
    }
}

impl From<users::Model> for UserView {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            phone: model.phone,
            avatar: model.avatar,
            role_id: model.role_id,
            role: None,
            last_login: model.last_login.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<users::Model> for UserSummary {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
        }
    }
}

/// Permission as granted to a role in auth responses.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PermissionGrant {
    pub module: String,
    pub action: String,
    pub resource: Option<String>,
    pub required_score: i32,
}

impl From<permissions::Model> for PermissionGrant {
    fn from(model: permissions::Model) -> Self {
        Self {
            module: model.module,
            action: model.action,
            resource: model.resource,
            required_score: model.required_score,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PermissionView {
    pub id: i32,
    pub module: String,
    pub action: String,
    pub resource: Option<String>,
    pub required_score: i32,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<permissions::Model> for PermissionView {
    fn from(model: permissions::Model) -> Self {
        Self {
            id: model.id,
            module: model.module,
            action: model.action,
            resource: model.resource,
            required_score: model.required_score,
            description: model.description,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            deleted_at: model.deleted_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl From<categories::Model> for CategorySummary {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            icon: model.icon,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<ProductView>>,
}

impl From<categories::Model> for CategoryView {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            icon: model.icon,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            products: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub images: Vec<String>,
    pub category_id: Uuid,
    pub stock: i32,
    pub rating: Decimal,
    pub reviews: i32,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySummary>,
}

impl ProductView {
    pub fn with_category(model: products::Model, category: Option<categories::Model>) -> Self {
        let mut view = Self::from(model);
        view.category = category.map(CategorySummary::from);
        view
    }
}

impl From<products::Model> for ProductView {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            images: model.images,
            category_id: model.category_id,
            stock: model.stock,
            rating: model.rating,
            reviews: model.reviews,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            category: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub images: Vec<String>,
    pub stock: i32,
    pub status: ProductStatus,
}

impl From<products::Model> for ProductSummary {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            images: model.images,
            stock: model.stock,
            status: model.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItemView {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSummary>,
}

impl OrderItemView {
    pub fn with_product(model: order_items::Model, product: Option<products::Model>) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            price: model.price,
            product: product.map(ProductSummary::from),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

impl From<orders::Model> for OrderView {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            status: model.status,
            payment_method: model.payment_method,
            total_amount: model.total_amount,
            shipping_address: model.shipping_address,
            tracking_number: model.tracking_number,
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            items: Vec::new(),
            transaction: None,
            user: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
}

impl From<orders::Model> for OrderSummary {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            status: model.status,
            total_amount: model.total_amount,
            shipping_address: model.shipping_address,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionView {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderSummary>,
}

impl TransactionView {
    pub fn with_order(model: transactions::Model, order: Option<orders::Model>) -> Self {
        let mut view = Self::from(model);
        view.order = order.map(OrderSummary::from);
        view
    }
}

impl From<transactions::Model> for TransactionView {
    fn from(model: transactions::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            amount: model.amount,
            status: model.status,
            method: model.method,
            transaction_id: model.transaction_id,
            metadata: model.metadata,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            order: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HeroView {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image: String,
    pub bg_color: Option<String>,
    pub cta: Option<String>,
    pub category_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub price: Option<String>,
    pub badge: Option<String>,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub status: HeroStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySummary>,
}

impl HeroView {
    pub fn with_links(
        model: heroes::Model,
        product: Option<products::Model>,
        category: Option<categories::Model>,
    ) -> Self {
        let mut view = Self::from(model);
        view.product = product.map(ProductSummary::from);
        view.category = category.map(CategorySummary::from);
        view
    }
}

impl From<heroes::Model> for HeroView {
    fn from(model: heroes::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            subtitle: model.subtitle,
            description: model.description,
            image: model.image,
            bg_color: model.bg_color,
            cta: model.cta,
            category_id: model.category_id,
            product_id: model.product_id,
            price: model.price,
            badge: model.badge,
            display_order: model.display_order,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            product: None,
            category: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AddressView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<addresses::Model> for AddressView {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            address: model.address,
            city: model.city,
            state: model.state,
            zip: model.zip,
            phone: model.phone,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
