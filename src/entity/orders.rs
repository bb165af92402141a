use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::transactions::TransactionStatus;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PROCESSING")]
    Processing,
    #[sea_orm(string_value = "SHIPPED")]
    Shipped,
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "REFUNDED")]
    Refunded,
}

impl OrderStatus {
    pub fn parse(value: &str) -> Option<Self> {
        Self::try_from_value(&value.to_owned()).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }

    /// Terminal orders stay put; any order may still be refunded.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        *self == next || next == OrderStatus::Refunded || !self.is_terminal()
    }

    /// Whether moving to `next` hands the reserved stock back. Shared by the
    /// admin status change, customer cancellation and the payment cascade.
    pub fn returns_stock_on(&self, next: OrderStatus) -> bool {
        next == OrderStatus::Cancelled && !self.is_terminal()
    }

    /// Transaction status implied by moving the order into this status.
    pub fn cascade_to_transaction(&self) -> Option<TransactionStatus> {
        match self {
            OrderStatus::Delivered => Some(TransactionStatus::Completed),
            OrderStatus::Cancelled => Some(TransactionStatus::Cancelled),
            OrderStatus::Refunded => Some(TransactionStatus::Refunded),
            _ => None,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "STRIPE")]
    Stripe,
    #[sea_orm(string_value = "PAYPAL")]
    Paypal,
    #[sea_orm(string_value = "CASH_ON_DELIVERY")]
    CashOnDelivery,
    #[sea_orm(string_value = "BANK_TRANSFER")]
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Stripe => "STRIPE",
            PaymentMethod::Paypal => "PAYPAL",
            PaymentMethod::CashOnDelivery => "CASH_ON_DELIVERY",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
    #[sea_orm(has_one = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names_only() {
        assert_eq!(OrderStatus::parse("SHIPPED"), Some(OrderStatus::Shipped));
        assert_eq!(OrderStatus::parse("shipped"), None);
        assert_eq!(OrderStatus::parse("LOST"), None);
    }

    #[test]
    fn order_status_drives_transaction_status() {
        assert_eq!(
            OrderStatus::Delivered.cascade_to_transaction(),
            Some(TransactionStatus::Completed)
        );
        assert_eq!(
            OrderStatus::Cancelled.cascade_to_transaction(),
            Some(TransactionStatus::Cancelled)
        );
        assert_eq!(
            OrderStatus::Refunded.cascade_to_transaction(),
            Some(TransactionStatus::Refunded)
        );
        assert_eq!(OrderStatus::Shipped.cascade_to_transaction(), None);
        assert_eq!(OrderStatus::Processing.cascade_to_transaction(), None);
    }

    #[test]
    fn terminal_orders_only_allow_refund() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::Refunded));
        assert!(OrderStatus::Cancelled.can_transition_to(OrderStatus::Refunded));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Refunded));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Refunded.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn every_live_order_returns_stock_when_cancelled() {
        for open in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            assert!(open.returns_stock_on(OrderStatus::Cancelled));
        }
        assert!(!OrderStatus::Cancelled.returns_stock_on(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipped.returns_stock_on(OrderStatus::Refunded));
        assert!(!OrderStatus::Delivered.returns_stock_on(OrderStatus::Cancelled));
    }

    #[test]
    fn only_open_orders_are_cancellable() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Processing.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn payment_method_serializes_like_the_column() {
        assert_eq!(
            serde_json::to_value(PaymentMethod::CashOnDelivery).unwrap(),
            serde_json::json!("CASH_ON_DELIVERY")
        );
    }
}
