use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::orders::{OrderStatus, PaymentMethod};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "FAILED")]
    Failed,
    #[sea_orm(string_value = "REFUNDED")]
    Refunded,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Refunded => "REFUNDED",
            TransactionStatus::Cancelled => "CANCELLED",
        }
    }

    /// Order status implied by moving the transaction into this status,
    /// given the order's current status.
    pub fn cascade_to_order(&self, current: OrderStatus) -> Option<OrderStatus> {
        match self {
            TransactionStatus::Completed if current == OrderStatus::Pending => {
                Some(OrderStatus::Processing)
            }
            TransactionStatus::Failed | TransactionStatus::Cancelled => {
                Some(OrderStatus::Cancelled)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_id: Uuid,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub method: PaymentMethod,
    /// Reference returned by the payment provider.
    pub transaction_id: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id"
    )]
    Orders,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_payment_moves_pending_order_to_processing() {
        assert_eq!(
            TransactionStatus::Completed.cascade_to_order(OrderStatus::Pending),
            Some(OrderStatus::Processing)
        );
        assert_eq!(
            TransactionStatus::Completed.cascade_to_order(OrderStatus::Shipped),
            None
        );
    }

    #[test]
    fn failed_or_cancelled_payment_cancels_order() {
        for status in [TransactionStatus::Failed, TransactionStatus::Cancelled] {
            assert_eq!(
                status.cascade_to_order(OrderStatus::Processing),
                Some(OrderStatus::Cancelled)
            );
        }
    }

    #[test]
    fn refund_and_pending_leave_order_alone() {
        assert_eq!(
            TransactionStatus::Refunded.cascade_to_order(OrderStatus::Delivered),
            None
        );
        assert_eq!(
            TransactionStatus::Pending.cascade_to_order(OrderStatus::Pending),
            None
        );
    }
}
