use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
    #[sea_orm(string_value = "out_of_stock")]
    OutOfStock,
}

impl ProductStatus {
    /// Status a product should carry once its stock becomes `stock`.
    ///
    /// Empty stock always means `out_of_stock`; a restock only revives
    /// products that were out of stock, so `inactive` stays `inactive`.
    pub fn for_stock(stock: i32, current: ProductStatus) -> ProductStatus {
        if stock <= 0 {
            ProductStatus::OutOfStock
        } else if current == ProductStatus::OutOfStock {
            ProductStatus::Active
        } else {
            current
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
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
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Categories,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::ProductStatus::{self, *};

    #[test]
    fn empty_stock_is_out_of_stock() {
        for current in [Active, Inactive, OutOfStock] {
            assert_eq!(ProductStatus::for_stock(0, current), OutOfStock);
        }
    }

    #[test]
    fn restock_revives_only_out_of_stock() {
        assert_eq!(ProductStatus::for_stock(5, OutOfStock), Active);
        assert_eq!(ProductStatus::for_stock(5, Inactive), Inactive);
        assert_eq!(ProductStatus::for_stock(5, Active), Active);
    }
}
