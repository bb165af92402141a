use sea_orm::{
    ColumnTrait, EntityTrait,
    sea_query::{Expr, Func, SimpleExpr},
};

pub mod address_service;
pub mod auth_service;
pub mod category_service;
pub mod file_service;
pub mod hero_service;
pub mod order_service;
pub mod permission_service;
pub mod product_service;
pub mod role_service;
pub mod token_service;
pub mod transaction_service;

/// Case-insensitive substring match on a table-qualified column.
pub(crate) fn contains_ci<E, C>(entity: E, column: C, needle: &str) -> SimpleExpr
where
    E: EntityTrait,
    C: ColumnTrait,
{
    let pattern = format!("%{}%", needle.to_lowercase());
    Expr::expr(Func::lower(Expr::col((entity, column)))).like(pattern)
}
