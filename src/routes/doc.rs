use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::AddressList, categories::CategoryList, heroes::{HeroList, ReorderResult},
        orders::OrderList, permissions::PermissionList, products::ProductList, roles::RoleList,
        transactions::{TransactionList, TransactionStats},
    },
    models::{
        AddressView, CategoryView, HeroView, OrderView, PermissionView, ProductView, RoleView,
        TransactionView, UserView,
    },
    response::{MessageBody, Meta},
    routes::{
        addresses, auth, categories, file, health, heroes, orders, permissions, products, roles,
        transactions,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::refresh,
        auth::forgot_password,
        auth::reset_password,
        auth::change_password,
        auth::profile,
        auth::update_profile,
        roles::create_role,
        roles::list_roles,
        roles::get_role,
        roles::update_role,
        roles::delete_role,
        permissions::list_permissions,
        permissions::create_permission,
        permissions::update_permission,
        permissions::delete_permission,
        permissions::restore_permission,
        categories::create_category,
        categories::list_categories,
        categories::get_category,
        categories::update_category,
        categories::delete_category,
        products::create_product,
        products::list_products,
        products::best_sellers,
        products::new_arrivals,
        products::get_product,
        products::update_product,
        products::delete_product,
        products::update_stock,
        orders::create_order,
        orders::list_orders,
        orders::my_orders,
        orders::get_order,
        orders::update_order_status,
        orders::cancel_order,
        transactions::create_transaction,
        transactions::list_transactions,
        transactions::transaction_stats,
        transactions::my_transactions,
        transactions::get_transaction,
        transactions::update_transaction_status,
        transactions::process_payment,
        heroes::create_hero,
        heroes::list_heroes,
        heroes::active_heroes,
        heroes::get_hero,
        heroes::update_hero,
        heroes::update_hero_order,
        heroes::reorder_heroes,
        heroes::toggle_hero_status,
        heroes::delete_hero,
        addresses::upsert_address,
        addresses::own_address,
        addresses::list_addresses,
        addresses::delete_address,
        file::delete_file
    ),
    components(
        schemas(
            Meta,
            MessageBody,
            UserView,
            RoleView,
            PermissionView,
            CategoryView,
            ProductView,
            OrderView,
            TransactionView,
            HeroView,
            AddressView,
            RoleList,
            PermissionList,
            CategoryList,
            ProductList,
            OrderList,
            TransactionList,
            TransactionStats,
            HeroList,
            ReorderResult,
            AddressList
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication and account endpoints"),
        (name = "Roles", description = "Role management"),
        (name = "Permissions", description = "Permission catalogue"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Transactions", description = "Payment transaction endpoints"),
        (name = "Heroes", description = "Storefront hero slides"),
        (name = "Addresses", description = "Shipping addresses"),
        (name = "File", description = "Uploaded asset management"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parts_are_registered_as_schemas() {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.expect("components").schemas;
        assert!(schemas.contains_key("Meta"));
        assert!(schemas.contains_key("MessageBody"));
    }

    #[test]
    fn hero_listing_documents_search() {
        let doc = ApiDoc::openapi();
        let item = doc.paths.paths.get("/api/heroes").expect("heroes path");
        let get = item.get.as_ref().expect("GET /api/heroes");
        let params = get.parameters.as_ref().expect("query parameters");
        assert!(params.iter().any(|p| p.name == "search"));
    }
}
