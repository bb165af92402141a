//! Route authorization.
//!
//! Every protected handler takes an [`Authorized<G>`] where the guard `G`
//! names how access is decided:
//!
//! * [`Strategy::Claims`] compares the role name inside the access token with
//!   an allow-list. No database round trip, so a role change only applies
//!   once the user gets a new token.
//! * [`Strategy::Score`] re-reads the user's role score and compares it with
//!   the `required_score` of the named permission action.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    entity::{Permissions, Roles, Users, permissions},
    error::{AppError, AppResult},
    middleware::auth::{ADMIN_ROLE, AuthUser},
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Claims(&'static [&'static str]),
    Score(&'static str),
}

pub trait Guard: Send + Sync + 'static {
    const STRATEGY: Strategy;
}

macro_rules! guards {
    ($($name:ident => $strategy:expr;)*) => {
        $(
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl Guard for $name {
                const STRATEGY: Strategy = $strategy;
            }
        )*
    };
}

guards! {
    AdminRole => Strategy::Claims(&[ADMIN_ROLE]);

    ManageCategories => Strategy::Score("manage_categories");
    ManageProducts => Strategy::Score("manage_products");
    ManageHeroes => Strategy::Score("manage_heroes");

    CreateOrder => Strategy::Score("create_order");
    ManageOrders => Strategy::Score("manage_orders");
    ViewOwnOrders => Strategy::Score("view_own_orders");
    ViewOrder => Strategy::Score("view_order");
    CancelOrder => Strategy::Score("cancel_order");

    ManageTransactions => Strategy::Score("manage_transactions");
    ViewOwnTransactions => Strategy::Score("view_own_transactions");

    CreateRole => Strategy::Score("create_role");
    ViewRole => Strategy::Score("view_role");
    UpdateRole => Strategy::Score("update_role");
    DeleteRole => Strategy::Score("delete_role");

    ViewPermission => Strategy::Score("view_permission");
    CreatePermission => Strategy::Score("create_permission");
    UpdatePermission => Strategy::Score("update_permission");
    DeletePermission => Strategy::Score("delete_permission");

    ListAddresses => Strategy::Score("list_addresses");
    DeleteAddress => Strategy::Score("delete_address");
}

/// Authenticated user that passed guard `G`.
#[derive(Debug, Clone)]
pub struct Authorized<G>(pub AuthUser, PhantomData<G>);

impl<G> Authorized<G> {
    pub fn user(&self) -> &AuthUser {
        &self.0
    }
}

pub fn check_roles(user: &AuthUser, allowed: &[&str]) -> AppResult<()> {
    if allowed.iter().any(|role| *role == user.role) {
        return Ok(());
    }
    Err(AppError::forbidden(format!(
        "Access denied. Required roles: {}",
        allowed.join(", ")
    )))
}

/// `required` is `None` when no live permission exists for the action.
pub fn evaluate_score(required: Option<i32>, current: i32) -> AppResult<()> {
    let Some(required) = required else {
        return Err(AppError::forbidden("Action not permitted"));
    };
    if current < required {
        return Err(AppError::InsufficientScore {
            required_score: required,
            current_score: current,
        });
    }
    Ok(())
}

async fn current_score(state: &AppState, user_id: Uuid) -> AppResult<i32> {
    let found = Users::find_by_id(user_id)
        .find_also_related(Roles)
        .one(&state.orm)
        .await?;
    match found {
        Some((_, Some(role))) if role.deleted_at.is_none() && role.is_active => Ok(role.score),
        _ => Err(AppError::forbidden("User role not found")),
    }
}

async fn required_score(state: &AppState, action: &str) -> AppResult<Option<i32>> {
    let permission = Permissions::find_effective()
        .filter(permissions::Column::Action.eq(action))
        .order_by_asc(permissions::Column::RequiredScore)
        .one(&state.orm)
        .await?;
    Ok(permission.map(|p| p.required_score))
}

impl<G: Guard> FromRequestParts<AppState> for Authorized<G> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        match G::STRATEGY {
            Strategy::Claims(roles) => check_roles(&user, roles)?,
            Strategy::Score(action) => {
                let current = current_score(state, user.user_id).await?;
                let required = required_score(state, action).await?;
                if let Err(err) = evaluate_score(required, current) {
                    tracing::debug!(user = %user.user_id, action, current, ?required, "access denied");
                    return Err(err);
                }
            }
        }

        Ok(Authorized(user, PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: "someone@example.com".into(),
            name: "Someone".into(),
            role: role.into(),
            role_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn claims_strategy_matches_role_names_exactly() {
        assert!(check_roles(&user("ADMIN"), &["ADMIN"]).is_ok());
        let err = check_roles(&user("admin"), &["ADMIN", "MANAGER"]).unwrap_err();
        assert_eq!(err.to_string(), "Access denied. Required roles: ADMIN, MANAGER");
    }

    #[test]
    fn score_at_threshold_is_allowed() {
        assert!(evaluate_score(Some(50), 50).is_ok());
        assert!(evaluate_score(Some(0), 0).is_ok());
    }

    #[test]
    fn low_score_reports_both_values() {
        match evaluate_score(Some(50), 10) {
            Err(AppError::InsufficientScore {
                required_score,
                current_score,
            }) => assert_eq!((required_score, current_score), (50, 10)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_action_is_not_permitted() {
        let err = evaluate_score(None, 999).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref msg) if msg == "Action not permitted"));
    }

    #[test]
    fn guards_declare_their_strategy() {
        assert_eq!(AdminRole::STRATEGY, Strategy::Claims(&["ADMIN"]));
        assert_eq!(ManageOrders::STRATEGY, Strategy::Score("manage_orders"));
    }
}
