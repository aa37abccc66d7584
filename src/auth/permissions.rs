/*!
 * # Permissions Module
 *
 * Permissions are `resource:action` strings granted per role. Admins hold the
 * wildcard and pass every check.
 */

use crate::entities::user::UserRole;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Common permission string constants for compile-time safety
pub mod consts {
    pub const ALL: &str = "*";

    // Customer
    pub const ORDERS_CREATE: &str = "orders:create";
    pub const ORDERS_READ_OWN: &str = "orders:read_own";
    pub const AFFILIATES_APPLY: &str = "affiliates:apply";
    pub const STORES_APPLY: &str = "stores:apply";

    // Seller
    pub const STORE_MANAGE: &str = "store:manage";
    pub const PRODUCTS_MANAGE: &str = "products:manage";
    pub const PROMOTIONS_MANAGE_OWN: &str = "promotions:manage_own";
    pub const FLASH_SALES_MANAGE_OWN: &str = "flash_sales:manage_own";
    pub const ORDERS_FULFILL: &str = "orders:fulfill";
    pub const SHIPMENTS_MANAGE: &str = "shipments:manage";
}

lazy_static! {
    static ref ROLE_PERMISSIONS: HashMap<UserRole, Vec<&'static str>> = {
        use consts::*;

        let customer = vec![ORDERS_CREATE, ORDERS_READ_OWN, AFFILIATES_APPLY, STORES_APPLY];

        let mut seller = customer.clone();
        seller.extend([
            STORE_MANAGE,
            PRODUCTS_MANAGE,
            PROMOTIONS_MANAGE_OWN,
            FLASH_SALES_MANAGE_OWN,
            ORDERS_FULFILL,
            SHIPMENTS_MANAGE,
        ]);

        let mut map = HashMap::new();
        map.insert(UserRole::Customer, customer);
        map.insert(UserRole::Seller, seller);
        map.insert(UserRole::Admin, vec![ALL]);
        map
    };
}

/// Permissions granted to a role, as carried in access tokens.
pub fn permissions_for_role(role: UserRole) -> Vec<String> {
    ROLE_PERMISSIONS
        .get(&role)
        .map(|perms| perms.iter().map(|p| p.to_string()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seller_extends_customer_permissions() {
        let customer = permissions_for_role(UserRole::Customer);
        let seller = permissions_for_role(UserRole::Seller);
        assert!(customer.iter().all(|p| seller.contains(p)));
        assert!(seller.contains(&consts::PRODUCTS_MANAGE.to_string()));
        assert!(!customer.contains(&consts::PRODUCTS_MANAGE.to_string()));
    }

    #[test]
    fn admin_holds_wildcard() {
        assert_eq!(permissions_for_role(UserRole::Admin), vec!["*".to_string()]);
    }
}
