//! Roles and the permission matrix.

use serde::{Deserialize, Serialize};

/// User role. Closed set - an unrecognized role cannot be constructed,
/// so every permission check is an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Staff roles land on the admin dashboard, not the storefront.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }

    /// The full permission set granted by this role.
    pub fn permissions(self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Self::Customer => &[
                ProductsRead,
                OrdersRead,
                UsersRead,
                CartManage,
                WishlistManage,
                CheckoutWrite,
            ],
            Self::Admin => &[
                ProductsRead,
                ProductsCreate,
                ProductsUpdate,
                ProductsDelete,
                OrdersRead,
                OrdersUpdate,
                UsersRead,
                UsersUpdate,
                AdminRead,
                AdminWrite,
                AnalyticsRead,
            ],
            Self::SuperAdmin => Permission::ALL,
        }
    }

    pub fn has_permission(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single grantable permission, in `scope:verb` form on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "products:read")]
    ProductsRead,
    #[serde(rename = "products:create")]
    ProductsCreate,
    #[serde(rename = "products:update")]
    ProductsUpdate,
    #[serde(rename = "products:delete")]
    ProductsDelete,
    #[serde(rename = "orders:read")]
    OrdersRead,
    #[serde(rename = "orders:update")]
    OrdersUpdate,
    #[serde(rename = "orders:delete")]
    OrdersDelete,
    #[serde(rename = "users:read")]
    UsersRead,
    #[serde(rename = "users:update")]
    UsersUpdate,
    #[serde(rename = "users:delete")]
    UsersDelete,
    #[serde(rename = "admin:read")]
    AdminRead,
    #[serde(rename = "admin:write")]
    AdminWrite,
    #[serde(rename = "admin:delete")]
    AdminDelete,
    #[serde(rename = "analytics:read")]
    AnalyticsRead,
    #[serde(rename = "cart:manage")]
    CartManage,
    #[serde(rename = "wishlist:manage")]
    WishlistManage,
    #[serde(rename = "checkout:write")]
    CheckoutWrite,
}

impl Permission {
    /// Every permission in the system.
    pub const ALL: &'static [Permission] = &[
        Self::ProductsRead,
        Self::ProductsCreate,
        Self::ProductsUpdate,
        Self::ProductsDelete,
        Self::OrdersRead,
        Self::OrdersUpdate,
        Self::OrdersDelete,
        Self::UsersRead,
        Self::UsersUpdate,
        Self::UsersDelete,
        Self::AdminRead,
        Self::AdminWrite,
        Self::AdminDelete,
        Self::AnalyticsRead,
        Self::CartManage,
        Self::WishlistManage,
        Self::CheckoutWrite,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProductsRead => "products:read",
            Self::ProductsCreate => "products:create",
            Self::ProductsUpdate => "products:update",
            Self::ProductsDelete => "products:delete",
            Self::OrdersRead => "orders:read",
            Self::OrdersUpdate => "orders:update",
            Self::OrdersDelete => "orders:delete",
            Self::UsersRead => "users:read",
            Self::UsersUpdate => "users:update",
            Self::UsersDelete => "users:delete",
            Self::AdminRead => "admin:read",
            Self::AdminWrite => "admin:write",
            Self::AdminDelete => "admin:delete",
            Self::AnalyticsRead => "analytics:read",
            Self::CartManage => "cart:manage",
            Self::WishlistManage => "wishlist:manage",
            Self::CheckoutWrite => "checkout:write",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
