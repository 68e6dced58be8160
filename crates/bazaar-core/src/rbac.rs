//! Route-based access control.
//!
//! A static, ordered rule table evaluated top to bottom, first match wins.
//! A guarded path with no matching rule is denied for every role. The
//! public allowlist is scoped by method, so `GET /api/products` is public
//! while a `DELETE` on the same prefix is not.

use crate::domain::{Permission, Role};

/// Path matcher. `Prefix` matches on whole path segments, so
/// `Prefix("/admin")` matches `/admin` and `/admin/users` but not
/// `/administrator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPattern {
    Exact(&'static str),
    Prefix(&'static str),
}

impl PathPattern {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => path == *p,
            Self::Prefix(p) => path
                .strip_prefix(p)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }
}

/// One row of the authorization table. An empty method list matches any
/// method; an empty permission list means "any authenticated principal".
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub methods: &'static [&'static str],
    pub path: PathPattern,
    pub required: &'static [Permission],
}

impl RouteRule {
    fn matches(&self, method: &str, path: &str) -> bool {
        (self.methods.is_empty() || self.methods.iter().any(|m| *m == method))
            && self.path.matches(path)
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteVerdict {
    pub allowed: bool,
    pub missing: Vec<Permission>,
}

/// A public route: authorization is bypassed entirely.
#[derive(Debug, Clone)]
struct PublicRoute {
    methods: &'static [&'static str],
    path: PathPattern,
}

use Permission::*;
use PathPattern::{Exact, Prefix};

const RULES: &[RouteRule] = &[
    // Session endpoints: any authenticated principal.
    RouteRule {
        methods: &[],
        path: Exact("/api/auth/me"),
        required: &[],
    },
    RouteRule {
        methods: &[],
        path: Exact("/api/auth/logout"),
        required: &[],
    },
    // Admin API, split by verb.
    RouteRule {
        methods: &["GET"],
        path: Prefix("/api/admin"),
        required: &[AdminRead],
    },
    RouteRule {
        methods: &["POST", "PUT", "PATCH"],
        path: Prefix("/api/admin"),
        required: &[AdminWrite],
    },
    RouteRule {
        methods: &["DELETE"],
        path: Prefix("/api/admin"),
        required: &[AdminDelete],
    },
    // Admin pages.
    RouteRule {
        methods: &[],
        path: Prefix("/admin"),
        required: &[AdminRead],
    },
    // Customer surface.
    RouteRule {
        methods: &[],
        path: Prefix("/api/cart"),
        required: &[CartManage],
    },
    RouteRule {
        methods: &[],
        path: Exact("/cart"),
        required: &[CartManage],
    },
    RouteRule {
        methods: &[],
        path: Prefix("/api/wishlist"),
        required: &[WishlistManage],
    },
    RouteRule {
        methods: &[],
        path: Exact("/wishlist"),
        required: &[WishlistManage],
    },
    RouteRule {
        methods: &[],
        path: Prefix("/api/checkout"),
        required: &[CheckoutWrite],
    },
    RouteRule {
        methods: &[],
        path: Exact("/checkout"),
        required: &[CheckoutWrite],
    },
    // Orders.
    RouteRule {
        methods: &["GET"],
        path: Prefix("/api/orders"),
        required: &[OrdersRead],
    },
    RouteRule {
        methods: &["PUT", "PATCH"],
        path: Prefix("/api/orders"),
        required: &[OrdersUpdate],
    },
    RouteRule {
        methods: &["DELETE"],
        path: Prefix("/api/orders"),
        required: &[OrdersDelete],
    },
    RouteRule {
        methods: &[],
        path: Exact("/orders"),
        required: &[OrdersRead],
    },
    // Profile.
    RouteRule {
        methods: &[],
        path: Prefix("/api/profile"),
        required: &[UsersRead],
    },
    RouteRule {
        methods: &[],
        path: Prefix("/profile"),
        required: &[UsersRead],
    },
    // User management.
    RouteRule {
        methods: &["GET"],
        path: Prefix("/api/users"),
        required: &[UsersRead],
    },
    RouteRule {
        methods: &["PUT", "PATCH"],
        path: Prefix("/api/users"),
        required: &[UsersUpdate],
    },
    RouteRule {
        methods: &["DELETE"],
        path: Prefix("/api/users"),
        required: &[UsersDelete],
    },
    // Analytics.
    RouteRule {
        methods: &["GET"],
        path: Prefix("/api/analytics"),
        required: &[AnalyticsRead],
    },
];

const PUBLIC: &[PublicRoute] = &[
    PublicRoute {
        methods: &["POST"],
        path: Exact("/api/auth/login"),
    },
    PublicRoute {
        methods: &["POST"],
        path: Exact("/api/auth/register"),
    },
    PublicRoute {
        methods: &["POST"],
        path: Exact("/api/auth/refresh"),
    },
    PublicRoute {
        methods: &["POST"],
        path: Exact("/api/auth/verify-email"),
    },
    PublicRoute {
        methods: &["POST"],
        path: Exact("/api/auth/request-password-reset"),
    },
    PublicRoute {
        methods: &["POST"],
        path: Exact("/api/auth/reset-password"),
    },
    PublicRoute {
        methods: &["GET"],
        path: Prefix("/api/products"),
    },
    PublicRoute {
        methods: &["GET"],
        path: Prefix("/api/recommendations"),
    },
    PublicRoute {
        methods: &["GET"],
        path: Prefix("/api/categories"),
    },
    PublicRoute {
        methods: &["GET"],
        path: Exact("/api/health"),
    },
    PublicRoute {
        methods: &["GET"],
        path: Exact("/login"),
    },
    PublicRoute {
        methods: &["GET"],
        path: Exact("/register"),
    },
    PublicRoute {
        methods: &["GET"],
        path: Prefix("/products"),
    },
    PublicRoute {
        methods: &["GET"],
        path: Prefix("/product"),
    },
    PublicRoute {
        methods: &["GET"],
        path: Prefix("/categories"),
    },
    PublicRoute {
        methods: &["GET"],
        path: Prefix("/category"),
    },
];

/// Paths intercepted by the auth middleware. Anything matching neither this
/// list nor the public allowlist is the implicitly-public surface and never
/// reaches the policy.
const GUARDED: &[PathPattern] = &[
    Prefix("/admin"),
    Prefix("/api/admin"),
    Exact("/cart"),
    Exact("/wishlist"),
    Exact("/checkout"),
    Exact("/orders"),
    Prefix("/profile"),
    Prefix("/api/cart"),
    Prefix("/api/wishlist"),
    Prefix("/api/checkout"),
    Prefix("/api/orders"),
    Prefix("/api/profile"),
    Prefix("/api/users"),
    Prefix("/api/analytics"),
    Exact("/api/auth/me"),
    Exact("/api/auth/logout"),
];

/// Pure authorization policy: no I/O, no clock, same inputs, same verdict.
#[derive(Debug, Clone)]
pub struct RbacPolicy {
    rules: &'static [RouteRule],
}

impl RbacPolicy {
    pub fn new() -> Self {
        Self { rules: RULES }
    }

    /// Build a policy over a custom rule table.
    pub fn with_rules(rules: &'static [RouteRule]) -> Self {
        Self { rules }
    }

    /// First matching rule decides; no rule means deny, whatever the role.
    pub fn authorize(&self, role: Role, method: &str, path: &str) -> RouteVerdict {
        for rule in self.rules {
            if rule.matches(method, path) {
                let missing: Vec<Permission> = rule
                    .required
                    .iter()
                    .copied()
                    .filter(|p| !role.has_permission(*p))
                    .collect();
                return RouteVerdict {
                    allowed: missing.is_empty(),
                    missing,
                };
            }
        }
        RouteVerdict {
            allowed: false,
            missing: Vec::new(),
        }
    }

    pub fn is_public(&self, method: &str, path: &str) -> bool {
        PUBLIC.iter().any(|route| {
            route.methods.iter().any(|m| *m == method) && route.path.matches(path)
        })
    }

    pub fn is_guarded(&self, path: &str) -> bool {
        GUARDED.iter().any(|pattern| pattern.matches(path))
    }
}

impl Default for RbacPolicy {
    fn default() -> Self {
        Self::new()
    }
}
