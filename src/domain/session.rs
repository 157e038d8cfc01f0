use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Staff role as reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    OwnerManager,
    StockController,
    Seller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ManageProducts,
    ViewProducts,
    ManageSales,
    ViewSales,
    ManageCustomers,
    ViewReports,
    DeleteData,
}

impl Role {
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::OwnerManager => &[
                ManageProducts,
                ViewProducts,
                ManageSales,
                ViewSales,
                ManageCustomers,
                ViewReports,
                DeleteData,
            ],
            Role::StockController => &[ManageProducts, ViewProducts, ViewSales, ViewReports],
            Role::Seller => &[ViewProducts, ManageSales, ViewSales, ManageCustomers, ViewReports],
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::OwnerManager => "Owner/Manager",
            Role::StockController => "Stock Controller",
            Role::Seller => "Seller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Owner/Manager" => Ok(Role::OwnerManager),
            "Stock Controller" => Ok(Role::StockController),
            "Seller" => Ok(Role::Seller),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("{role} may not perform {permission:?}")]
pub struct AccessDenied {
    pub role: Role,
    pub permission: Permission,
}

/// The signed-in caller, as handed over by the identity provider.
///
/// Passed explicitly into every mutating operation; nothing in the crate
/// keeps a "current user".
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

impl Session {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            role,
        }
    }

    pub fn require(&self, permission: Permission) -> Result<(), AccessDenied> {
        if self.role.allows(permission) {
            Ok(())
        } else {
            Err(AccessDenied {
                role: self.role,
                permission,
            })
        }
    }
}
