//! Which portal screens each role may see.
//!
//! Navigation links, routes and action buttons all ask the same question:
//! is the current actor one of the roles allowed on this screen? The table
//! lives here so every caller answers it the same way.

use serde::{Deserialize, Serialize};

use cougarpost_core::Role;

/// A role-gated area of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Dashboard,
    CreatePackage,
    TrackPackage,
    Store,
    Cart,
    ManageStaff,
    UpdateStock,
    Reports,
    Deliveries,
}

impl Screen {
    /// Every screen, in navigation order.
    pub const ALL: [Self; 9] = [
        Self::Dashboard,
        Self::CreatePackage,
        Self::TrackPackage,
        Self::Store,
        Self::Cart,
        Self::ManageStaff,
        Self::UpdateStock,
        Self::Reports,
        Self::Deliveries,
    ];

    /// Roles allowed to open this screen.
    #[must_use]
    pub const fn allowed_roles(self) -> &'static [Role] {
        use Role::{Admin, Clerk, Customer, Driver, Manager};

        match self {
            Self::Dashboard | Self::TrackPackage => &[Customer, Admin, Manager, Driver, Clerk],
            Self::CreatePackage => &[Customer, Clerk],
            Self::Store | Self::Cart => &[Customer],
            Self::ManageStaff | Self::Reports => &[Admin, Manager],
            Self::UpdateStock => &[Admin, Manager, Clerk],
            Self::Deliveries => &[Driver],
        }
    }

    /// Whether `role` may open this screen.
    #[must_use]
    pub fn allows(self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }

    /// Human-readable title for menus.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::CreatePackage => "Create Package",
            Self::TrackPackage => "Track Package",
            Self::Store => "Store",
            Self::Cart => "Cart",
            Self::ManageStaff => "Manage Staff",
            Self::UpdateStock => "Update Stock",
            Self::Reports => "Reports",
            Self::Deliveries => "Deliveries",
        }
    }
}
