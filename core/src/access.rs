//! Roles, capabilities and the dashboard route guard.
//!
//! # Design
//! UI code asks "may this user do X?" against a closed `Capability` set
//! computed once from the role, rather than comparing role strings at each
//! call site.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::navigate::{DASHBOARD_ROUTE, LOGIN_ROUTE};
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Volunteer,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Volunteer => "volunteer",
            Role::Student => "student",
        }
    }

    pub fn capabilities(self) -> Capabilities {
        let base = Capabilities::EMPTY
            .with(Capability::ViewDashboard)
            .with(Capability::CreateProject)
            .with(Capability::InviteUser)
            .with(Capability::ViewReports);
        match self {
            Role::Admin => base
                .with(Capability::CreateNews)
                .with(Capability::CreateEvent)
                .with(Capability::UploadMedia)
                .with(Capability::AdminPanel)
                .with(Capability::ManageUsers),
            Role::Volunteer | Role::Student => base,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ViewDashboard,
    CreateProject,
    InviteUser,
    ViewReports,
    CreateNews,
    CreateEvent,
    UploadMedia,
    AdminPanel,
    ManageUsers,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::ViewDashboard,
        Capability::CreateProject,
        Capability::InviteUser,
        Capability::ViewReports,
        Capability::CreateNews,
        Capability::CreateEvent,
        Capability::UploadMedia,
        Capability::AdminPanel,
        Capability::ManageUsers,
    ];

    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// A set of capabilities packed into a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities(u16);

impl Capabilities {
    pub const EMPTY: Capabilities = Capabilities(0);

    pub const fn with(self, capability: Capability) -> Self {
        Capabilities(self.0 | capability.bit())
    }

    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

/// A sidebar or quick-action entry gated on a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub title: &'static str,
    pub url: &'static str,
    pub requires: Capability,
}

pub const NAV_ITEMS: &[NavItem] = &[NavItem {
    title: "Dashboard",
    url: DASHBOARD_ROUTE,
    requires: Capability::ViewDashboard,
}];

pub const QUICK_ACTIONS: &[NavItem] = &[
    NavItem { title: "Create Project", url: "/projects/new", requires: Capability::CreateProject },
    NavItem { title: "Invite User", url: "/users/invite", requires: Capability::InviteUser },
    NavItem { title: "View Reports", url: "/reports", requires: Capability::ViewReports },
    NavItem { title: "Create News", url: "/news/new", requires: Capability::CreateNews },
    NavItem { title: "Create Event", url: "/events/new", requires: Capability::CreateEvent },
    NavItem { title: "Upload Media", url: "/media/upload", requires: Capability::UploadMedia },
    NavItem { title: "Admin Panel", url: "/admin", requires: Capability::AdminPanel },
    NavItem { title: "Manage Users", url: "/admin/users", requires: Capability::ManageUsers },
];

/// Entries from `items` the holder of `capabilities` may see, in order.
pub fn visible(items: &[NavItem], capabilities: Capabilities) -> Vec<NavItem> {
    items
        .iter()
        .filter(|item| capabilities.contains(item.requires))
        .copied()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow(Capabilities),
    Redirect(&'static str),
}

/// Gate for the dashboard shell: signed-in users pass with their
/// capabilities, everyone else is sent to the login route.
pub fn guard_dashboard(session: &SessionStore) -> RouteDecision {
    match session.user() {
        Some(user) if user.role.capabilities().contains(Capability::ViewDashboard) => {
            RouteDecision::Allow(user.role.capabilities())
        }
        _ => RouteDecision::Redirect(LOGIN_ROUTE),
    }
}
