//! Application views and route guards.

use serde::{Deserialize, Serialize};

/// Current app view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppView {
    /// Public gallery
    Home,
    Login,
    Register,
    MonsterDetail(String),
    CreateMonster,
    MyMonsters,
    Profile,
    ChangePassword,
    /// Fallback for any path that matches no view
    NotFound,
}

impl AppView {
    /// Resolve a path; unknown paths become [`AppView::NotFound`]
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => AppView::Home,
            ["login"] => AppView::Login,
            ["register"] => AppView::Register,
            ["monster", id] => AppView::MonsterDetail((*id).to_string()),
            ["create-monster"] => AppView::CreateMonster,
            ["my-monsters"] => AppView::MyMonsters,
            ["profile"] => AppView::Profile,
            ["change-password"] => AppView::ChangePassword,
            _ => AppView::NotFound,
        }
    }

    pub fn path(&self) -> String {
        match self {
            AppView::Home => "/".to_string(),
            AppView::Login => "/login".to_string(),
            AppView::Register => "/register".to_string(),
            AppView::MonsterDetail(id) => format!("/monster/{}", id),
            AppView::CreateMonster => "/create-monster".to_string(),
            AppView::MyMonsters => "/my-monsters".to_string(),
            AppView::Profile => "/profile".to_string(),
            AppView::ChangePassword => "/change-password".to_string(),
            AppView::NotFound => "/404".to_string(),
        }
    }

    /// Only reachable with a session
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            AppView::CreateMonster | AppView::MyMonsters | AppView::Profile | AppView::ChangePassword
        )
    }

    /// Only reachable without a session
    pub fn public_only(&self) -> bool {
        matches!(self, AppView::Login | AppView::Register)
    }

    /// Where navigation to `self` actually lands
    pub fn guard(self, authenticated: bool) -> AppView {
        if self.requires_auth() && !authenticated {
            AppView::Login
        } else if self.public_only() && authenticated {
            AppView::Home
        } else {
            self
        }
    }
}
