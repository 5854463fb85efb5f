//! Client route table and the access guard in front of it.

/// Public entry point; the only route reachable without a session.
pub const LOGIN: &str = "/login";

/// Landing route after login and fallback for unknown paths.
pub const DASHBOARD: &str = "/dashboard";

/// Routes that require an authenticated session.
pub const PROTECTED: &[&str] = &[
    DASHBOARD,
    "/plan-comptable",
    "/ecritures",
    "/etats-financiers",
    "/exercices",
    "/analytics",
    "/rapprochement",
    "/entites",
    "/notifications",
    "/audit",
];

/// Route the shell should display, published at [`AppRoute::PATH`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRoute(pub String);

impl AppRoute {
    pub const PATH: &'static str = "app/route";

    pub fn login() -> Self {
        AppRoute(LOGIN.to_string())
    }

    pub fn dashboard() -> Self {
        AppRoute(DASHBOARD.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Resolve where a navigation to `path` actually lands.
///
/// Without a session everything leads to the login page. With one, the
/// login page, the root and unknown paths land on the dashboard.
pub fn guard(path: &str, authenticated: bool) -> &str {
    if !authenticated {
        return LOGIN;
    }
    let path = normalize(path);
    if PROTECTED.contains(&path) {
        path
    } else {
        DASHBOARD
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => "/",
        p => p,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_always_lands_on_login() {
        assert_eq!(guard("/dashboard", false), LOGIN);
        assert_eq!(guard("/ecritures", false), LOGIN);
        assert_eq!(guard("/login", false), LOGIN);
        assert_eq!(guard("/nowhere", false), LOGIN);
    }

    #[test]
    fn authenticated_reaches_protected_routes() {
        assert_eq!(guard("/plan-comptable", true), "/plan-comptable");
        assert_eq!(guard("/audit/", true), "/audit");
        assert_eq!(guard("/ecritures?page=2", true), "/ecritures");
    }

    #[test]
    fn authenticated_fallbacks() {
        assert_eq!(guard("/", true), DASHBOARD);
        assert_eq!(guard("", true), DASHBOARD);
        assert_eq!(guard("/login", true), DASHBOARD);
        assert_eq!(guard("/unknown/page", true), DASHBOARD);
    }

    #[test]
    fn app_route_constructors() {
        assert_eq!(AppRoute::login().as_str(), "/login");
        assert_eq!(AppRoute::dashboard().as_str(), "/dashboard");
    }
}
