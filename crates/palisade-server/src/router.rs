//! Request routing and path matching.
//!
//! Maps method + path to an [`Operation`] using path templates with
//! `{param}` segments. Matching happens after the global guard stages run
//! and before the route's own chain (auth, validation) is selected.

use std::collections::HashMap;

use http::Method;

/// The operations the starter exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET /api` — API welcome document.
    Welcome,
    /// `GET /health` — liveness probe.
    Health,
    /// `POST /api/auth/signup`.
    Signup,
    /// `POST /api/auth/login`.
    Login,
    /// `GET /api/me` — current account.
    Me,
    /// `GET /api/users`.
    ListUsers,
    /// `GET /api/users/{id}`.
    GetUser,
    /// `PATCH /api/users/{id}`.
    UpdateUser,
    /// `DELETE /api/users/{id}`.
    DeleteUser,
}

impl Operation {
    /// Stable name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Health => "health",
            Self::Signup => "signup",
            Self::Login => "login",
            Self::Me => "me",
            Self::ListUsers => "listUsers",
            Self::GetUser => "getUser",
            Self::UpdateUser => "updateUser",
            Self::DeleteUser => "deleteUser",
        }
    }
}

/// A matched route with extracted path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    operation: Operation,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Returns the matched operation.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// Returns the extracted path parameters.
    #[must_use]
    pub const fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Consumes the match, yielding the parameter map.
    #[must_use]
    pub fn into_params(self) -> HashMap<String, String> {
        self.params
    }
}

/// A segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

/// A registered route.
#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<PathSegment>,
    operation: Operation,
}

impl Route {
    fn new(method: Method, pattern: &str, operation: Operation) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| {
                segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .map_or_else(
                        || PathSegment::Literal(segment.to_string()),
                        |name| PathSegment::Param(name.to_string()),
                    )
            })
            .collect();

        Self {
            method,
            segments,
            operation,
        }
    }

    fn match_path(&self, method: &Method, path: &str) -> Option<HashMap<String, String>> {
        if &self.method != method {
            return None;
        }

        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                PathSegment::Literal(expected) => {
                    if expected != part {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    params.insert(name.clone(), (*part).to_string());
                }
            }
        }

        Some(params)
    }
}

/// Routes requests to operations.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the starter's route table.
    #[must_use]
    pub fn with_default_routes() -> Self {
        let mut router = Self::new();
        router.add_route(Method::GET, "/health", Operation::Health);
        router.add_route(Method::GET, "/api", Operation::Welcome);
        router.add_route(Method::POST, "/api/auth/signup", Operation::Signup);
        router.add_route(Method::POST, "/api/auth/login", Operation::Login);
        router.add_route(Method::GET, "/api/me", Operation::Me);
        router.add_route(Method::GET, "/api/users", Operation::ListUsers);
        router.add_route(Method::GET, "/api/users/{id}", Operation::GetUser);
        router.add_route(Method::PATCH, "/api/users/{id}", Operation::UpdateUser);
        router.add_route(Method::DELETE, "/api/users/{id}", Operation::DeleteUser);
        router
    }

    /// Registers a route.
    pub fn add_route(&mut self, method: Method, pattern: &str, operation: Operation) {
        self.routes.push(Route::new(method, pattern, operation));
    }

    /// Matches a request, returning the operation and path parameters.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes.iter().find_map(|route| {
            route.match_path(method, path).map(|params| RouteMatch {
                operation: route.operation,
                params,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_route_matches() {
        let router = Router::with_default_routes();
        let matched = router.match_route(&Method::GET, "/health").unwrap();
        assert_eq!(matched.operation(), Operation::Health);
        assert!(matched.params().is_empty());
    }

    #[test]
    fn test_param_extraction() {
        let router = Router::with_default_routes();
        let matched = router
            .match_route(&Method::GET, "/api/users/abc-123")
            .unwrap();
        assert_eq!(matched.operation(), Operation::GetUser);
        assert_eq!(matched.params().get("id").map(String::as_str), Some("abc-123"));
    }

    #[test]
    fn test_method_disambiguates() {
        let router = Router::with_default_routes();
        assert_eq!(
            router
                .match_route(&Method::PATCH, "/api/users/1")
                .unwrap()
                .operation(),
            Operation::UpdateUser
        );
        assert_eq!(
            router
                .match_route(&Method::DELETE, "/api/users/1")
                .unwrap()
                .operation(),
            Operation::DeleteUser
        );
    }

    #[test]
    fn test_unknown_route_is_none() {
        let router = Router::with_default_routes();
        assert!(router.match_route(&Method::GET, "/nope").is_none());
        assert!(router.match_route(&Method::PUT, "/api/users/1").is_none());
        assert!(router
            .match_route(&Method::GET, "/api/users/1/extra")
            .is_none());
    }

    #[test]
    fn test_trailing_slash_tolerated() {
        let router = Router::with_default_routes();
        assert!(router.match_route(&Method::GET, "/api/users/").is_some());
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::Signup.name(), "signup");
        assert_eq!(Operation::ListUsers.name(), "listUsers");
    }
}
