//! Role-based route guard.
//!
//! Routes declare an [`AccessPolicy`] when the router is built; [`RoleGuardLayer`]
//! evaluates it against the [`SecurityContext`] left by the authentication gate.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::middleware::SecurityContext;
use crate::error::AppError;

/// Prefix some identity stores put in front of role names.
const ROLE_PREFIX: &str = "ROLE_";

// =============================================================================
// Rules
// =============================================================================

/// Predicate over the roles granted to an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRule {
    /// Any authenticated caller, whatever its roles.
    Authenticated,
    /// Caller holds this role (`X` or `ROLE_X`).
    HasRole(String),
    /// At least one rule holds. Empty is false.
    AnyOf(Vec<RoleRule>),
    /// Every rule holds. Empty is true.
    AllOf(Vec<RoleRule>),
}

impl RoleRule {
    pub fn has_role(role: impl Into<String>) -> Self {
        RoleRule::HasRole(role.into())
    }

    pub fn any_of(rules: impl IntoIterator<Item = RoleRule>) -> Self {
        RoleRule::AnyOf(rules.into_iter().collect())
    }

    pub fn all_of(rules: impl IntoIterator<Item = RoleRule>) -> Self {
        RoleRule::AllOf(rules.into_iter().collect())
    }

    /// Shorthand for `any_of` over plain role names.
    pub fn has_any_role<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self::any_of(roles.into_iter().map(Self::has_role))
    }

    pub fn matches(&self, granted: &[String]) -> bool {
        match self {
            RoleRule::Authenticated => true,
            RoleRule::HasRole(required) => granted.iter().any(|g| role_matches(g, required)),
            RoleRule::AnyOf(rules) => rules.iter().any(|r| r.matches(granted)),
            RoleRule::AllOf(rules) => rules.iter().all(|r| r.matches(granted)),
        }
    }
}

fn role_matches(granted: &str, required: &str) -> bool {
    granted == required || granted.strip_prefix(ROLE_PREFIX) == Some(required)
}

/// Access requirement of a single route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Anonymous callers allowed.
    Public,
    /// Caller must be authenticated and satisfy the rule.
    Require(RoleRule),
}

impl AccessPolicy {
    pub fn authenticated() -> Self {
        AccessPolicy::Require(RoleRule::Authenticated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No security context; credentials missing or invalid.
    Unauthenticated,
    /// Authenticated, but the rule rejected the granted roles.
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => AppError::Unauthenticated,
            Denial::Forbidden => AppError::Forbidden,
        }
    }
}

/// Decide whether a caller may use a route.
pub fn require(context: Option<&SecurityContext>, policy: &AccessPolicy) -> Decision {
    let rule = match policy {
        AccessPolicy::Public => return Decision::Allow,
        AccessPolicy::Require(rule) => rule,
    };

    match context {
        None => Decision::Deny(Denial::Unauthenticated),
        Some(ctx) if rule.matches(&ctx.roles) => Decision::Allow,
        Some(_) => Decision::Deny(Denial::Forbidden),
    }
}

// =============================================================================
// RoleGuardLayer
// =============================================================================

/// Layer enforcing an [`AccessPolicy`] in front of a route.
#[derive(Debug, Clone)]
pub struct RoleGuardLayer {
    policy: Arc<AccessPolicy>,
}

impl RoleGuardLayer {
    pub fn new(policy: AccessPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    /// Guard requiring any authenticated caller.
    pub fn authenticated() -> Self {
        Self::new(AccessPolicy::authenticated())
    }

    /// Guard requiring `rule` to hold for the caller's roles.
    pub fn require(rule: RoleRule) -> Self {
        Self::new(AccessPolicy::Require(rule))
    }
}

impl<S> Layer<S> for RoleGuardLayer {
    type Service = RoleGuard<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RoleGuard {
            inner,
            policy: self.policy.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoleGuard<S> {
    inner: S,
    policy: Arc<AccessPolicy>,
}

impl<S> Service<Request<Body>> for RoleGuard<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let policy = self.policy.clone();
        // 使用已 ready 的实例处理本次请求
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let decision = require(req.extensions().get::<SecurityContext>(), &policy);
            match decision {
                Decision::Allow => inner.call(req).await,
                Decision::Deny(denial) => {
                    log_denial(&req, denial, &policy);
                    Ok(AppError::from(denial).into_response())
                }
            }
        })
    }
}

fn log_denial(req: &Request<Body>, denial: Denial, policy: &AccessPolicy) {
    match (denial, req.extensions().get::<SecurityContext>()) {
        (Denial::Forbidden, Some(ctx)) => tracing::warn!(
            username = %ctx.username,
            roles = ?ctx.roles,
            policy = ?policy,
            path = %req.uri().path(),
            "Access denied"
        ),
        _ => tracing::debug!(
            path = %req.uri().path(),
            "Unauthenticated request to guarded route"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use tower::ServiceExt;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn context(names: &[&str]) -> SecurityContext {
        SecurityContext {
            username: "alice".to_string(),
            roles: roles(names),
        }
    }

    #[test]
    fn test_has_role() {
        let rule = RoleRule::has_role("ADMIN");
        assert!(rule.matches(&roles(&["USER", "ADMIN"])));
        assert!(rule.matches(&roles(&["ROLE_ADMIN"])));
        assert!(!rule.matches(&roles(&["USER"])));
        assert!(!rule.matches(&roles(&["ADMINISTRATOR"])));
        assert!(!rule.matches(&[]));
    }

    #[test]
    fn test_composed_rules() {
        let either = RoleRule::has_any_role(["ADMIN", "USER"]);
        assert!(either.matches(&roles(&["USER"])));
        assert!(!either.matches(&roles(&["GUEST"])));

        let both = RoleRule::all_of([RoleRule::has_role("ADMIN"), RoleRule::has_role("AUDITOR")]);
        assert!(both.matches(&roles(&["AUDITOR", "ADMIN"])));
        assert!(!both.matches(&roles(&["ADMIN"])));

        assert!(!RoleRule::AnyOf(vec![]).matches(&roles(&["ADMIN"])));
        assert!(RoleRule::AllOf(vec![]).matches(&[]));
        assert!(RoleRule::Authenticated.matches(&[]));
    }

    #[test]
    fn test_require_decisions() {
        let admin_only = AccessPolicy::Require(RoleRule::has_role("ADMIN"));

        assert_eq!(require(None, &AccessPolicy::Public), Decision::Allow);
        assert_eq!(
            require(None, &AccessPolicy::authenticated()),
            Decision::Deny(Denial::Unauthenticated)
        );
        assert_eq!(
            require(Some(&context(&["USER"])), &admin_only),
            Decision::Deny(Denial::Forbidden)
        );
        assert_eq!(require(Some(&context(&["ADMIN"])), &admin_only), Decision::Allow);
        assert_eq!(
            require(Some(&context(&[])), &AccessPolicy::authenticated()),
            Decision::Allow
        );
    }

    async fn status_for(layer: RoleGuardLayer, ctx: Option<SecurityContext>) -> u16 {
        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        if let Some(ctx) = ctx {
            req.extensions_mut().insert(ctx);
        }
        let service = layer.layer(tower::service_fn(|_req: Request<Body>| async {
            Ok::<_, Infallible>(Response::new(Body::empty()))
        }));
        service.oneshot(req).await.unwrap().status().as_u16()
    }

    #[tokio::test]
    async fn test_guard_layer_statuses() {
        let admin = || RoleGuardLayer::require(RoleRule::has_role("ADMIN"));

        assert_eq!(status_for(admin(), Some(context(&["ADMIN"]))).await, 200);
        assert_eq!(status_for(admin(), Some(context(&["USER"]))).await, 403);
        assert_eq!(status_for(admin(), None).await, 401);
        assert_eq!(status_for(RoleGuardLayer::new(AccessPolicy::Public), None).await, 200);
        assert_eq!(status_for(RoleGuardLayer::authenticated(), None).await, 401);
    }
}
