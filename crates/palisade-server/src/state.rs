//! Application state and per-route pipeline wiring.
//!
//! Built once at startup. Guard stages with cross-request state (the two
//! rate limiters) are constructed once and shared by every pipeline that
//! includes them, so all standard-traffic routes draw from one budget and
//! both auth routes draw from the stricter one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use palisade_auth::TokenVerifier;
use palisade_config::{ConfigError, PalisadeConfig, RatePolicyConfig, VerificationMode, DEV_JWT_SECRET};
use palisade_middleware::stages::{
    AuthStage, RateLimitPolicy, RateLimitStage, SecurityStage, ValidationStage,
};
use palisade_middleware::{BoxedStage, Pipeline};

use crate::accounts::{AccountStore, MemoryAccountStore};
use crate::identity::{IdentityService, LocalIdentityService};
use crate::router::{Operation, Router};
use crate::schemas;

/// Shared application state.
pub struct AppState {
    config: PalisadeConfig,
    store: Arc<dyn AccountStore>,
    identity: Arc<dyn IdentityService>,
    verifier: Arc<TokenVerifier>,
    router: Router,
    pipelines: HashMap<Operation, Arc<Pipeline>>,
    fallback: Arc<Pipeline>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("env", &self.config.env)
            .field("verifier", &self.verifier.mode_name())
            .field("routes", &self.pipelines.len())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Starts building state from a configuration.
    #[must_use]
    pub fn builder(config: PalisadeConfig) -> AppStateBuilder {
        AppStateBuilder {
            config,
            store: None,
            identity: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PalisadeConfig {
        &self.config
    }

    /// Returns the persistence collaborator.
    #[must_use]
    pub fn store(&self) -> &dyn AccountStore {
        self.store.as_ref()
    }

    /// Returns the identity collaborator.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityService {
        self.identity.as_ref()
    }

    /// Returns the token verifier.
    #[must_use]
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Returns the route table.
    #[must_use]
    pub const fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the pipeline for an operation.
    #[must_use]
    pub fn pipeline_for(&self, operation: Operation) -> Arc<Pipeline> {
        self.pipelines
            .get(&operation)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    /// Returns the pipeline used for unmatched routes.
    #[must_use]
    pub fn fallback_pipeline(&self) -> Arc<Pipeline> {
        self.fallback.clone()
    }
}

/// Builder injecting the external collaborators.
pub struct AppStateBuilder {
    config: PalisadeConfig,
    store: Option<Arc<dyn AccountStore>>,
    identity: Option<Arc<dyn IdentityService>>,
}

impl AppStateBuilder {
    /// Injects a persistence implementation.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn AccountStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Injects an identity-service implementation.
    #[must_use]
    pub fn identity(mut self, identity: Arc<dyn IdentityService>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Wires verifier, collaborators, and per-route pipelines.
    pub fn build(self) -> Result<Arc<AppState>, ConfigError> {
        let config = self.config;
        config.validate()?;

        let mode = config.verification_mode()?;
        let verifier = Arc::new(match &mode {
            VerificationMode::Local(secret) => TokenVerifier::local(secret),
            VerificationMode::Remote(url) => TokenVerifier::remote(url.clone()),
        });

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryAccountStore::new()));

        // Default identity service issues tokens the local verifier accepts.
        // A remote deployment injects a provider-backed implementation.
        let identity = self.identity.unwrap_or_else(|| {
            let secret = match &mode {
                VerificationMode::Local(secret) => secret.as_str(),
                VerificationMode::Remote(_) => DEV_JWT_SECRET,
            };
            Arc::new(LocalIdentityService::new(
                secret,
                config.auth.token_ttl_seconds,
            ))
        });

        // Shared guard stages. Stage order within every chain is fixed:
        // security, rate limit, auth, validation.
        let security: BoxedStage =
            Arc::new(SecurityStage::new(config.cors.allowed_origins.clone()));
        let standard_limit: BoxedStage = Arc::new(RateLimitStage::with_store(
            to_policy(config.rate_limit.standard),
            "Too many requests from this IP, please try again later.",
            Arc::default(),
        ));
        let auth_limit: BoxedStage = Arc::new(RateLimitStage::with_store(
            to_policy(config.rate_limit.auth),
            "Too many authentication attempts, please try again later.",
            Arc::default(),
        ));
        let auth_stage: BoxedStage = Arc::new(AuthStage::new(verifier.clone()));

        let public = |validation: Option<ValidationStage>| {
            let mut builder = Pipeline::builder()
                .shared_stage(security.clone())
                .shared_stage(standard_limit.clone());
            if let Some(validation) = validation {
                builder = builder.stage(validation);
            }
            Arc::new(builder.build())
        };

        // Auth routes sit behind both budgets: the broad default and the
        // stricter auth policy.
        let auth_route = |validation: ValidationStage| {
            Arc::new(
                Pipeline::builder()
                    .shared_stage(security.clone())
                    .shared_stage(standard_limit.clone())
                    .shared_stage(auth_limit.clone())
                    .stage(validation)
                    .build(),
            )
        };

        let protected = |validation: Option<ValidationStage>| {
            let mut builder = Pipeline::builder()
                .shared_stage(security.clone())
                .shared_stage(standard_limit.clone())
                .shared_stage(auth_stage.clone());
            if let Some(validation) = validation {
                builder = builder.stage(validation);
            }
            Arc::new(builder.build())
        };

        let mut pipelines: HashMap<Operation, Arc<Pipeline>> = HashMap::new();
        pipelines.insert(
            Operation::Health,
            Arc::new(Pipeline::builder().shared_stage(security.clone()).build()),
        );
        pipelines.insert(Operation::Welcome, public(None));
        pipelines.insert(
            Operation::Signup,
            auth_route(ValidationStage::new().body(schemas::signup_body())),
        );
        pipelines.insert(
            Operation::Login,
            auth_route(ValidationStage::new().body(schemas::login_body())),
        );
        pipelines.insert(Operation::Me, protected(None));
        pipelines.insert(
            Operation::ListUsers,
            protected(Some(ValidationStage::new().query(schemas::list_users_query()))),
        );
        pipelines.insert(
            Operation::GetUser,
            protected(Some(ValidationStage::new().params(schemas::user_params()))),
        );
        pipelines.insert(
            Operation::UpdateUser,
            protected(Some(
                ValidationStage::new()
                    .params(schemas::user_params())
                    .body(schemas::update_user_body()),
            )),
        );
        pipelines.insert(
            Operation::DeleteUser,
            protected(Some(ValidationStage::new().params(schemas::user_params()))),
        );

        let fallback = public(None);

        Ok(Arc::new(AppState {
            config,
            store,
            identity,
            verifier,
            router: Router::with_default_routes(),
            pipelines,
            fallback,
        }))
    }
}

fn to_policy(config: RatePolicyConfig) -> RateLimitPolicy {
    RateLimitPolicy {
        max_requests: config.max_requests,
        window: Duration::from_secs(config.window_seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_from_defaults() {
        let state = AppState::builder(PalisadeConfig::default()).build().unwrap();
        assert_eq!(state.verifier().mode_name(), "local");
        assert_eq!(state.pipeline_for(Operation::Health).stage_count(), 1);
    }

    #[test]
    fn test_protected_routes_include_auth_stage() {
        let state = AppState::builder(PalisadeConfig::default()).build().unwrap();
        let names = state.pipeline_for(Operation::Me).stage_names();
        assert_eq!(names, vec!["security", "rate_limit", "auth"]);
    }

    #[test]
    fn test_auth_routes_carry_both_budgets_then_validate() {
        let state = AppState::builder(PalisadeConfig::default()).build().unwrap();
        let names = state.pipeline_for(Operation::Signup).stage_names();
        assert_eq!(
            names,
            vec!["security", "rate_limit", "rate_limit", "validation"]
        );
    }

    #[test]
    fn test_update_route_has_full_chain() {
        let state = AppState::builder(PalisadeConfig::default()).build().unwrap();
        let names = state.pipeline_for(Operation::UpdateUser).stage_names();
        assert_eq!(names, vec!["security", "rate_limit", "auth", "validation"]);
    }

    #[test]
    fn test_remote_mode_selected_by_provider_url() {
        let mut config = PalisadeConfig::default();
        config.auth.provider_url = Some("http://localhost:54321".to_string());
        let state = AppState::builder(config).build().unwrap();
        assert_eq!(state.verifier().mode_name(), "remote");
    }

    #[test]
    fn test_production_without_keys_refuses_to_build() {
        let config = PalisadeConfig {
            env: "production".to_string(),
            ..Default::default()
        };
        assert!(AppState::builder(config).build().is_err());
    }
}
