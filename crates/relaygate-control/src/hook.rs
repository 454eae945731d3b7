//! Extensible pre-registration hook pipeline
//!
//! Hooks run in registration order before a proxy request is committed.
//! Each hook sees the previous hook's output and may pass it through,
//! rewrite it, or reject the whole submission. Hooks never touch the
//! session or proxy directories; they only transform the request in flight.

use async_trait::async_trait;
use relaygate_proto::{ClientIdentity, ProxyRequest};
use std::sync::Arc;
use thiserror::Error;

/// Rejection raised by a hook, aborting the submission
#[derive(Error, Debug, Clone)]
pub enum HookError {
    #[error("proxy request rejected by hook {hook}: {reason}")]
    Rejected { hook: String, reason: String },
}

impl HookError {
    pub fn rejected(hook: &str, reason: impl Into<String>) -> Self {
        HookError::Rejected {
            hook: hook.to_string(),
            reason: reason.into(),
        }
    }
}

/// Input and output of each pipeline stage
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Identity of the session the request was bound to
    pub identity: ClientIdentity,
    /// The request as transformed by earlier stages
    pub request: ProxyRequest,
}

/// One stage of the pre-registration pipeline
#[async_trait]
pub trait RegistrationHook: Send + Sync {
    fn name(&self) -> &str;

    /// Transform or veto a proxy request before it is committed
    async fn on_new_proxy(&self, ctx: HookContext) -> Result<HookContext, HookError>;
}

/// Ordered, short-circuiting chain of registration hooks
///
/// An empty pipeline is the identity transformation.
pub struct HookPipeline {
    hooks: Vec<Arc<dyn RegistrationHook>>,
}

impl HookPipeline {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn with_hook(mut self, hook: Arc<dyn RegistrationHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn push(&mut self, hook: Arc<dyn RegistrationHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run all hooks in order, feeding each the previous output
    ///
    /// Stops at the first rejection; later hooks are not consulted.
    pub async fn run(&self, mut ctx: HookContext) -> Result<HookContext, HookError> {
        for hook in &self.hooks {
            tracing::debug!(hook = %hook.name(), proxy = %ctx.request.name, "running registration hook");
            ctx = hook.on_new_proxy(ctx).await?;
        }
        Ok(ctx)
    }
}

impl Default for HookPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates proxy names as DNS-label-like identifiers
///
/// Accepts alphanumerics, hyphens, dots and underscores, up to 63
/// characters, with no leading or trailing hyphen.
pub struct ProxyNamePolicy;

impl ProxyNamePolicy {
    fn check(name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err("proxy name cannot be empty".to_string());
        }
        if name.len() > 63 {
            return Err(format!("proxy name too long (max 63 characters): {}", name));
        }
        if name.starts_with('-') || name.ends_with('-') {
            return Err(format!("proxy name cannot start or end with a hyphen: {}", name));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')))
        {
            return Err(format!("invalid character {:?} in proxy name {}", bad, name));
        }
        Ok(())
    }
}

#[async_trait]
impl RegistrationHook for ProxyNamePolicy {
    fn name(&self) -> &str {
        "proxy-name-policy"
    }

    async fn on_new_proxy(&self, ctx: HookContext) -> Result<HookContext, HookError> {
        Self::check(&ctx.request.name).map_err(|reason| HookError::rejected(self.name(), reason))?;
        Ok(ctx)
    }
}

/// Prefixes proxy names with the owning user
///
/// A client logged in as `alice` asking for `web1` registers `alice.web1`,
/// keeping names from different accounts out of each other's way. Sessions
/// with an empty user pass through unchanged.
pub struct UserScopedNames;

#[async_trait]
impl RegistrationHook for UserScopedNames {
    fn name(&self) -> &str {
        "user-scoped-names"
    }

    async fn on_new_proxy(&self, mut ctx: HookContext) -> Result<HookContext, HookError> {
        if !ctx.identity.user.is_empty() {
            ctx.request.name = format!("{}.{}", ctx.identity.user, ctx.request.name);
        }
        Ok(ctx)
    }
}
