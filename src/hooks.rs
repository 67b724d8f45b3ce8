//! Resolver wrapping with ordered pre and post hooks.
//!
//! Pre-hooks run one after another before the resolver, post-hooks one after
//! another after it. Each post-hook sees the resolver's own result; only the
//! last post-hook's [`HookOutcome`] decides what the caller gets. The first
//! hook error stops the chain and is returned as is.

use crate::compile::CompiledQuery;
use crate::error::{Result, TypegraphError};
use crate::model::HookConfig;
use async_trait::async_trait;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Inputs of one field resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolveParams {
    pub type_name: String,
    pub field: String,
    /// Field arguments as a JSON object
    pub args: Json,
    /// Parent value for nested fields, `Null` on root fields
    pub parent: Json,
    /// Filter and sort compiled from the request's selection
    pub query: CompiledQuery,
}

#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, params: &ResolveParams) -> anyhow::Result<Json>;
}

#[async_trait]
pub trait PreHook: Send + Sync {
    async fn run(&self, params: &ResolveParams) -> anyhow::Result<()>;
}

#[async_trait]
pub trait PostHook: Send + Sync {
    async fn run(&self, result: &Json, params: &ResolveParams) -> anyhow::Result<HookOutcome>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    Keep,
    Replace(Json),
}

impl HookOutcome {
    /// `Replace` for a non-empty value; `Keep` for nothing, `null`, `false`,
    /// or an empty string, list or object.
    pub fn from_value(value: Option<Json>) -> Self {
        match value {
            None | Some(Json::Null) | Some(Json::Bool(false)) => HookOutcome::Keep,
            Some(Json::String(s)) if s.is_empty() => HookOutcome::Keep,
            Some(Json::Array(a)) if a.is_empty() => HookOutcome::Keep,
            Some(Json::Object(o)) if o.is_empty() => HookOutcome::Keep,
            Some(value) => HookOutcome::Replace(value),
        }
    }
}

pub struct HookedResolver {
    inner: Arc<dyn Resolver>,
    pre: Vec<Arc<dyn PreHook>>,
    post: Vec<Arc<dyn PostHook>>,
}

impl HookedResolver {
    pub fn new(
        inner: Arc<dyn Resolver>,
        pre: Vec<Arc<dyn PreHook>>,
        post: Vec<Arc<dyn PostHook>>,
    ) -> Self {
        Self { inner, pre, post }
    }
}

#[async_trait]
impl Resolver for HookedResolver {
    async fn resolve(&self, params: &ResolveParams) -> anyhow::Result<Json> {
        for hook in &self.pre {
            hook.run(params).await?;
        }
        let result = self.inner.resolve(params).await?;

        let mut last = HookOutcome::Keep;
        for hook in &self.post {
            last = hook.run(&result, params).await?;
        }
        Ok(match last {
            HookOutcome::Replace(value) => value,
            HookOutcome::Keep => result,
        })
    }
}

/// Named hooks that [`HookConfig`]s refer to.
#[derive(Clone, Default)]
pub struct HookRegistry {
    pre: HashMap<String, Arc<dyn PreHook>>,
    post: HashMap<String, Arc<dyn PostHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_pre(&mut self, name: impl Into<String>, hook: Arc<dyn PreHook>) -> &mut Self {
        self.pre.insert(name.into(), hook);
        self
    }

    pub fn register_post(&mut self, name: impl Into<String>, hook: Arc<dyn PostHook>) -> &mut Self {
        self.post.insert(name.into(), hook);
        self
    }

    /// Wraps `resolver` in the hooks `config` names. An empty config returns
    /// the resolver unchanged.
    pub fn compose(&self, config: &HookConfig, resolver: Arc<dyn Resolver>) -> Result<Arc<dyn Resolver>> {
        if config.is_empty() {
            return Ok(resolver);
        }
        let pre = config
            .pre
            .iter()
            .map(|name| {
                self.pre
                    .get(name)
                    .cloned()
                    .ok_or_else(|| TypegraphError::Config(format!("Unknown pre hook: {}", name)))
            })
            .collect::<Result<Vec<_>>>()?;
        let post = config
            .post
            .iter()
            .map(|name| {
                self.post
                    .get(name)
                    .cloned()
                    .ok_or_else(|| TypegraphError::Config(format!("Unknown post hook: {}", name)))
            })
            .collect::<Result<Vec<_>>>()?;
        trace!(pre = pre.len(), post = post.len(), "composing hooks");
        Ok(Arc::new(HookedResolver::new(resolver, pre, post)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    struct Fixed(Json);

    #[async_trait]
    impl Resolver for Fixed {
        async fn resolve(&self, _params: &ResolveParams) -> anyhow::Result<Json> {
            Ok(self.0.clone())
        }
    }

    struct Record {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl PreHook for Record {
        async fn run(&self, params: &ResolveParams) -> anyhow::Result<()> {
            tokio::task::yield_now().await;
            self.log.lock().push(format!("{}:{}", self.name, params.field));
            if self.fail {
                anyhow::bail!("{} refused", self.name);
            }
            Ok(())
        }
    }

    struct Returns(Option<Json>, Arc<Mutex<Vec<Json>>>);

    #[async_trait]
    impl PostHook for Returns {
        async fn run(&self, result: &Json, _params: &ResolveParams) -> anyhow::Result<HookOutcome> {
            self.1.lock().push(result.clone());
            Ok(HookOutcome::from_value(self.0.clone()))
        }
    }

    fn params() -> ResolveParams {
        ResolveParams {
            type_name: "Query".into(),
            field: "userMany".into(),
            ..ResolveParams::default()
        }
    }

    fn pre(name: &'static str, log: &Arc<Mutex<Vec<String>>>, fail: bool) -> Arc<dyn PreHook> {
        Arc::new(Record {
            name,
            log: log.clone(),
            fail,
        })
    }

    #[tokio::test]
    async fn test_pre_hooks_run_in_order_before_resolver() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let resolver = HookedResolver::new(
            Arc::new(Fixed(json!([1]))),
            vec![pre("a", &log, false), pre("b", &log, false)],
            vec![],
        );
        assert_eq!(resolver.resolve(&params()).await.unwrap(), json!([1]));
        assert_eq!(*log.lock(), vec!["a:userMany", "b:userMany"]);
    }

    #[tokio::test]
    async fn test_failing_hook_aborts_chain_unchanged() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let resolver = HookedResolver::new(
            Arc::new(Fixed(json!("data"))),
            vec![pre("a", &log, true), pre("b", &log, false)],
            vec![Arc::new(Returns(Some(json!("x")), seen.clone()))],
        );
        let err = resolver.resolve(&params()).await.unwrap_err();
        assert_eq!(err.to_string(), "a refused");
        assert_eq!(*log.lock(), vec!["a:userMany"]);
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_empty_post_result_keeps_resolver_result() {
        for empty in [None, Some(json!(null)), Some(json!([])), Some(json!({})), Some(json!(""))] {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let resolver = HookedResolver::new(
                Arc::new(Fixed(json!({ "id": 1 }))),
                vec![],
                vec![Arc::new(Returns(empty, seen))],
            );
            assert_eq!(resolver.resolve(&params()).await.unwrap(), json!({ "id": 1 }));
        }
    }

    #[tokio::test]
    async fn test_last_post_hook_decides() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let replacing_then_empty = HookedResolver::new(
            Arc::new(Fixed(json!(1))),
            vec![],
            vec![
                Arc::new(Returns(Some(json!(2)), seen.clone())),
                Arc::new(Returns(None, seen.clone())),
            ],
        );
        assert_eq!(replacing_then_empty.resolve(&params()).await.unwrap(), json!(1));
        // every post hook sees the resolver's own result
        assert_eq!(*seen.lock(), vec![json!(1), json!(1)]);

        let replacing_last = HookedResolver::new(
            Arc::new(Fixed(json!(1))),
            vec![],
            vec![
                Arc::new(Returns(None, seen.clone())),
                Arc::new(Returns(Some(json!(3)), seen.clone())),
            ],
        );
        assert_eq!(replacing_last.resolve(&params()).await.unwrap(), json!(3));
    }

    #[tokio::test]
    async fn test_registry_compose() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HookRegistry::new();
        registry.register_pre("audit", pre("audit", &log, false));

        let config = HookConfig {
            pre: vec!["audit".into()],
            post: vec![],
        };
        let resolver = registry.compose(&config, Arc::new(Fixed(json!(true)))).unwrap();
        assert_eq!(resolver.resolve(&params()).await.unwrap(), json!(true));
        assert_eq!(*log.lock(), vec!["audit:userMany"]);

        let unknown = HookConfig {
            pre: vec![],
            post: vec!["nope".into()],
        };
        assert!(matches!(
            registry.compose(&unknown, Arc::new(Fixed(json!(true)))),
            Err(TypegraphError::Config(_))
        ));
    }
}
