//! Capability APIs: providers of model-invokable tools.
//!
//! A provider resolves to an [`ApiInstance`] fresh for each conversation
//! turn. Several providers can be requested at once; their instances are
//! merged into a composite whose identity is the ordered concatenation
//! of the requested ids.

use crate::context::InvocationContext;
use crate::error::{ApiError, ToolError};
use crate::tool::{Tool, ToolCall, ToolSpec};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Id of the platform's own capability provider.
///
/// The default provider injects wall-clock context into its own prompt
/// fragment; other providers are assumed not to.
pub const DEFAULT_API_ID: &str = "assist";

/// A capability provider, resolved per turn into an [`ApiInstance`].
#[async_trait]
pub trait LlmApiProvider: Send + Sync {
    /// The id this provider is registered under.
    fn id(&self) -> &str;

    /// Resolves the provider for one turn.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ResolutionFailed`] if the provider cannot
    /// produce an instance for this context.
    async fn resolve(&self, context: &InvocationContext) -> Result<ApiInstance, ApiError>;
}

/// A resolved capability set: tools plus an optional prompt fragment.
///
/// Instances live for a single turn and are not persisted.
#[derive(Clone)]
pub struct ApiInstance {
    /// Identity of the instance; for composites, the ordered
    /// concatenation of the source provider ids.
    pub api_id: String,
    /// Prompt fragment appended to the system prompt, if any.
    pub api_prompt: Option<String>,
    /// The context the instance was resolved under.
    pub context: InvocationContext,
    tools: Vec<Arc<dyn Tool>>,
}

impl fmt::Debug for ApiInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiInstance")
            .field("api_id", &self.api_id)
            .field("api_prompt", &self.api_prompt)
            .field("tools", &self.tools.iter().map(|t| t.spec().name).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ApiInstance {
    /// Creates an instance for a single provider.
    #[must_use]
    pub fn new(
        api_id: impl Into<String>,
        context: InvocationContext,
        tools: Vec<Arc<dyn Tool>>,
    ) -> Self {
        Self {
            api_id: api_id.into(),
            api_prompt: None,
            context,
            tools,
        }
    }

    /// Sets the prompt fragment.
    #[must_use]
    pub fn with_api_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.api_prompt = Some(prompt.into());
        self
    }

    /// Merges several resolved instances into a composite.
    ///
    /// The composite id is the ordered concatenation of the source ids,
    /// and its prompt fragment joins the non-empty source fragments.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::DuplicateToolName`] when two sources expose a
    /// tool with the same name.
    pub fn merged(instances: Vec<ApiInstance>) -> Result<Self, ApiError> {
        let mut seen = HashSet::new();
        let mut tools = Vec::new();
        let mut prompts = Vec::new();
        let mut ids = Vec::new();
        let mut context = None;

        for instance in instances {
            for tool in &instance.tools {
                let name = tool.spec().name;
                if !seen.insert(name.clone()) {
                    return Err(ApiError::DuplicateToolName { tool_name: name });
                }
            }
            tools.extend(instance.tools);
            if let Some(prompt) = instance.api_prompt {
                prompts.push(prompt);
            }
            ids.push(instance.api_id);
            context.get_or_insert(instance.context);
        }

        Ok(Self {
            api_id: ids.join("|"),
            api_prompt: (!prompts.is_empty()).then(|| prompts.join("\n")),
            context: context.unwrap_or_else(|| InvocationContext::new("conversation")),
            tools,
        })
    }

    /// Returns the specs of all exposed tools.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|tool| tool.spec()).collect()
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.spec().name == name)
    }

    /// Invokes the named tool with the call's arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::ToolNotFound`] for unknown names, or the
    /// tool's own error on invocation failure.
    pub async fn invoke(&self, call: &ToolCall) -> Result<serde_json::Value, ToolError> {
        let tool = self
            .get_tool(&call.tool_name)
            .ok_or_else(|| ToolError::ToolNotFound {
                name: call.tool_name.clone(),
            })?;
        tool.invoke(&call.tool_args, &self.context).await
    }
}

/// Registry of capability providers, keyed by provider id.
#[derive(Default)]
pub struct ApiRegistry {
    providers: HashMap<String, Arc<dyn LlmApiProvider>>,
}

impl fmt::Debug for ApiRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ApiRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider under its own id.
    pub fn register(&mut self, provider: Arc<dyn LlmApiProvider>) {
        self.providers.insert(provider.id().to_string(), provider);
    }

    /// Returns the provider registered under `api_id`, if any.
    #[must_use]
    pub fn get(&self, api_id: &str) -> Option<&Arc<dyn LlmApiProvider>> {
        self.providers.get(api_id)
    }

    /// Resolves the requested providers into one instance.
    ///
    /// A single id yields that provider's instance; several ids yield a
    /// merged composite in request order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnknownApi`] when any id is not registered,
    /// or a merge error from [`ApiInstance::merged`].
    pub async fn resolve_apis(
        &self,
        api_ids: &[String],
        context: &InvocationContext,
    ) -> Result<ApiInstance, ApiError> {
        let mut instances = Vec::with_capacity(api_ids.len());
        for api_id in api_ids {
            let provider = self.get(api_id).ok_or_else(|| ApiError::UnknownApi {
                api_id: api_id.clone(),
            })?;
            instances.push(provider.resolve(context).await?);
        }

        if instances.len() == 1
            && let Some(instance) = instances.pop()
        {
            return Ok(instance);
        }
        ApiInstance::merged(instances)
    }
}
