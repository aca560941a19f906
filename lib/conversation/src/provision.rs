//! Prompt provisioning for one conversation turn.
//!
//! Resolves the requested capability APIs, renders the base instructions
//! template, and assembles the system prompt, keeping the resolved
//! capability set on the chat log for tool execution later in the turn.

use crate::chat_log::ChatLog;
use crate::error::ProvisionError;
use amber_hearth_llm::{
    ApiRegistry, IdentityResolver, InvocationContext, TemplateRenderer, TemplateVars,
    DEFAULT_API_ID,
};
use chrono::Utc;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Base instructions used when the caller supplies no template.
pub const DEFAULT_BASE_PROMPT: &str = "You are a voice assistant for {{platform}}.\n\
Answer questions truthfully and keep responses short.\n\
You are speaking with {{user_name}}.";

/// Inputs to [`ChatLog::provision_prompt`].
///
/// Collaborator handles are borrowed for the call; nothing here is
/// retained beyond the resolved capability set and the sticky extra
/// system prompt.
pub struct ProvisionParams<'a> {
    /// Registry of capability providers.
    pub registry: &'a ApiRegistry,
    /// Template renderer for the base instructions.
    pub renderer: &'a dyn TemplateRenderer,
    /// Display-name lookup for the acting user, if available.
    pub identity: Option<&'a dyn IdentityResolver>,
    /// The invocation this turn runs under.
    pub context: &'a InvocationContext,
    /// Capability API ids to resolve; empty requests none.
    pub api_ids: Vec<String>,
    /// Base instructions template override.
    pub base_prompt_template: Option<String>,
    /// Operator-injected context. `Some` replaces the session's stored
    /// value; `None` carries the stored value forward unchanged.
    pub extra_system_prompt: Option<String>,
}

fn current_time_fragment() -> String {
    format!(
        "Current time is {}.",
        Utc::now().format("%H:%M:%S on %A, %d %B %Y")
    )
}

impl ChatLog {
    /// Resolves capabilities and renders the system prompt into the
    /// system slot at index 0.
    ///
    /// When the platform's own default provider is not among the
    /// requested APIs (or none are requested), a current date/time
    /// fragment is appended, since other providers are assumed not to
    /// inject wall-clock context themselves.
    ///
    /// # Errors
    ///
    /// Returns a [`ProvisionError`] carrying a ready-to-display response
    /// when an API id does not resolve or the template fails to render.
    pub async fn provision_prompt(
        &mut self,
        params: ProvisionParams<'_>,
    ) -> Result<(), ProvisionError> {
        let conversation_id = self.conversation_id();

        let api = if params.api_ids.is_empty() {
            None
        } else {
            Some(
                params
                    .registry
                    .resolve_apis(&params.api_ids, params.context)
                    .await
                    .map_err(|err| ProvisionError::api_resolution(conversation_id, err))?,
            )
        };

        let user_name = match (params.identity, params.context.user_id.as_ref()) {
            (Some(identity), Some(user_id)) => identity.display_name(user_id).await,
            _ => None,
        };

        let mut vars = TemplateVars::new();
        vars.insert(
            "platform".to_string(),
            JsonValue::String(params.context.platform.clone()),
        );
        vars.insert(
            "user_name".to_string(),
            JsonValue::String(user_name.unwrap_or_else(|| "the user".to_string())),
        );
        vars.insert(
            "context".to_string(),
            serde_json::to_value(params.context).unwrap_or(JsonValue::Null),
        );

        let template = params
            .base_prompt_template
            .as_deref()
            .unwrap_or(DEFAULT_BASE_PROMPT);
        let rendered = params
            .renderer
            .render(template, &vars)
            .map_err(|err| ProvisionError::template(conversation_id, err))?;

        let mut parts = vec![rendered];

        let default_requested = params.api_ids.iter().any(|id| id == DEFAULT_API_ID);
        if !default_requested {
            parts.push(current_time_fragment());
        }

        if let Some(api) = &api
            && let Some(prompt) = &api.api_prompt
        {
            parts.push(prompt.clone());
        }

        if let Some(extra) = params.extra_system_prompt {
            self.extra_system_prompt = Some(extra);
        }
        if let Some(extra) = &self.extra_system_prompt {
            parts.push(extra.clone());
        }

        self.set_system_prompt(parts.join("\n"));
        self.llm_api = api.map(Arc::new);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProvisionErrorKind;
    use crate::testing::{EchoTool, StaticProvider};
    use amber_hearth_core::{ConversationId, UserId};
    use amber_hearth_llm::SimpleTemplateRenderer;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NamedResolver;

    #[async_trait]
    impl IdentityResolver for NamedResolver {
        async fn display_name(&self, _user_id: &UserId) -> Option<String> {
            Some("Alice".to_string())
        }
    }

    fn registry() -> ApiRegistry {
        let mut registry = ApiRegistry::new();
        registry.register(Arc::new(StaticProvider {
            id: DEFAULT_API_ID,
            prompt: Some("Control the home."),
            tools: vec![Arc::new(EchoTool::new("turn_on_light"))],
        }));
        registry.register(Arc::new(StaticProvider {
            id: "music",
            prompt: Some("Control playback."),
            tools: vec![Arc::new(EchoTool::new("play_media"))],
        }));
        registry
    }

    fn params<'a>(
        registry: &'a ApiRegistry,
        context: &'a InvocationContext,
        api_ids: &[&str],
    ) -> ProvisionParams<'a> {
        ProvisionParams {
            registry,
            renderer: &SimpleTemplateRenderer,
            identity: None,
            context,
            api_ids: api_ids.iter().map(|id| (*id).to_string()).collect(),
            base_prompt_template: None,
            extra_system_prompt: None,
        }
    }

    fn log() -> ChatLog {
        ChatLog::new(ConversationId::new())
    }

    #[tokio::test]
    async fn default_api_omits_the_time_fragment() {
        let registry = registry();
        let ctx = InvocationContext::new("amber-hearth");
        let mut log = log();

        log.provision_prompt(params(&registry, &ctx, &[DEFAULT_API_ID]))
            .await
            .expect("provision");

        assert!(!log.system_prompt().contains("Current time is"));
        assert!(log.system_prompt().contains("Control the home."));
        assert_eq!(log.llm_api().expect("api").api_id, DEFAULT_API_ID);
    }

    #[tokio::test]
    async fn non_default_api_gets_the_time_fragment() {
        let registry = registry();
        let ctx = InvocationContext::new("amber-hearth");
        let mut log = log();

        log.provision_prompt(params(&registry, &ctx, &["music"]))
            .await
            .expect("provision");

        assert!(log.system_prompt().contains("Current time is"));
        assert!(log.system_prompt().contains("Control playback."));
    }

    #[tokio::test]
    async fn default_among_several_omits_the_time_fragment() {
        let registry = registry();
        let ctx = InvocationContext::new("amber-hearth");
        let mut log = log();

        log.provision_prompt(params(&registry, &ctx, &[DEFAULT_API_ID, "music"]))
            .await
            .expect("provision");

        assert!(!log.system_prompt().contains("Current time is"));
        assert_eq!(log.llm_api().expect("api").api_id, "assist|music");
    }

    #[tokio::test]
    async fn no_apis_still_renders_with_the_time_fragment() {
        let registry = registry();
        let ctx = InvocationContext::new("amber-hearth");
        let mut log = log();

        log.provision_prompt(params(&registry, &ctx, &[]))
            .await
            .expect("provision");

        assert!(log.system_prompt().contains("Current time is"));
        assert!(log.llm_api().is_none());
    }

    #[tokio::test]
    async fn unknown_api_yields_a_displayable_response() {
        let registry = registry();
        let ctx = InvocationContext::new("amber-hearth");
        let mut log = log();
        let conversation_id = log.conversation_id();

        let err = log
            .provision_prompt(params(&registry, &ctx, &["weather"]))
            .await
            .expect_err("should fail");

        assert!(matches!(err.kind, ProvisionErrorKind::ApiResolution(_)));
        assert_eq!(err.response.conversation_id, conversation_id);
        assert_eq!(err.response.speech, "Error preparing LLM API");
        // The system slot is untouched on failure.
        assert_eq!(log.system_prompt(), "");
    }

    #[tokio::test]
    async fn template_failure_yields_a_displayable_response() {
        let registry = registry();
        let ctx = InvocationContext::new("amber-hearth");
        let mut log = log();

        let mut p = params(&registry, &ctx, &[]);
        p.base_prompt_template = Some("Hello {{missing}}".to_string());
        let err = log.provision_prompt(p).await.expect_err("should fail");

        assert!(matches!(err.kind, ProvisionErrorKind::Template(_)));
        assert_eq!(
            err.response.speech,
            "Sorry, I had a problem with my instructions"
        );
    }

    #[tokio::test]
    async fn user_name_is_resolved_when_available() {
        let registry = registry();
        let ctx = InvocationContext::new("amber-hearth").with_user_id(UserId::new());
        let mut log = log();

        let mut p = params(&registry, &ctx, &[]);
        p.identity = Some(&NamedResolver);
        log.provision_prompt(p).await.expect("provision");
        assert!(log.system_prompt().contains("Alice"));

        let mut anonymous = log;
        anonymous
            .provision_prompt(params(&registry, &ctx, &[]))
            .await
            .expect("provision");
        assert!(anonymous.system_prompt().contains("the user"));
    }

    #[tokio::test]
    async fn extra_system_prompt_is_sticky_across_turns() {
        let registry = registry();
        let ctx = InvocationContext::new("amber-hearth");
        let mut log = log();

        let mut p = params(&registry, &ctx, &[]);
        p.extra_system_prompt = Some("The back door was left open.".to_string());
        log.provision_prompt(p).await.expect("provision");
        assert!(log.system_prompt().contains("back door"));

        // Next turn supplies nothing; the stored value carries forward.
        log.provision_prompt(params(&registry, &ctx, &[]))
            .await
            .expect("provision");
        assert!(log.system_prompt().contains("back door"));

        // A new value replaces the stored one.
        let mut p = params(&registry, &ctx, &[]);
        p.extra_system_prompt = Some("Guests are sleeping upstairs.".to_string());
        log.provision_prompt(p).await.expect("provision");
        assert!(!log.system_prompt().contains("back door"));
        assert!(log.system_prompt().contains("Guests are sleeping"));
    }
}
