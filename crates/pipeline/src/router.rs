//! Decides, for a finished user turn, whether the response comes from the
//! reference LLM directly or from a registered agent. Two passes feed the
//! same decision: a cheap pattern-matched hint on interim transcripts, and
//! an LLM-adjudicated final decision once the transcript is final.

use regex::Regex;

use vox_core::{AgentDescriptor, Conversation, LanguageModel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Agent(String),
    Direct,
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Minimum word count an interim transcript needs before the early-
    /// intent pass is allowed to produce a hint.
    pub min_words_for_hint: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { min_words_for_hint: 3 }
    }
}

/// One (pattern, route) pair in the early-intent table.
pub struct RoutePattern {
    pub pattern: Regex,
    pub route: Route,
}

pub struct Router {
    config: RouterConfig,
    patterns: Vec<RoutePattern>,
    agents: Vec<AgentDescriptor>,
}

impl Router {
    pub fn new(config: RouterConfig, agents: Vec<AgentDescriptor>) -> Self {
        Self { config, patterns: Vec::new(), agents }
    }

    /// Registers a keyword pattern that, if matched against normalised
    /// interim text, produces an early routing hint.
    pub fn with_pattern(mut self, pattern: &str, route: Route) -> Self {
        let regex = Regex::new(pattern).expect("router pattern must be a valid regex");
        self.patterns.push(RoutePattern { pattern: regex, route });
        self
    }

    /// Early-intent pass over an interim transcript. Returns `None` below
    /// the word-count gate or when nothing matches; the orchestrator treats
    /// this as a hint only, never as a committed route.
    pub fn early_intent(&self, interim_text: &str) -> Option<Route> {
        if interim_text.split_whitespace().count() < self.config.min_words_for_hint {
            return None;
        }
        let normalised = interim_text.to_lowercase();
        self.patterns
            .iter()
            .find(|p| p.pattern.is_match(&normalised))
            .map(|p| p.route.clone())
    }

    /// Final routing pass. Asks the LLM for exactly `AGENT:<name>` or
    /// `DIRECT`; falls back to `Direct` on any parse failure or empty agent
    /// registry, never panics on a malformed reply.
    pub async fn decide_final(
        &self,
        final_text: &str,
        history: &Conversation,
        llm: &dyn LanguageModel,
        hint: Option<&Route>,
    ) -> Route {
        if let Some(route) = hint {
            if *route != Route::Direct {
                return route.clone();
            }
        }

        if self.agents.is_empty() {
            return Route::Direct;
        }

        let prompt = self.build_routing_prompt(final_text);
        match llm.generate(&prompt, history).await {
            Ok(reply) => self.parse_route(&reply),
            Err(e) => {
                tracing::warn!(error = %e, "router llm call failed, defaulting to direct");
                Route::Direct
            }
        }
    }

    fn build_routing_prompt(&self, final_text: &str) -> String {
        let mut prompt = String::from(
            "You are a routing classifier. Reply with exactly one line: either \
             `AGENT:<name>` naming one of the agents below, or `DIRECT`. \
             Do not explain your answer.\n\nAgents:\n",
        );
        for agent in &self.agents {
            prompt.push_str(&format!("- {}: {}\n", agent.name, agent.description));
        }
        prompt.push_str(&format!("\nUser said: \"{final_text}\"\n"));
        prompt
    }

    fn parse_route(&self, reply: &str) -> Route {
        let trimmed = reply.trim();
        if let Some(name) = trimmed.strip_prefix("AGENT:") {
            let name = name.trim();
            if self.agents.iter().any(|a| a.name == name) {
                return Route::Agent(name.to_string());
            }
        }
        Route::Direct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::pin::Pin;
    use futures::Stream;

    struct StubLlm(String);

    #[async_trait]
    impl LanguageModel for StubLlm {
        async fn generate(&self, _prompt: &str, _history: &Conversation) -> vox_core::Result<String> {
            Ok(self.0.clone())
        }

        fn generate_stream<'a>(
            &'a self,
            _prompt: &'a str,
            _history: &'a Conversation,
        ) -> Pin<Box<dyn Stream<Item = vox_core::Result<String>> + Send + 'a>> {
            Box::pin(futures::stream::empty())
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    #[test]
    fn test_early_intent_requires_word_count() {
        let router = Router::new(RouterConfig::default(), vec![])
            .with_pattern("weather", Route::Agent("weather".into()));
        assert_eq!(router.early_intent("weather"), None);
        assert_eq!(
            router.early_intent("what is the weather like"),
            Some(Route::Agent("weather".into()))
        );
    }

    #[tokio::test]
    async fn test_decide_final_direct_when_no_agents() {
        let router = Router::new(RouterConfig::default(), vec![]);
        let llm = StubLlm("AGENT:weather".into());
        let history = Conversation::default();
        let route = router.decide_final("what's the weather", &history, &llm, None).await;
        assert_eq!(route, Route::Direct);
    }

    #[tokio::test]
    async fn test_decide_final_parses_agent_reply() {
        let agents = vec![AgentDescriptor::new("weather", "reports current weather")];
        let router = Router::new(RouterConfig::default(), agents);
        let llm = StubLlm("AGENT:weather".into());
        let history = Conversation::default();
        let route = router.decide_final("what's the weather", &history, &llm, None).await;
        assert_eq!(route, Route::Agent("weather".into()));
    }

    #[tokio::test]
    async fn test_decide_final_falls_back_on_garbage_reply() {
        let agents = vec![AgentDescriptor::new("weather", "reports current weather")];
        let router = Router::new(RouterConfig::default(), agents);
        let llm = StubLlm("I'm not sure what you mean".into());
        let history = Conversation::default();
        let route = router.decide_final("huh", &history, &llm, None).await;
        assert_eq!(route, Route::Direct);
    }

    #[tokio::test]
    async fn test_hint_skips_llm_call() {
        let agents = vec![AgentDescriptor::new("weather", "reports current weather")];
        let router = Router::new(RouterConfig::default(), agents);
        let llm = StubLlm("DIRECT".into());
        let history = Conversation::default();
        let hint = Route::Agent("weather".into());
        let route = router.decide_final("what's the weather", &history, &llm, Some(&hint)).await;
        assert_eq!(route, Route::Agent("weather".into()));
    }
}
