//! # LLM Helpers
//!
//! Provider dispatch for radkit clients. The provider match lives here once;
//! callers supply the body that runs against whichever client was built.

/// Build the radkit client for `$config.provider` and evaluate `$body` with it
/// bound to `$llm`.
///
/// Client constructors read their API key through radkit (`from_env`), so
/// this is the only place provider credentials are resolved. Construction
/// errors are propagated with `?`; the enclosing function must return
/// `anyhow::Result`.
#[macro_export]
macro_rules! with_provider_llm {
    ($config:expr, |$llm:ident| $body:expr) => {{
        use radkit::models::providers::{
            AnthropicLlm, DeepSeekLlm, GeminiLlm, GrokLlm, OpenAILlm, OpenRouterLlm,
        };
        use $crate::models::LlmProvider;

        let config = $config;
        match config.provider {
            LlmProvider::Anthropic => {
                let $llm = AnthropicLlm::from_env(&config.model)?;
                $body
            }
            LlmProvider::OpenAI => {
                let mut client = OpenAILlm::from_env(&config.model)?;
                if let Some(base_url) = &config.base_url {
                    client = client.with_base_url(base_url);
                }
                let $llm = client;
                $body
            }
            LlmProvider::Gemini => {
                let $llm = GeminiLlm::from_env(&config.model)?;
                $body
            }
            LlmProvider::OpenRouter => {
                let $llm = OpenRouterLlm::from_env(&config.model)?;
                $body
            }
            LlmProvider::Grok => {
                let $llm = GrokLlm::from_env(&config.model)?;
                $body
            }
            LlmProvider::DeepSeek => {
                let $llm = DeepSeekLlm::from_env(&config.model)?;
                $body
            }
        }
    }};
}

/// Run a structured-output `LlmFunction` against the configured provider.
#[macro_export]
macro_rules! run_llm_function {
    ($config:expr, $output_type:ty, $system_prompt:expr, $input:expr) => {{
        use radkit::agent::LlmFunction;

        let result: anyhow::Result<$output_type> = $crate::with_provider_llm!($config, |llm| {
            let func =
                LlmFunction::<$output_type>::new_with_system_instructions(llm, $system_prompt);
            func.run($input).await.map_err(Into::into)
        });
        result
    }};
}

pub use run_llm_function;
pub use with_provider_llm;
