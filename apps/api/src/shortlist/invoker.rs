//! Completion Invoker — turns a prompt into a parsed JSON object.
//!
//! Order of attempts:
//! 1. each configured model in JSON mode, parsed strictly;
//! 2. one unconstrained call asking for a bare object, then fence stripping
//!    and brace matching before parsing.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::llm_client::prompts::{BRACES_ONLY_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{parse_loose_json, CompletionRequest, CompletionService};
use crate::shortlist::ShortlistError;

pub const DEFAULT_TEMPERATURE: f32 = 0.3;

#[derive(Clone)]
pub struct CompletionInvoker {
    service: Arc<dyn CompletionService>,
    models: Arc<[String]>,
    temperature: f32,
}

impl CompletionInvoker {
    /// Fails with `Configuration` when no model is configured.
    pub fn new(
        service: Arc<dyn CompletionService>,
        models: &[String],
        temperature: f32,
    ) -> Result<Self, ShortlistError> {
        if models.is_empty() {
            return Err(ShortlistError::Configuration(
                "No completion models configured".to_string(),
            ));
        }
        Ok(Self {
            service,
            models: models.into(),
            temperature,
        })
    }

    pub async fn invoke_json(&self, system: &str, prompt: &str) -> Result<Value, ShortlistError> {
        let json_system = format!("{system} {JSON_ONLY_SYSTEM}");
        let mut last_error = String::from("no attempt made");

        for model in self.models.iter() {
            let result = self
                .service
                .complete(CompletionRequest {
                    model,
                    system: &json_system,
                    user: prompt,
                    temperature: self.temperature,
                    json_mode: true,
                })
                .await;

            match result {
                Ok(text) => match parse_object(text.trim()) {
                    Ok(value) => {
                        debug!("Model {model} returned a parseable verdict");
                        return Ok(value);
                    }
                    Err(e) => {
                        warn!("Model {model} returned unparseable JSON: {e}");
                        last_error = format!("{model}: {e}");
                    }
                },
                Err(e) => {
                    warn!("Model {model} failed: {e}");
                    last_error = format!("{model}: {e}");
                }
            }
        }

        // Unconstrained fallback on the primary model.
        let model = &self.models[0];
        let fallback_prompt = format!("{prompt}{BRACES_ONLY_INSTRUCTION}");
        let result = self
            .service
            .complete(CompletionRequest {
                model,
                system,
                user: &fallback_prompt,
                temperature: self.temperature,
                json_mode: false,
            })
            .await;

        match result {
            Ok(text) => parse_loose_json(&text)
                .map_err(|e| e.to_string())
                .and_then(ensure_object)
                .map_err(|e| {
                    ShortlistError::Evaluation(format!(
                        "No model produced parseable JSON (fallback {model}: {e}; last JSON-mode error: {last_error})"
                    ))
                }),
            Err(e) => Err(ShortlistError::Evaluation(format!(
                "No model produced parseable JSON (fallback {model}: {e}; last JSON-mode error: {last_error})"
            ))),
        }
    }
}

fn parse_object(text: &str) -> Result<Value, String> {
    serde_json::from_str::<Value>(text)
        .map_err(|e| e.to_string())
        .and_then(ensure_object)
}

fn ensure_object(value: Value) -> Result<Value, String> {
    if value.is_object() {
        Ok(value)
    } else {
        Err("response is not a JSON object".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Reply, ScriptedCompletion};

    fn models() -> Vec<String> {
        vec!["primary".to_string(), "secondary".to_string()]
    }

    #[tokio::test]
    async fn test_first_model_success_short_circuits() {
        let llm = Arc::new(ScriptedCompletion::new(vec![Reply::Text(
            r#"{"recommendation": "shortlist"}"#.to_string(),
        )]));
        let invoker = CompletionInvoker::new(llm.clone(), &models(), DEFAULT_TEMPERATURE).unwrap();

        let value = invoker.invoke_json("sys", "prompt").await.unwrap();

        assert_eq!(value["recommendation"], "shortlist");
        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "primary");
        assert!(calls[0].json_mode);
    }

    #[tokio::test]
    async fn test_unparseable_output_falls_through_to_next_model() {
        let llm = Arc::new(ScriptedCompletion::new(vec![
            Reply::Text("not json at all".to_string()),
            Reply::Text(r#"{"recommendation": "reject"}"#.to_string()),
        ]));
        let invoker = CompletionInvoker::new(llm.clone(), &models(), DEFAULT_TEMPERATURE).unwrap();

        let value = invoker.invoke_json("sys", "prompt").await.unwrap();

        assert_eq!(value["recommendation"], "reject");
        let models_called: Vec<_> = llm.calls().into_iter().map(|c| c.model).collect();
        assert_eq!(models_called, vec!["primary", "secondary"]);
    }

    #[tokio::test]
    async fn test_fallback_extracts_fenced_json_with_prose() {
        let llm = Arc::new(ScriptedCompletion::new(vec![
            Reply::Fail("rate limited".to_string()),
            Reply::Fail("model not found".to_string()),
            Reply::Text(
                "Here is my evaluation:\n```json\n{\"recommendation\": \"shortlist\", \"confidence\": 77}\n```\nThanks!"
                    .to_string(),
            ),
        ]));
        let invoker = CompletionInvoker::new(llm.clone(), &models(), DEFAULT_TEMPERATURE).unwrap();

        let value = invoker.invoke_json("sys", "prompt").await.unwrap();

        assert_eq!(value["confidence"], 77);
        let calls = llm.calls();
        assert_eq!(calls.len(), 3);
        assert!(!calls[2].json_mode);
        assert!(calls[2].user.ends_with(BRACES_ONLY_INSTRUCTION));
    }

    #[tokio::test]
    async fn test_all_attempts_failing_is_evaluation_error() {
        let llm = Arc::new(ScriptedCompletion::new(vec![
            Reply::Fail("boom".to_string()),
            Reply::Text("[1, 2, 3]".to_string()),
            Reply::Text("I refuse to answer in JSON.".to_string()),
        ]));
        let invoker = CompletionInvoker::new(llm, &models(), DEFAULT_TEMPERATURE).unwrap();

        let err = invoker.invoke_json("sys", "prompt").await.unwrap_err();

        match err {
            ShortlistError::Evaluation(msg) => assert!(msg.contains("No model produced parseable JSON")),
            other => panic!("expected evaluation error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_model_list_is_configuration_error() {
        let llm = Arc::new(ScriptedCompletion::new(vec![]));
        let result = CompletionInvoker::new(llm, &[], DEFAULT_TEMPERATURE);
        assert!(matches!(result, Err(ShortlistError::Configuration(_))));
    }
}
