//! Scripted provider shared by the processing unit tests.

use crate::llm::{DEFAULT_RETRY_HINT, LanguageModelProvider, ProviderError};
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub(crate) enum Step {
    Reply(String),
    Quota,
    Status(u16, &'static str),
    MissingCredential,
}

impl Step {
    fn into_result(self) -> Result<String, ProviderError> {
        match self {
            Step::Reply(text) => Ok(text),
            Step::Quota => Err(ProviderError::QuotaExceeded {
                retry_hint: DEFAULT_RETRY_HINT.into(),
            }),
            Step::Status(code, body) => Err(ProviderError::UnexpectedStatus {
                status: reqwest::StatusCode::from_u16(code).expect("status code"),
                body: body.into(),
            }),
            Step::MissingCredential => Err(ProviderError::MissingCredential { provider: "keyed" }),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub(crate) prompt: String,
    pub(crate) temperature: f32,
    pub(crate) at: Instant,
}

/// Replays `steps` in order, repeating the last one once the script runs out.
pub(crate) struct ScriptedProvider {
    steps: Vec<Step>,
    ready: bool,
    context_window: usize,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub(crate) fn with_steps(steps: Vec<Step>) -> Self {
        Self {
            steps,
            ready: true,
            context_window: 1_000_000,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying<const N: usize>(replies: [&str; N]) -> Self {
        Self::with_steps(
            replies
                .into_iter()
                .map(|reply| Step::Reply(reply.to_string()))
                .collect(),
        )
    }

    pub(crate) fn failing_with_quota() -> Self {
        Self::with_steps(vec![Step::Quota])
    }

    pub(crate) fn without_credential() -> Self {
        Self {
            ready: false,
            ..Self::with_steps(vec![Step::MissingCredential])
        }
    }

    pub(crate) fn with_context_window(mut self, tokens: usize) -> Self {
        self.context_window = tokens;
        self
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

#[async_trait]
impl LanguageModelProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn context_window(&self) -> usize {
        self.context_window
    }

    fn check_ready(&self) -> Result<(), ProviderError> {
        if self.ready {
            Ok(())
        } else {
            Err(ProviderError::MissingCredential { provider: "keyed" })
        }
    }

    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError> {
        let index = {
            let mut calls = self.calls.lock().expect("calls lock");
            calls.push(RecordedCall {
                prompt: prompt.to_string(),
                temperature,
                at: Instant::now(),
            });
            calls.len() - 1
        };
        let step = self
            .steps
            .get(index)
            .or_else(|| self.steps.last())
            .cloned()
            .unwrap_or(Step::Reply(String::new()));
        step.into_result()
    }
}
