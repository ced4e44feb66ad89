//! Scripted Provider
//!
//! For testing and demos. Replies are produced by a closure over the
//! conversation so a single provider can play both the orchestrating model
//! and the decision-tool model.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::Result;
use crate::message::Message;
use crate::provider::{Completion, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo};

type Responder = dyn Fn(&[Message]) -> Completion + Send + Sync;

/// Provider whose replies come from a closure
pub struct ScriptedProvider {
    responder: Box<Responder>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(responder: impl Fn(&[Message]) -> Completion + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the same text
    pub fn constant(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Completion::text(text.clone(), "scripted"))
    }

    /// Answer from a fixed script, repeating the last entry once exhausted
    pub fn sequence(replies: Vec<String>) -> Self {
        let next = AtomicUsize::new(0);
        Self::new(move |_| {
            let i = next.fetch_add(1, Ordering::SeqCst);
            let reply = replies
                .get(i)
                .or_else(|| replies.last())
                .cloned()
                .unwrap_or_default();
            Completion::text(reply, "scripted")
        })
    }

    /// Number of completions served
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Content of the last message of every request, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        Ok(ProviderInfo {
            name: "Scripted".into(),
            models: self.list_models().await?,
            supports_tools: false,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        _options: &GenerationOptions,
    ) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let (Ok(mut prompts), Some(last)) = (self.prompts.lock(), messages.last()) {
            prompts.push(last.content.clone());
        }
        Ok((self.responder)(messages))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo {
            id: "scripted".into(),
            name: "Scripted".into(),
            context_length: None,
        }])
    }
}
