use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::ai::PollinationsImages;
use crate::client::{ImageOptions, RemoteGenerationClient};
use crate::error::RemoteError;

/// Scripted client: hands out queued replies and records every prompt.
pub struct FakeClient {
    replies: Mutex<VecDeque<Result<String, RemoteError>>>,
    prompts: Mutex<Vec<String>>,
    probe_fails: bool,
    images: PollinationsImages,
}

impl FakeClient {
    pub fn replying<const N: usize>(replies: [&str; N]) -> Self {
        Self::with_results(replies.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn failing() -> Self {
        Self::with_results(vec![Err(RemoteError::Status {
            status: 503,
            body: "service unavailable".to_string(),
        })])
    }

    pub fn with_failing_probe(mut self) -> Self {
        self.probe_fails = true;
        self
    }

    fn with_results(results: Vec<Result<String, RemoteError>>) -> Self {
        Self {
            replies: Mutex::new(results.into()),
            prompts: Mutex::new(Vec::new()),
            probe_fails: false,
            images: PollinationsImages::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteGenerationClient for FakeClient {
    async fn generate_reply(&self, prompt: &str) -> Result<String, RemoteError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::Malformed("no scripted reply".to_string())))
    }

    fn build_image_locator(&self, prompt: &str, options: &ImageOptions) -> String {
        self.images.build_locator(prompt, options)
    }

    async fn probe_image(&self, _locator: &str) -> Result<(), RemoteError> {
        if self.probe_fails {
            Err(RemoteError::Status {
                status: 500,
                body: "generation failed".to_string(),
            })
        } else {
            Ok(())
        }
    }
}
