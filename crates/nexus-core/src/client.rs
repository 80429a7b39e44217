//! The seam between the state machines and the hosted services.

use async_trait::async_trait;

use crate::ai::{GeminiClient, PollinationsImages};
use crate::config::{Config, DEFAULT_IMAGE_PROBE_TIMEOUT};
use crate::error::RemoteError;

/// Fixed parameters baked into every image locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    pub width: u32,
    pub height: u32,
    pub suppress_watermark: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            suppress_watermark: true,
        }
    }
}

#[async_trait]
pub trait RemoteGenerationClient: Send + Sync {
    /// Send `prompt` to the language model and return its full completion.
    async fn generate_reply(&self, prompt: &str) -> Result<String, RemoteError>;

    /// Build a fetchable locator for an image of `prompt`. Does not check that
    /// the resource exists.
    fn build_image_locator(&self, prompt: &str, options: &ImageOptions) -> String;

    /// Check that the image behind `locator` is ready. The default assumes it is.
    async fn probe_image(&self, _locator: &str) -> Result<(), RemoteError> {
        Ok(())
    }
}

/// Gemini for replies, Pollinations for images.
#[derive(Clone)]
pub struct HostedClient {
    gemini: GeminiClient,
    images: PollinationsImages,
    verify_images: bool,
}

impl HostedClient {
    pub fn new(gemini: GeminiClient, images: PollinationsImages) -> Self {
        Self {
            gemini,
            images,
            verify_images: false,
        }
    }

    pub fn with_image_verification(mut self, verify: bool) -> Self {
        self.verify_images = verify;
        self
    }

    pub fn from_config(config: &Config) -> Result<Self, RemoteError> {
        let gemini = GeminiClient::builder(config.resolve_api_key())
            .model(&config.model)
            .base_url(&config.api_base_url)
            .timeout(config.request_timeout())
            .build()?;
        let probe_timeout = config.request_timeout().unwrap_or(DEFAULT_IMAGE_PROBE_TIMEOUT);
        let images =
            PollinationsImages::new(&config.image_base_url).with_probe_timeout(probe_timeout);

        Ok(Self::new(gemini, images).with_image_verification(config.verify_images))
    }

    pub fn model(&self) -> &str {
        self.gemini.model()
    }
}

#[async_trait]
impl RemoteGenerationClient for HostedClient {
    async fn generate_reply(&self, prompt: &str) -> Result<String, RemoteError> {
        self.gemini.generate_content(prompt).await
    }

    fn build_image_locator(&self, prompt: &str, options: &ImageOptions) -> String {
        self.images.build_locator(prompt, options)
    }

    async fn probe_image(&self, locator: &str) -> Result<(), RemoteError> {
        if self.verify_images {
            self.images.probe(locator).await
        } else {
            Ok(())
        }
    }
}
