//! State behind the avatar generator modal.
//!
//! The image service renders on first fetch of its locator, so there is no
//! completion signal to wait on. A request is considered done after a fixed
//! delay, optionally followed by a probe of the locator (see
//! [`RemoteGenerationClient::probe_image`]). The locator may still point at an
//! image that is not ready yet.

use std::time::Duration;

use crate::client::{ImageOptions, RemoteGenerationClient};
use crate::error::RemoteError;

/// An outstanding image request. Consumed when it completes.
#[derive(Debug)]
pub struct PendingImage {
    generation: u64,
    locator: String,
}

#[derive(Debug, Default)]
pub struct AvatarRequestController {
    prompt_text: String,
    is_generating: bool,
    image_ref: Option<String>,
    error: Option<String>,
    options: ImageOptions,
    // Bumped on every submit and dismiss so older tickets go stale.
    generation: u64,
}

impl AvatarRequestController {
    pub fn new(options: ImageOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn is_generating(&self) -> bool {
        self.is_generating
    }

    pub fn image_ref(&self) -> Option<&str> {
        self.image_ref.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn options(&self) -> ImageOptions {
        self.options
    }

    pub fn update_prompt(&mut self, text: impl Into<String>) {
        self.prompt_text = text.into();
    }

    /// Start generating an image for `text`.
    ///
    /// A no-op returning `None` when `text` is blank or a request is already
    /// outstanding.
    pub fn submit_prompt<C>(&mut self, client: &C, text: &str) -> Option<PendingImage>
    where
        C: RemoteGenerationClient + ?Sized,
    {
        let trimmed = text.trim();
        if trimmed.is_empty() || self.is_generating {
            return None;
        }

        self.generation += 1;
        self.is_generating = true;
        self.error = None;

        let locator = client.build_image_locator(trimmed, &self.options);
        tracing::debug!(generation = self.generation, %locator, "image requested");

        Some(PendingImage {
            generation: self.generation,
            locator,
        })
    }

    pub fn submit_current<C>(&mut self, client: &C) -> Option<PendingImage>
    where
        C: RemoteGenerationClient + ?Sized,
    {
        let prompt = self.prompt_text.clone();
        self.submit_prompt(client, &prompt)
    }

    /// Record the outcome of an image request. On failure the previous image
    /// is kept and an inline error is set.
    ///
    /// Returns false if `ticket` was superseded or dismissed.
    pub fn complete(&mut self, ticket: PendingImage, result: Result<(), RemoteError>) -> bool {
        if !self.is_generating || ticket.generation != self.generation {
            tracing::warn!(generation = ticket.generation, "ignoring stale image result");
            return false;
        }

        match result {
            Ok(()) => {
                tracing::info!(locator = %ticket.locator, "image ready");
                self.image_ref = Some(ticket.locator);
            }
            Err(err) => {
                tracing::error!(locator = %ticket.locator, "image generation failed: {err}");
                self.error = Some(format!("Image generation failed: {err}"));
            }
        }

        self.is_generating = false;
        true
    }

    /// Reset everything. Called when the modal is closed, so reopening it
    /// starts from a blank prompt and no image.
    pub fn dismiss(&mut self) {
        self.generation += 1;
        self.prompt_text.clear();
        self.is_generating = false;
        self.image_ref = None;
        self.error = None;
    }

    /// Submit, wait out the delay and record the result.
    pub async fn generate_and_wait<C>(
        &mut self,
        client: &C,
        text: &str,
        delay: Duration,
    ) -> Option<&str>
    where
        C: RemoteGenerationClient + ?Sized,
    {
        let ticket = self.submit_prompt(client, text)?;
        let result = resolve_image(client, &ticket, delay).await;
        self.complete(ticket, result);
        self.image_ref()
    }
}

/// Wait `delay` for the service to materialize the image, then probe it.
pub async fn resolve_image<C>(
    client: &C,
    ticket: &PendingImage,
    delay: Duration,
) -> Result<(), RemoteError>
where
    C: RemoteGenerationClient + ?Sized,
{
    tokio::time::sleep(delay).await;
    client.probe_image(&ticket.locator).await
}
