use std::time::Duration;

use reqwest::Client;

use crate::client::ImageOptions;
use crate::config::{DEFAULT_IMAGE_BASE_URL, DEFAULT_IMAGE_PROBE_TIMEOUT};
use crate::error::RemoteError;

/// Locator builder for the Pollinations image service. Images are generated
/// on first fetch of the locator, so no request is needed to "start" one.
#[derive(Clone)]
pub struct PollinationsImages {
    client: Client,
    base_url: String,
    probe_timeout: Duration,
}

impl Default for PollinationsImages {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_BASE_URL)
    }
}

impl PollinationsImages {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            probe_timeout: DEFAULT_IMAGE_PROBE_TIMEOUT,
        }
    }

    /// Upper bound on a single probe, so a stalled render can't hold the
    /// avatar request open.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn build_locator(&self, prompt: &str, options: &ImageOptions) -> String {
        let mut url = format!(
            "{}/{}?width={}&height={}",
            self.base_url,
            urlencoding::encode(prompt),
            options.width,
            options.height,
        );
        if options.suppress_watermark {
            url.push_str("&nologo=true");
        }
        url
    }

    /// Fetch the locator and fail unless the service answers 2xx.
    pub async fn probe(&self, locator: &str) -> Result<(), RemoteError> {
        let response = self
            .client
            .get(locator)
            .timeout(self.probe_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_is_percent_encoded() {
        let images = PollinationsImages::default();
        let url = images.build_locator("a red fox", &ImageOptions::default());
        assert_eq!(
            url,
            "https://image.pollinations.ai/prompt/a%20red%20fox?width=512&height=512&nologo=true"
        );
    }

    #[test]
    fn test_reserved_characters_stay_inside_path_segment() {
        let images = PollinationsImages::new("http://localhost:9000/prompt/");
        let url = images.build_locator("cats & dogs?/#1", &ImageOptions::default());
        assert!(url.starts_with("http://localhost:9000/prompt/cats%20%26%20dogs%3F%2F%231?"));
    }

    #[test]
    fn test_fetch_timeout_defaults_and_overrides() {
        let images = PollinationsImages::default();
        assert_eq!(images.probe_timeout, DEFAULT_IMAGE_PROBE_TIMEOUT);

        let images = images.with_probe_timeout(Duration::from_secs(5));
        assert_eq!(images.probe_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_watermark_flag_is_optional() {
        let images = PollinationsImages::default();
        let options = ImageOptions {
            width: 256,
            height: 128,
            suppress_watermark: false,
        };
        let url = images.build_locator("wolf", &options);
        assert!(url.ends_with("/wolf?width=256&height=128"));
    }
}
