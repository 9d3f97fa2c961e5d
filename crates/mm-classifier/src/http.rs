//! HTTP implementation against the placement service.

use async_trait::async_trait;

use crate::config::ClassifierConfig;
use crate::wire::{self, ClassifyRequest, MoodLabel, StyleLabel, TextMatches};
use crate::{Classifier, ClassifierError};

pub const GROUP_THRESHOLD_PATH: &str = "group-threshold";
pub const ART_STYLE_PATH: &str = "classify-art-style";
pub const MOOD_THEME_PATH: &str = "classify-mood-theme";

/// Classifier backed by the placement service's JSON endpoints.
pub struct HttpClassifier {
    /// HTTP client for API requests
    http_client: reqwest::Client,
    config: ClassifierConfig,
}

impl HttpClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifierError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(config.timeout());
        Ok(Self {
            http_client: builder.build()?,
            config,
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// POST `body` and return the response text. Non-2xx is an error.
    async fn post(&self, path: &str, body: &ClassifyRequest) -> Result<String, ClassifierError> {
        let url = self.config.endpoint(path);
        log::debug!(
            "POST {url} ({} text(s), {} image(s))",
            body.texts.len(),
            body.images.len()
        );
        let response = self.http_client.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("{url} returned {status}");
            return Err(ClassifierError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Classifier for HttpClassifier {
    async fn group_by_threshold(
        &self,
        texts: Vec<String>,
        images: Vec<String>,
    ) -> Result<Vec<TextMatches>, ClassifierError> {
        let body = self
            .post(GROUP_THRESHOLD_PATH, &ClassifyRequest { texts, images })
            .await?;
        wire::parse_threshold(&body)
    }

    async fn classify_art_style(
        &self,
        images: Vec<String>,
    ) -> Result<Vec<StyleLabel>, ClassifierError> {
        let request = ClassifyRequest {
            texts: Vec::new(),
            images,
        };
        let body = self.post(ART_STYLE_PATH, &request).await?;
        wire::parse_art_style(&body)
    }

    async fn classify_mood_theme(
        &self,
        texts: Vec<String>,
        images: Vec<String>,
    ) -> Result<Vec<MoodLabel>, ClassifierError> {
        let body = self
            .post(MOOD_THEME_PATH, &ClassifyRequest { texts, images })
            .await?;
        wire::parse_mood_theme(&body)
    }
}
