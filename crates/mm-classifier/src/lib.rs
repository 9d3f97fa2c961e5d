//! Placement classifier client.
//!
//! The service exposes three operations (threshold grouping, art-style and
//! mood/theme classification). This crate provides the [`Classifier`]
//! abstraction over them, an HTTP implementation, and the glue that maps
//! results back onto board nodes. Any error is a signal for the caller to
//! fall back to the offline labels in `mm_core::mock`.

pub mod config;
pub mod http;
pub mod resolve;
pub mod wire;

use async_trait::async_trait;
use mm_core::GroupType;

pub use config::ClassifierConfig;
pub use http::HttpClassifier;
pub use resolve::{Classified, Labels, RequestSnapshot, resolve};
pub use wire::{ClassifyRequest, MoodLabel, StyleLabel, TextMatches};

/// Error types for classifier calls
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no usable {0} input")]
    EmptyInput(GroupType),

    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for ClassifierError {
    fn from(e: serde_json::Error) -> Self {
        ClassifierError::Malformed(e.to_string())
    }
}

/// Thread-safety required of classifiers on native targets. Browser
/// futures are single-threaded, so wasm32 asks for nothing.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSync: Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Sync + ?Sized> MaybeSync for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSync {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSync for T {}

/// The three service operations, already normalized.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Classifier: MaybeSync {
    async fn group_by_threshold(
        &self,
        texts: Vec<String>,
        images: Vec<String>,
    ) -> Result<Vec<TextMatches>, ClassifierError>;

    async fn classify_art_style(&self, images: Vec<String>)
    -> Result<Vec<StyleLabel>, ClassifierError>;

    async fn classify_mood_theme(
        &self,
        texts: Vec<String>,
        images: Vec<String>,
    ) -> Result<Vec<MoodLabel>, ClassifierError>;

    /// Run the operation matching the snapshot's mode.
    async fn classify(&self, snapshot: &RequestSnapshot) -> Result<Labels, ClassifierError> {
        let mode = snapshot.mode();
        let request = snapshot.request().ok_or(ClassifierError::EmptyInput(mode))?;
        Ok(match mode {
            GroupType::Semantic => {
                Labels::Threshold(self.group_by_threshold(request.texts, request.images).await?)
            }
            GroupType::ArtStyle => Labels::Style(self.classify_art_style(request.images).await?),
            GroupType::MoodTheme => {
                Labels::Mood(self.classify_mood_theme(request.texts, request.images).await?)
            }
        })
    }
}
