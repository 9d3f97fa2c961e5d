//! Request bodies and response shapes of the placement service.
//!
//! Responses are parsed leniently: entries the service marks with an
//! `error`, or that lack the field a label is read from, are dropped
//! rather than failing the whole batch.

use crate::ClassifierError;
use serde::{Deserialize, Serialize};

/// Body for all three endpoints. Art-style requests send empty `texts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassifyRequest {
    pub texts: Vec<String>,
    pub images: Vec<String>,
}

/// One `/group-threshold` entry: a text and the images close to it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextMatches {
    pub text: String,
    #[serde(default)]
    pub matches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleLabel {
    pub image: String,
    pub style: String,
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoodLabel {
    pub content: String,
    pub mood: String,
    pub theme: Option<String>,
    pub confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct RawStyle {
    image: Option<String>,
    style: Option<String>,
    confidence: Option<f32>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStyleResponse {
    Wrapped { classifications: Vec<RawStyle> },
    Bare(Vec<RawStyle>),
}

#[derive(Debug, Deserialize)]
struct RawMood {
    content: Option<String>,
    text: Option<String>,
    image: Option<String>,
    mood: Option<String>,
    theme: Option<String>,
    mood_confidence: Option<f32>,
    error: Option<String>,
}

/// Style the service reports when it could not look at an image.
const UNKNOWN_STYLE: &str = "unknown";

pub fn parse_threshold(body: &str) -> Result<Vec<TextMatches>, ClassifierError> {
    Ok(serde_json::from_str(body)?)
}

pub fn parse_art_style(body: &str) -> Result<Vec<StyleLabel>, ClassifierError> {
    let raw = match serde_json::from_str::<RawStyleResponse>(body)? {
        RawStyleResponse::Wrapped { classifications } => classifications,
        RawStyleResponse::Bare(entries) => entries,
    };
    Ok(raw
        .into_iter()
        .filter_map(|e| {
            if let Some(err) = &e.error {
                log::debug!("art-style: skipping entry: {err}");
                return None;
            }
            let style = e.style.filter(|s| !s.is_empty() && s.as_str() != UNKNOWN_STYLE)?;
            Some(StyleLabel {
                image: e.image?,
                style,
                confidence: e.confidence,
            })
        })
        .collect())
}

pub fn parse_mood_theme(body: &str) -> Result<Vec<MoodLabel>, ClassifierError> {
    let raw: Vec<RawMood> = serde_json::from_str(body)?;
    Ok(raw
        .into_iter()
        .filter_map(|e| {
            if let Some(err) = &e.error {
                log::debug!("mood-theme: skipping entry: {err}");
                return None;
            }
            Some(MoodLabel {
                content: e.content.or(e.text).or(e.image)?,
                mood: e.mood.filter(|m| !m.is_empty())?,
                theme: e.theme,
                confidence: e.mood_confidence,
            })
        })
        .collect())
}
