//! Host-facing grouping steps, independent of the browser.
//!
//! The page performs the HTTP call itself, so a run is split around it:
//! `begin` hands out the request, `receive_*` feeds back the outcome and
//! `finish` applies the layout once the reveal delay has passed.

use mm_classifier::http::{ART_STYLE_PATH, GROUP_THRESHOLD_PATH, MOOD_THEME_PATH};
use mm_classifier::{ClassifierConfig, ClassifierError, Labels, wire};
use mm_core::{Group, GroupType, KeyValueStore};
use mm_editor::{BoardSession, GroupingConfig, GroupingError, GroupingState, Notice, NoticeKind};

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("unknown grouping mode {0:?}")]
    UnknownMode(String),

    #[error("no grouping request in flight ({0})")]
    NotRequesting(&'static str),

    #[error(transparent)]
    Grouping(#[from] GroupingError),

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A board session plus the service location handed to the page.
pub struct BoardBridge<S: KeyValueStore> {
    session: BoardSession<S>,
    classifier: ClassifierConfig,
}

impl<S: KeyValueStore> BoardBridge<S> {
    /// `service_url` replaces the default service location when non-blank.
    pub fn open(storage: S, board_id: &str, service_url: Option<&str>, config: GroupingConfig) -> Self {
        let classifier = match service_url.map(str::trim) {
            Some(url) if !url.is_empty() => ClassifierConfig::with_base_url(url),
            _ => ClassifierConfig::default(),
        };
        Self {
            session: BoardSession::open(storage, board_id, config),
            classifier,
        }
    }

    pub fn session(&self) -> &BoardSession<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut BoardSession<S> {
        &mut self.session
    }

    pub fn classifier(&self) -> &ClassifierConfig {
        &self.classifier
    }

    /// Start a run. Returns `{"url":...,"body":...}` for the page to POST,
    /// or nulls when nothing is usable and the run already fell back.
    pub fn begin(&mut self, mode: &str) -> Result<String, BridgeError> {
        let mode = GroupType::parse(mode).ok_or_else(|| BridgeError::UnknownMode(mode.to_string()))?;
        let snapshot = self.session.begin_grouping(mode)?;
        let reply = match snapshot.request() {
            Some(body) => serde_json::json!({
                "url": self.classifier.endpoint(endpoint_path(mode)),
                "body": body,
            }),
            None => {
                self.settle(Err(ClassifierError::EmptyInput(mode)))?;
                serde_json::json!({ "url": null, "body": null })
            }
        };
        Ok(reply.to_string())
    }

    /// Feed the raw response body. An unreadable body counts as a failed
    /// call. Returns the state the run settled in.
    pub fn receive_response(&mut self, body: &str) -> Result<&'static str, BridgeError> {
        let mode = self.pending_mode()?;
        self.settle(parse_labels(mode, body))
    }

    pub fn receive_failure(&mut self, reason: &str) -> Result<&'static str, BridgeError> {
        self.pending_mode()?;
        self.settle(Err(ClassifierError::Unavailable(reason.to_string())))
    }

    pub fn reveal_delay_ms(&self) -> u32 {
        let delay = self.session.cycle().config().reveal_delay.as_millis();
        u32::try_from(delay).unwrap_or(u32::MAX)
    }

    pub fn finish(&mut self) -> Result<Vec<Group>, BridgeError> {
        Ok(self.session.finish_layout()?)
    }

    pub fn take_notices(&mut self) -> String {
        notices_json(&self.session.drain_notices())
    }

    fn pending_mode(&self) -> Result<GroupType, BridgeError> {
        match self.session.cycle().state() {
            GroupingState::Requesting { snapshot } => Ok(snapshot.mode()),
            other => Err(BridgeError::NotRequesting(other.name())),
        }
    }

    fn settle(&mut self, outcome: Result<Labels, ClassifierError>) -> Result<&'static str, BridgeError> {
        self.session.complete_grouping(outcome)?;
        let state = self.session.cycle().state().name();
        self.session.start_layout()?;
        Ok(state)
    }
}

fn endpoint_path(mode: GroupType) -> &'static str {
    match mode {
        GroupType::Semantic => GROUP_THRESHOLD_PATH,
        GroupType::ArtStyle => ART_STYLE_PATH,
        GroupType::MoodTheme => MOOD_THEME_PATH,
    }
}

fn parse_labels(mode: GroupType, body: &str) -> Result<Labels, ClassifierError> {
    Ok(match mode {
        GroupType::Semantic => Labels::Threshold(wire::parse_threshold(body)?),
        GroupType::ArtStyle => Labels::Style(wire::parse_art_style(body)?),
        GroupType::MoodTheme => Labels::Mood(wire::parse_mood_theme(body)?),
    })
}

fn notices_json(notices: &[Notice]) -> String {
    let list: Vec<serde_json::Value> = notices
        .iter()
        .map(|n| {
            let kind = match n.kind {
                NoticeKind::Error => "error",
                NoticeKind::Fallback => "fallback",
            };
            serde_json::json!({ "kind": kind, "message": n.message })
        })
        .collect();
    serde_json::Value::Array(list).to_string()
}
