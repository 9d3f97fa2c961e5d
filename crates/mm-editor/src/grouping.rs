//! Grouping cycle state machine.
//!
//! ```text
//! Idle ─trigger─▶ Requesting ─labels──▶ Success ──┐
//!                     │                          ├─start─▶ LayingOut ─finish─▶ Idle
//!                     └──────failure──▶ Fallback ┘
//! ```
//!
//! Only one cycle runs at a time. The board stays editable while a request
//! is in flight. Members deleted or unstaged in the meantime are dropped
//! when the layout is applied; the rest of the cycle goes ahead.

use std::future::Future;
use std::time::Duration;

use mm_classifier::{Classified, Classifier, ClassifierError, Labels, RequestSnapshot, resolve};
use mm_core::layout::{GroupLayout, LayoutConfig, apply_layout, layout_partition};
use mm_core::{Board, Group, GroupType, NodeKind, NodeStore};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupingError {
    #[error("place some notes or images on the board before grouping")]
    NoPlacedNodes,

    #[error("semantic grouping needs at least one text note on the board")]
    NoTextNodes,

    #[error("art-style grouping needs at least one image on the board")]
    NoImageNodes,

    #[error("a grouping run is already in progress")]
    Busy,

    #[error("cannot {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupingConfig {
    pub layout: LayoutConfig,
    /// Pause between computing groups and moving nodes on screen.
    pub reveal_delay: Duration,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            reveal_delay: Duration::from_millis(600),
        }
    }
}

/// Message for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The cycle was refused.
    Error,
    /// The service failed and offline labels were used.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub enum GroupingState {
    Idle,
    Requesting {
        snapshot: RequestSnapshot,
    },
    Success {
        mode: GroupType,
        classified: Classified,
    },
    Fallback {
        mode: GroupType,
        classified: Classified,
        reason: String,
    },
    LayingOut {
        mode: GroupType,
        classified: Classified,
    },
}

#[derive(Debug, Clone)]
pub enum GroupingEvent {
    Trigger(RequestSnapshot),
    Labeled(Classified),
    Failed(String),
    StartLayout,
    FinishLayout,
}

impl GroupingEvent {
    fn name(&self) -> &'static str {
        match self {
            GroupingEvent::Trigger(_) => "trigger",
            GroupingEvent::Labeled(_) => "accept labels",
            GroupingEvent::Failed(_) => "fall back",
            GroupingEvent::StartLayout => "start layout",
            GroupingEvent::FinishLayout => "finish layout",
        }
    }
}

impl GroupingState {
    pub fn name(&self) -> &'static str {
        match self {
            GroupingState::Idle => "idle",
            GroupingState::Requesting { .. } => "requesting",
            GroupingState::Success { .. } => "success",
            GroupingState::Fallback { .. } => "fallback",
            GroupingState::LayingOut { .. } => "laying out",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, GroupingState::Idle)
    }

    /// The transition function. Illegal pairs are errors and leave the
    /// caller's state untouched.
    pub fn next(&self, event: GroupingEvent) -> Result<GroupingState, GroupingError> {
        use GroupingEvent as E;
        use GroupingState as S;

        match (self, event) {
            (S::Idle, E::Trigger(snapshot)) => Ok(S::Requesting { snapshot }),
            (S::Requesting { .. }, E::Trigger(_)) => Err(GroupingError::Busy),
            (S::Success { .. } | S::Fallback { .. } | S::LayingOut { .. }, E::Trigger(_)) => {
                Err(GroupingError::Busy)
            }

            (S::Requesting { snapshot }, E::Labeled(classified)) => {
                if classified.partition.is_empty() {
                    Ok(fallback(snapshot, "the service returned no usable groups".into()))
                } else {
                    Ok(S::Success {
                        mode: snapshot.mode(),
                        classified,
                    })
                }
            }
            (S::Requesting { snapshot }, E::Failed(reason)) => Ok(fallback(snapshot, reason)),

            (S::Success { mode, classified } | S::Fallback { mode, classified, .. }, E::StartLayout) => {
                Ok(S::LayingOut {
                    mode: *mode,
                    classified: classified.clone(),
                })
            }
            (S::LayingOut { .. }, E::FinishLayout) => Ok(S::Idle),

            (state, event) => Err(GroupingError::InvalidTransition {
                state: state.name(),
                event: event.name(),
            }),
        }
    }
}

fn fallback(snapshot: &RequestSnapshot, reason: String) -> GroupingState {
    GroupingState::Fallback {
        mode: snapshot.mode(),
        classified: Classified::from_mock(snapshot),
        reason,
    }
}

/// Input requirements checked before a cycle may start.
pub fn check_preconditions(mode: GroupType, store: &NodeStore) -> Result<(), GroupingError> {
    if store.placed().next().is_none() {
        return Err(GroupingError::NoPlacedNodes);
    }
    let has = |kind: NodeKind| store.placed().any(|n| n.kind == kind);
    match mode {
        GroupType::Semantic if !has(NodeKind::Text) => Err(GroupingError::NoTextNodes),
        GroupType::ArtStyle if !has(NodeKind::Image) => Err(GroupingError::NoImageNodes),
        _ => Ok(()),
    }
}

/// Drives [`GroupingState`] and collects notices for the user.
pub struct GroupingCycle {
    state: GroupingState,
    config: GroupingConfig,
    notices: Vec<Notice>,
}

impl Default for GroupingCycle {
    fn default() -> Self {
        Self::new(GroupingConfig::default())
    }
}

impl GroupingCycle {
    pub fn new(config: GroupingConfig) -> Self {
        Self {
            state: GroupingState::Idle,
            config,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> &GroupingState {
        &self.state
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    /// Whether the grouping trigger should be enabled.
    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn apply(&mut self, event: GroupingEvent) -> Result<(), GroupingError> {
        let next = self.state.next(event)?;
        log::info!("grouping: {} -> {}", self.state.name(), next.name());
        if let GroupingState::Fallback { reason, mode, .. } = &next {
            log::warn!("grouping: {mode} classifier failed, using offline labels: {reason}");
            self.notices.push(Notice {
                kind: NoticeKind::Fallback,
                message: format!("The AI service is unavailable ({reason}); grouped with offline labels instead."),
            });
        }
        self.state = next;
        Ok(())
    }

    /// `Idle → Requesting`. Returns the snapshot to classify.
    ///
    /// Precondition failures leave the cycle idle and post an error notice.
    pub fn begin(&mut self, mode: GroupType, store: &NodeStore) -> Result<RequestSnapshot, GroupingError> {
        if !self.is_idle() {
            return Err(GroupingError::Busy);
        }
        if let Err(e) = check_preconditions(mode, store) {
            self.notices.push(Notice {
                kind: NoticeKind::Error,
                message: e.to_string(),
            });
            return Err(e);
        }
        let snapshot = RequestSnapshot::capture(mode, store);
        self.apply(GroupingEvent::Trigger(snapshot.clone()))?;
        Ok(snapshot)
    }

    /// `Requesting → Success | Fallback` from the classifier outcome.
    pub fn complete(&mut self, outcome: Result<Labels, ClassifierError>) -> Result<(), GroupingError> {
        let GroupingState::Requesting { snapshot } = &self.state else {
            return Err(GroupingError::InvalidTransition {
                state: self.state.name(),
                event: "accept labels",
            });
        };
        let event = match outcome {
            Ok(labels) => GroupingEvent::Labeled(resolve(snapshot, &labels)),
            Err(e) => GroupingEvent::Failed(e.to_string()),
        };
        self.apply(event)
    }

    /// `Success | Fallback → LayingOut`.
    pub fn start_layout(&mut self) -> Result<(), GroupingError> {
        self.apply(GroupingEvent::StartLayout)
    }

    /// `LayingOut → Idle`: write labels, move members, rebuild the board's groups.
    pub fn finish_layout<'b>(
        &mut self,
        board: &'b mut Board,
    ) -> Result<&'b [Group], GroupingError> {
        let GroupingState::LayingOut { mode, classified } = &self.state else {
            return Err(GroupingError::InvalidTransition {
                state: self.state.name(),
                event: "finish layout",
            });
        };
        let layout = lay_out(board, *mode, classified, &self.config.layout);
        board.groups = layout.groups;
        self.apply(GroupingEvent::FinishLayout)?;
        Ok(&board.groups)
    }

    /// Run a whole cycle against `classifier`.
    ///
    /// `pause` is awaited for the reveal delay between partitioning and
    /// repositioning; pass a no-op future to skip it.
    pub async fn run<C, P, F>(
        &mut self,
        board: &mut Board,
        mode: GroupType,
        classifier: &C,
        pause: P,
    ) -> Result<Vec<Group>, GroupingError>
    where
        C: Classifier + ?Sized,
        P: FnOnce(Duration) -> F,
        F: Future<Output = ()>,
    {
        let snapshot = self.begin(mode, &board.store)?;
        let outcome = match snapshot.request() {
            Some(_) => classifier.classify(&snapshot).await,
            None => Err(ClassifierError::EmptyInput(mode)),
        };
        self.complete(outcome)?;
        self.start_layout()?;
        pause(self.config.reveal_delay).await;
        Ok(self.finish_layout(board)?.to_vec())
    }
}

/// Annotate, prune stale members, and apply the layout to the board's store.
fn lay_out(
    board: &mut Board,
    mode: GroupType,
    classified: &Classified,
    config: &LayoutConfig,
) -> GroupLayout {
    classified.annotate(&mut board.store);
    let partition = classified.partition.retain_placed(&board.store);
    let layout = layout_partition(&partition, mode, config);
    apply_layout(&mut board.store, &layout);
    layout
}
