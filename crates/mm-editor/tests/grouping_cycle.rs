//! Integration tests: full grouping cycles against scripted classifiers.
//!
//! Covers the success path, every fallback trigger, precondition refusals,
//! and edits racing an in-flight request.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mm_classifier::{
    Classifier, ClassifierConfig, ClassifierError, HttpClassifier, MoodLabel, StyleLabel,
    TextMatches,
};
use mm_core::{Board, GroupType, NodeId, NodeKind, Point, Size};
use mm_editor::{GroupingConfig, GroupingCycle, GroupingError, NoticeKind};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn no_pause(_: Duration) -> std::future::Ready<()> {
    std::future::ready(())
}

/// Scripted classifier: answers from fixed tables, or fails every call.
#[derive(Default)]
struct Scripted {
    calls: AtomicUsize,
    fail: bool,
    threshold: Vec<TextMatches>,
    styles: Vec<StyleLabel>,
    moods: Vec<MoodLabel>,
}

impl Scripted {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer<T: Clone>(&self, value: &[T]) -> Result<Vec<T>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(ClassifierError::Unavailable("simulated network error".into()))
        } else {
            Ok(value.to_vec())
        }
    }
}

#[async_trait]
impl Classifier for Scripted {
    async fn group_by_threshold(
        &self,
        _texts: Vec<String>,
        _images: Vec<String>,
    ) -> Result<Vec<TextMatches>, ClassifierError> {
        self.answer(&self.threshold)
    }

    async fn classify_art_style(
        &self,
        _images: Vec<String>,
    ) -> Result<Vec<StyleLabel>, ClassifierError> {
        self.answer(&self.styles)
    }

    async fn classify_mood_theme(
        &self,
        _texts: Vec<String>,
        _images: Vec<String>,
    ) -> Result<Vec<MoodLabel>, ClassifierError> {
        self.answer(&self.moods)
    }
}

fn board_with(contents: &[(NodeKind, &str)]) -> (Board, Vec<NodeId>) {
    let mut board = Board::new("cycle");
    let mut ids = Vec::new();
    for (i, (kind, content)) in contents.iter().enumerate() {
        let id = board.store.add_node(*kind, *content, Size::default());
        board.store.place_node(id, 900.0 + 10.0 * i as f32, 900.0);
        ids.push(id);
    }
    (board, ids)
}

fn cycle() -> GroupingCycle {
    GroupingCycle::new(GroupingConfig {
        reveal_delay: Duration::ZERO,
        ..GroupingConfig::default()
    })
}

fn mood(content: &str, mood: &str) -> MoodLabel {
    MoodLabel {
        content: content.into(),
        mood: mood.into(),
        theme: None,
        confidence: None,
    }
}

// ─── Success ────────────────────────────────────────────────────────────

#[tokio::test]
async fn mood_success_groups_by_label() {
    init_logging();
    let (mut board, ids) = board_with(&[
        (NodeKind::Text, "beach party"),
        (NodeKind::Text, "rainy monday"),
        (NodeKind::Image, "confetti.png"),
    ]);
    let classifier = Scripted {
        moods: vec![
            mood("beach party", "happy"),
            mood("rainy monday", "sad"),
            mood("confetti.png", "happy"),
        ],
        ..Scripted::default()
    };
    let mut cycle = cycle();
    let groups = cycle
        .run(&mut board, GroupType::MoodTheme, &classifier, no_pause)
        .await
        .unwrap();

    assert_eq!(classifier.calls(), 1);
    assert!(cycle.is_idle());
    assert!(cycle.notices().is_empty());
    assert_eq!(
        groups.iter().map(|g| g.label.as_str()).collect::<Vec<_>>(),
        vec!["happy", "sad"]
    );
    assert_eq!(groups[0].member_ids.as_slice(), &[ids[0], ids[2]]);
    assert_eq!(groups[1].anchor, Point::new(400.0, 100.0));
    assert_eq!(board.groups, groups);

    let confetti = board.store.get(ids[2]).unwrap();
    assert_eq!(confetti.position(), Point::new(240.0, 100.0));
    assert_eq!(confetti.group_label.as_deref(), Some("happy"));
    assert_eq!(
        confetti.classification.as_ref().and_then(|c| c.mood.as_deref()),
        Some("happy")
    );
}

#[tokio::test]
async fn semantic_success_uses_threshold_matches() {
    let (mut board, ids) = board_with(&[
        (NodeKind::Text, "ocean"),
        (NodeKind::Image, "wave.jpg"),
        (NodeKind::Image, "desk.jpg"),
    ]);
    let classifier = Scripted {
        threshold: vec![TextMatches {
            text: "ocean".into(),
            matches: vec!["wave.jpg".into()],
        }],
        ..Scripted::default()
    };
    let mut cycle = cycle();
    let groups = cycle
        .run(&mut board, GroupType::Semantic, &classifier, no_pause)
        .await
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, "semantic-0");
    assert_eq!(groups[0].member_ids.as_slice(), &[ids[0], ids[1]]);
    // The unmatched image keeps its place.
    assert_eq!(board.store.get(ids[2]).unwrap().position(), Point::new(920.0, 900.0));

    let topics = |id| {
        board
            .store
            .get(id)
            .and_then(|n| n.classification.as_ref())
            .map(|c| c.topics.to_vec())
    };
    assert_eq!(topics(ids[0]), Some(vec!["ocean".to_string()]));
    assert_eq!(topics(ids[1]), Some(vec!["ocean".to_string()]));
    assert_eq!(topics(ids[2]), None);
}

#[tokio::test]
async fn runs_against_a_trait_object() {
    let (mut board, ids) = board_with(&[(NodeKind::Image, "dyn.png")]);
    let scripted = Scripted {
        styles: vec![StyleLabel {
            image: "dyn.png".into(),
            style: "cubism".into(),
            confidence: Some(0.9),
        }],
        ..Scripted::default()
    };
    let classifier: &dyn Classifier = &scripted;
    let groups = cycle()
        .run(&mut board, GroupType::ArtStyle, classifier, no_pause)
        .await
        .unwrap();

    assert_eq!(scripted.calls(), 1);
    assert_eq!(groups[0].label, "cubism");
    assert_eq!(groups[0].member_ids.as_slice(), &[ids[0]]);
}

// ─── Fallback ───────────────────────────────────────────────────────────

#[tokio::test]
async fn network_error_falls_back_and_notifies_once() {
    let (mut board, _) = board_with(&[(NodeKind::Text, "quiet morning")]);
    let classifier = Scripted::failing();
    let mut cycle = cycle();
    let groups = cycle
        .run(&mut board, GroupType::MoodTheme, &classifier, no_pause)
        .await
        .unwrap();

    assert_eq!(classifier.calls(), 1);
    assert!(!groups.is_empty());
    let fallbacks = cycle
        .notices()
        .iter()
        .filter(|n| n.kind == NoticeKind::Fallback)
        .count();
    assert_eq!(fallbacks, 1);
    assert_eq!(cycle.notices().len(), 1);
    assert!(cycle.is_idle());
}

#[tokio::test]
async fn fallback_labels_are_reproducible() {
    let contents = [
        (NodeKind::Image, "a.png"),
        (NodeKind::Image, "b.png"),
        (NodeKind::Image, "c.png"),
    ];
    let (mut first, _) = board_with(&contents);
    let (mut second, _) = board_with(&contents);
    let classifier = Scripted::failing();

    let a = cycle()
        .run(&mut first, GroupType::ArtStyle, &classifier, no_pause)
        .await
        .unwrap();
    let b = cycle()
        .run(&mut second, GroupType::ArtStyle, &classifier, no_pause)
        .await
        .unwrap();
    let labels = |groups: &[mm_core::Group]| groups.iter().map(|g| g.label.clone()).collect::<Vec<_>>();
    assert_eq!(labels(&a), labels(&b));
}

#[tokio::test]
async fn blank_texts_skip_the_request() {
    let (mut board, _) = board_with(&[(NodeKind::Text, "   ")]);
    let classifier = Scripted::default();
    let mut cycle = cycle();
    let groups = cycle
        .run(&mut board, GroupType::Semantic, &classifier, no_pause)
        .await
        .unwrap();

    assert_eq!(classifier.calls(), 0, "no usable input, nothing sent");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label, "general");
    assert_eq!(cycle.notices()[0].kind, NoticeKind::Fallback);
}

#[tokio::test]
async fn unreachable_service_falls_back() {
    let (mut board, _) = board_with(&[(NodeKind::Image, "https://example.com/a.jpg")]);
    let classifier = HttpClassifier::new(ClassifierConfig {
        base_url: "http://127.0.0.1:9".into(),
        timeout_secs: 2,
    })
    .unwrap();
    let mut cycle = cycle();
    let groups = cycle
        .run(&mut board, GroupType::ArtStyle, &classifier, no_pause)
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(cycle.notices().len(), 1);
}

// ─── Preconditions ──────────────────────────────────────────────────────

#[tokio::test]
async fn empty_board_sends_nothing() {
    let mut board = Board::new("empty");
    board.store.add_node(NodeKind::Text, "staged only", Size::default());
    let classifier = Scripted::default();
    let mut cycle = cycle();
    let err = cycle
        .run(&mut board, GroupType::MoodTheme, &classifier, no_pause)
        .await
        .unwrap_err();

    assert_eq!(err, GroupingError::NoPlacedNodes);
    assert_eq!(classifier.calls(), 0);
    assert!(cycle.is_idle());
    assert_eq!(cycle.notices().len(), 1);
    assert_eq!(cycle.notices()[0].kind, NoticeKind::Error);
}

#[tokio::test]
async fn art_style_without_images_is_refused() {
    let (mut board, _) = board_with(&[(NodeKind::Text, "words only")]);
    let classifier = Scripted::default();
    let err = cycle()
        .run(&mut board, GroupType::ArtStyle, &classifier, no_pause)
        .await
        .unwrap_err();
    assert_eq!(err, GroupingError::NoImageNodes);
    assert_eq!(classifier.calls(), 0);
}

// ─── Races ──────────────────────────────────────────────────────────────

#[test]
fn edits_during_request_drop_only_stale_members() {
    let (mut board, ids) = board_with(&[
        (NodeKind::Image, "keep.png"),
        (NodeKind::Image, "gone.png"),
    ]);
    let mut cycle = cycle();
    cycle.begin(GroupType::ArtStyle, &board.store).unwrap();

    // The board stays editable while the request is out.
    board.store.delete_node(ids[1]);
    let late = board.store.add_node(NodeKind::Image, "late.png", Size::default());
    board.store.place_node(late, 5.0, 5.0);

    cycle
        .complete(Ok(mm_classifier::Labels::Style(vec![
            StyleLabel {
                image: "gone.png".into(),
                style: "baroque".into(),
                confidence: None,
            },
            StyleLabel {
                image: "keep.png".into(),
                style: "modern".into(),
                confidence: None,
            },
        ])))
        .unwrap();
    cycle.start_layout().unwrap();
    let groups = cycle.finish_layout(&mut board).unwrap().to_vec();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label, "modern");
    assert_eq!(groups[0].anchor, Point::new(100.0, 100.0));
    assert_eq!(board.store.get(late).unwrap().position(), Point::new(5.0, 5.0));
    assert!(cycle.notices().is_empty());
}

#[test]
fn trigger_is_disabled_until_cycle_finishes() {
    let (board, _) = board_with(&[(NodeKind::Text, "note")]);
    let mut cycle = cycle();
    cycle.begin(GroupType::MoodTheme, &board.store).unwrap();
    assert!(!cycle.is_idle());
    cycle
        .complete(Err(ClassifierError::Status(503)))
        .unwrap();
    assert_eq!(cycle.state().name(), "fallback");
    assert_eq!(
        cycle.begin(GroupType::MoodTheme, &board.store).unwrap_err(),
        GroupingError::Busy
    );
    cycle.start_layout().unwrap();
    assert_eq!(cycle.state().name(), "laying out");
    assert_eq!(
        cycle.begin(GroupType::MoodTheme, &board.store).unwrap_err(),
        GroupingError::Busy
    );
}
