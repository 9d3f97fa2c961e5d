//! Pairing classifier results back to board nodes.
//!
//! The service only sees content strings. A [`RequestSnapshot`] taken when
//! the request is built remembers which ids carried which content, so
//! results map back by id. Every node sharing a content string receives
//! the label, and nodes deleted while the request was in flight are
//! pruned later against the live store.

use crate::wire::{ClassifyRequest, MoodLabel, StyleLabel, TextMatches};
use mm_core::mock;
use mm_core::{Classification, GroupType, NodeId, NodeKind, NodeStore, Partition};
use smallvec::smallvec;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Entry {
    id: NodeId,
    kind: NodeKind,
    content: String,
}

/// The nodes a grouping request was built from.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    mode: GroupType,
    entries: Vec<Entry>,
}

impl RequestSnapshot {
    /// Capture the placed nodes that take part in `mode`.
    pub fn capture(mode: GroupType, store: &NodeStore) -> Self {
        let entries = store
            .placed()
            .filter(|n| mock::accepts(mode, n.kind))
            .map(|n| Entry {
                id: n.id,
                kind: n.kind,
                content: n.content.clone(),
            })
            .collect();
        Self { mode, entries }
    }

    pub fn mode(&self) -> GroupType {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn contents(&self, kind: NodeKind) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for e in self.entries.iter().filter(|e| e.kind == kind) {
            if !e.content.trim().is_empty() && !out.contains(&e.content) {
                out.push(e.content.clone());
            }
        }
        out
    }

    /// Unique non-blank text contents, in store order.
    pub fn texts(&self) -> Vec<String> {
        self.contents(NodeKind::Text)
    }

    /// Unique non-blank image references, in store order.
    pub fn images(&self) -> Vec<String> {
        self.contents(NodeKind::Image)
    }

    /// Body to send, or `None` when the service has nothing to work on
    /// for this mode (it skips blank entries).
    pub fn request(&self) -> Option<ClassifyRequest> {
        let texts = self.texts();
        let images = self.images();
        let usable = match self.mode {
            GroupType::Semantic => !texts.is_empty(),
            GroupType::ArtStyle => !images.is_empty(),
            GroupType::MoodTheme => !texts.is_empty() || !images.is_empty(),
        };
        if !usable {
            return None;
        }
        Some(match self.mode {
            GroupType::ArtStyle => ClassifyRequest {
                texts: Vec::new(),
                images,
            },
            _ => ClassifyRequest { texts, images },
        })
    }

    fn ids_for<'a>(&'a self, kind: NodeKind, content: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.kind == kind && e.content == content)
            .map(|e| e.id)
    }

    fn ids_for_any<'a>(&'a self, content: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.content == content)
            .map(|e| e.id)
    }
}

/// Results of one classifier call, per operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Labels {
    Threshold(Vec<TextMatches>),
    Style(Vec<StyleLabel>),
    Mood(Vec<MoodLabel>),
}

/// A partition plus the per-node classification to write back.
#[derive(Debug, Clone, Default)]
pub struct Classified {
    pub partition: Partition,
    pub annotations: HashMap<NodeId, Classification>,
}

impl Classified {
    /// Offline labels for the snapshot's nodes.
    pub fn from_mock(snapshot: &RequestSnapshot) -> Self {
        let mut out = Self::default();
        for e in &snapshot.entries {
            let label = mock::label_for(snapshot.mode, &e.content);
            out.partition.push(label, e.id);
            let c = out.annotations.entry(e.id).or_default();
            match snapshot.mode {
                GroupType::ArtStyle => c.style = Some(label.to_string()),
                GroupType::MoodTheme => c.mood = Some(label.to_string()),
                GroupType::Semantic => c.topics = smallvec![label.to_string()],
            }
        }
        out
    }

    fn claim_topic(&mut self, label: &str, id: NodeId) {
        if self.partition.push(label, id) {
            self.annotations.entry(id).or_default().topics = smallvec![label.trim().to_string()];
        }
    }

    /// Write classifications onto the nodes still in the store.
    pub fn annotate(&self, store: &mut NodeStore) {
        for (id, classification) in &self.annotations {
            if let Some(node) = store.get_mut(*id) {
                let target = node.classification_mut();
                if classification.style.is_some() {
                    target.style = classification.style.clone();
                }
                if classification.mood.is_some() {
                    target.mood = classification.mood.clone();
                }
                if !classification.topics.is_empty() {
                    target.topics = classification.topics.clone();
                }
                if classification.confidence.is_some() {
                    target.confidence = classification.confidence;
                }
            }
        }
    }
}

/// Map service results onto the snapshot's ids. Unmatched entries are skipped.
pub fn resolve(snapshot: &RequestSnapshot, labels: &Labels) -> Classified {
    let mut out = Classified::default();
    match labels {
        Labels::Threshold(groups) => {
            for group in groups {
                // Keyed by the exact text so near-duplicates stay apart.
                let label = group.text.as_str();
                let texts = snapshot.ids_for(NodeKind::Text, label);
                let images = group
                    .matches
                    .iter()
                    .flat_map(|image| snapshot.ids_for(NodeKind::Image, image));
                for id in texts {
                    out.claim_topic(label, id);
                }
                if out.partition.members(label).is_none() {
                    log::debug!("threshold: no node for text {label:?}");
                    continue;
                }
                for id in images {
                    out.claim_topic(label, id);
                }
            }
        }
        Labels::Style(styles) => {
            for s in styles {
                for id in snapshot.ids_for(NodeKind::Image, &s.image) {
                    if out.partition.push(&s.style, id) {
                        let c = out.annotations.entry(id).or_default();
                        c.style = Some(s.style.clone());
                        c.confidence = s.confidence;
                    }
                }
            }
        }
        Labels::Mood(moods) => {
            for m in moods {
                for id in snapshot.ids_for_any(&m.content) {
                    if out.partition.push(&m.mood, id) {
                        let c = out.annotations.entry(id).or_default();
                        c.mood = Some(m.mood.clone());
                        c.topics = m.theme.iter().cloned().collect();
                        c.confidence = m.confidence;
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_core::Size;
    use pretty_assertions::assert_eq;

    fn board(contents: &[(NodeKind, &str)]) -> (NodeStore, Vec<NodeId>) {
        let mut store = NodeStore::new();
        let ids = contents
            .iter()
            .map(|(kind, content)| {
                let id = store.add_node(*kind, *content, Size::default());
                store.place_node(id, 0.0, 0.0);
                id
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn snapshot_skips_staged_and_ineligible() {
        let (mut store, _) = board(&[(NodeKind::Text, "note"), (NodeKind::Image, "a.png")]);
        store.add_node(NodeKind::Image, "staged.png", Size::default());
        let art = RequestSnapshot::capture(GroupType::ArtStyle, &store);
        assert_eq!(art.len(), 1);
        assert_eq!(
            art.request(),
            Some(ClassifyRequest {
                texts: vec![],
                images: vec!["a.png".into()],
            })
        );
    }

    #[test]
    fn semantic_without_usable_text_has_no_request() {
        let (store, _) = board(&[(NodeKind::Text, "   "), (NodeKind::Image, "a.png")]);
        let snap = RequestSnapshot::capture(GroupType::Semantic, &store);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.request(), None);
    }

    #[test]
    fn duplicate_contents_are_sent_once() {
        let (store, _) = board(&[(NodeKind::Text, "same"), (NodeKind::Text, "same")]);
        let snap = RequestSnapshot::capture(GroupType::MoodTheme, &store);
        assert_eq!(snap.texts(), vec!["same".to_string()]);
    }

    #[test]
    fn threshold_groups_text_with_matches() {
        let (store, ids) = board(&[
            (NodeKind::Text, "sunset"),
            (NodeKind::Image, "beach.png"),
            (NodeKind::Image, "city.png"),
            (NodeKind::Text, "skyline"),
        ]);
        let snap = RequestSnapshot::capture(GroupType::Semantic, &store);
        let labels = Labels::Threshold(vec![
            TextMatches {
                text: "sunset".into(),
                matches: vec!["beach.png".into(), "missing.png".into()],
            },
            TextMatches {
                text: "skyline".into(),
                matches: vec!["city.png".into(), "beach.png".into()],
            },
            TextMatches {
                text: "not on board".into(),
                matches: vec!["city.png".into()],
            },
        ]);
        let result = resolve(&snap, &labels);
        assert_eq!(result.partition.members("sunset"), Some(&[ids[0], ids[1]][..]));
        // beach.png was claimed by the first group.
        assert_eq!(result.partition.members("skyline"), Some(&[ids[3], ids[2]][..]));
        assert_eq!(result.partition.len(), 2);

        // Each member carries its group's text as a topic.
        assert_eq!(result.annotations.len(), 4);
        assert_eq!(result.annotations[&ids[1]].topics.as_slice(), &["sunset".to_string()]);
        assert_eq!(result.annotations[&ids[2]].topics.as_slice(), &["skyline".to_string()]);
    }

    #[test]
    fn texts_differing_in_whitespace_stay_apart() {
        let (store, ids) = board(&[(NodeKind::Text, "sunset"), (NodeKind::Text, "sunset ")]);
        let snap = RequestSnapshot::capture(GroupType::Semantic, &store);
        let labels = Labels::Threshold(vec![
            TextMatches {
                text: "sunset".into(),
                matches: vec![],
            },
            TextMatches {
                text: "sunset ".into(),
                matches: vec![],
            },
        ]);
        let result = resolve(&snap, &labels);
        assert_eq!(result.partition.len(), 2);
        assert_eq!(result.partition.members("sunset"), Some(&[ids[0]][..]));
        assert_eq!(result.partition.members("sunset "), Some(&[ids[1]][..]));
    }

    #[test]
    fn same_content_nodes_share_a_label() {
        let (store, ids) = board(&[(NodeKind::Image, "dup.png"), (NodeKind::Image, "dup.png")]);
        let snap = RequestSnapshot::capture(GroupType::ArtStyle, &store);
        let result = resolve(
            &snap,
            &Labels::Style(vec![StyleLabel {
                image: "dup.png".into(),
                style: "cubism".into(),
                confidence: Some(0.4),
            }]),
        );
        assert_eq!(result.partition.members("cubism"), Some(&[ids[0], ids[1]][..]));
        assert_eq!(result.annotations[&ids[1]].style.as_deref(), Some("cubism"));
    }

    #[test]
    fn mood_results_record_theme_as_topic() {
        let (mut store, ids) = board(&[(NodeKind::Text, "rainy day"), (NodeKind::Image, "storm.jpg")]);
        let snap = RequestSnapshot::capture(GroupType::MoodTheme, &store);
        let result = resolve(
            &snap,
            &Labels::Mood(vec![MoodLabel {
                content: "storm.jpg".into(),
                mood: "mysterious".into(),
                theme: Some("nature".into()),
                confidence: None,
            }]),
        );
        assert_eq!(result.partition.member_count(), 1);
        result.annotate(&mut store);
        let c = store.get(ids[1]).unwrap().classification.clone().unwrap();
        assert_eq!(c.mood.as_deref(), Some("mysterious"));
        assert_eq!(c.topics.as_slice(), &["nature".to_string()]);
        assert!(store.get(ids[0]).unwrap().classification.is_none());
    }

    #[test]
    fn mock_labels_every_snapshot_entry() {
        let (store, ids) = board(&[(NodeKind::Text, "forest trail"), (NodeKind::Image, "a.png")]);
        let snap = RequestSnapshot::capture(GroupType::Semantic, &store);
        let result = Classified::from_mock(&snap);
        assert_eq!(result.partition.member_count(), 2);
        assert_eq!(result.partition.label_of(ids[0]), Some("nature"));
        assert_eq!(
            result.annotations[&ids[0]].topics.as_slice(),
            &["nature".to_string()]
        );
    }
}
