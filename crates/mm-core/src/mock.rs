//! Offline classifier used when the placement service is unreachable.
//!
//! Labels are picked from the same vocabularies the service uses, keyed
//! by a 32-bit rolling hash of the node content, so a given string always
//! lands in the same group.

use crate::model::{GroupType, NodeKind};

pub const ART_STYLES: &[&str] = &[
    "impressionism",
    "abstract",
    "realistic",
    "minimalist",
    "surreal",
    "vintage",
    "modern",
    "classical",
    "pop art",
    "cubism",
    "expressionism",
    "renaissance",
    "baroque",
    "contemporary",
];

pub const MOODS: &[&str] = &[
    "happy",
    "sad",
    "energetic",
    "calm",
    "mysterious",
    "romantic",
    "aggressive",
    "peaceful",
];

pub const THEMES: &[&str] = &[
    "nature",
    "urban",
    "technology",
    "art",
    "food",
    "travel",
    "fashion",
    "sports",
    "business",
    "education",
];

/// Substring keywords per semantic topic, in topic order.
pub const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("nature", &["tree", "forest", "mountain", "river", "flower", "ocean", "garden", "sky"]),
    ("urban", &["city", "street", "building", "downtown", "traffic", "subway"]),
    ("technology", &["code", "software", "computer", "robot", "cyber", "app", "data"]),
    ("art", &["paint", "canvas", "sketch", "gallery", "drawing", "sculpture"]),
    ("food", &["recipe", "cook", "coffee", "pizza", "dinner", "bread", "fruit"]),
    ("travel", &["trip", "flight", "hotel", "beach", "vacation", "passport"]),
    ("fashion", &["dress", "outfit", "shoe", "style", "wear"]),
    ("sports", &["game", "team", "ball", "run", "match", "gym"]),
    ("business", &["meeting", "market", "sales", "budget", "client", "startup"]),
    ("education", &["learn", "study", "school", "class", "book", "lecture"]),
];

pub const DEFAULT_STYLE: &str = "unknown-style";
pub const DEFAULT_MOOD: &str = "neutral";
pub const DEFAULT_TOPIC: &str = "general";

/// Rolling hash `h = h * 31 + c` over UTF-16 code units, wrapping at i32.
pub fn content_hash(content: &str) -> i32 {
    content
        .encode_utf16()
        .fold(0i32, |h, c| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(c as i32))
}

fn pick<'a>(content: &str, vocab: &[&'a str]) -> &'a str {
    let idx = content_hash(content).unsigned_abs() as usize % vocab.len();
    vocab[idx]
}

pub fn art_style(content: &str) -> &'static str {
    if content.trim().is_empty() {
        return DEFAULT_STYLE;
    }
    pick(content, ART_STYLES)
}

pub fn mood(content: &str) -> &'static str {
    if content.trim().is_empty() {
        return DEFAULT_MOOD;
    }
    pick(content, MOODS)
}

/// Topics whose keywords occur in `content` (case-insensitive), in table order.
pub fn matched_topics(content: &str) -> Vec<&'static str> {
    let lower = content.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .filter(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(topic, _)| *topic)
        .collect()
}

pub fn topic(content: &str) -> &'static str {
    let topics = matched_topics(content);
    if topics.is_empty() {
        DEFAULT_TOPIC
    } else {
        pick(content, &topics)
    }
}

/// Label for `content` under the given grouping mode.
pub fn label_for(mode: GroupType, content: &str) -> &'static str {
    match mode {
        GroupType::ArtStyle => art_style(content),
        GroupType::MoodTheme => mood(content),
        GroupType::Semantic => topic(content),
    }
}

/// Whether a node takes part in a grouping run of this mode.
pub fn accepts(mode: GroupType, kind: NodeKind) -> bool {
    match mode {
        GroupType::ArtStyle => kind == NodeKind::Image,
        GroupType::MoodTheme | GroupType::Semantic => true,
    }
}
