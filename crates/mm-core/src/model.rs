//! Core data model for MindMesh boards.
//!
//! A board owns an ordered list of nodes (text notes and images) and the
//! groups computed by the last grouping cycle. Nodes with both coordinates
//! negative are *staged*: they live in the staging list and are never drawn
//! on the canvas until an explicit placement moves them.

use crate::id::NodeId;
use crate::store::NodeStore;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color, 4 × u8. Serialized as a `#RRGGBB` / `#RRGGBBAA` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let pair = |i: usize| Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?);

        match bytes.len() {
            3 => Some(Self::rgb(
                hex_val(bytes[0])? * 17,
                hex_val(bytes[1])? * 17,
                hex_val(bytes[2])? * 17,
            )),
            6 => Some(Self::rgb(pair(0)?, pair(2)?, pair(4)?)),
            8 => Some(Self {
                r: pair(0)?,
                g: pair(2)?,
                b: pair(4)?,
                a: pair(6)?,
            }),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::from_hex(&s).ok_or_else(|| format!("invalid hex color: {s}"))
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(200.0, 100.0)
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Text,
    Image,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Text => "text",
            NodeKind::Image => "image",
        }
    }
}

/// Which classifier operation produced a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupType {
    ArtStyle,
    MoodTheme,
    Semantic,
}

impl GroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::ArtStyle => "art-style",
            GroupType::MoodTheme => "mood-theme",
            GroupType::Semantic => "semantic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "art-style" => Some(GroupType::ArtStyle),
            "mood-theme" => Some(GroupType::MoodTheme),
            "semantic" => Some(GroupType::Semantic),
            _ => None,
        }
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels a classifier attached to a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub topics: SmallVec<[String; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// A single placeable note or image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Raw text, or an image reference (URL / data URL).
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_type: Option<GroupType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
}

impl Node {
    /// Position given to freshly added nodes.
    pub const STAGED: Point = Point::new(-1000.0, -1000.0);

    pub fn new(id: NodeId, kind: NodeKind, content: impl Into<String>, size: Size) -> Self {
        Self {
            id,
            kind,
            x: Self::STAGED.x,
            y: Self::STAGED.y,
            width: size.width,
            height: size.height,
            content: content.into(),
            group_id: None,
            group_label: None,
            group_type: None,
            classification: None,
        }
    }

    /// A node is on the canvas unless both coordinates are negative.
    pub fn is_placed(&self) -> bool {
        !(self.x < 0.0 && self.y < 0.0)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn clear_group(&mut self) {
        self.group_id = None;
        self.group_label = None;
        self.group_type = None;
    }

    pub fn classification_mut(&mut self) -> &mut Classification {
        self.classification.get_or_insert_with(Classification::default)
    }
}

// ─── Groups ──────────────────────────────────────────────────────────────

/// A cluster of placed nodes sharing a classifier label.
///
/// Derived state: rebuilt on every grouping cycle and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub group_type: GroupType,
    pub member_ids: SmallVec<[NodeId; 8]>,
    pub anchor: Point,
    pub color: Color,
}

// ─── Board ───────────────────────────────────────────────────────────────

/// The root of ownership: nodes and the last computed groups.
#[derive(Debug, Clone)]
pub struct Board {
    pub id: String,
    pub name: String,
    pub theme_name: String,
    pub store: NodeStore,
    pub groups: Vec<Group>,
}

impl Board {
    pub const DEFAULT_NAME: &'static str = "Untitled board";
    pub const DEFAULT_THEME: &'static str = "light";

    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Self::DEFAULT_NAME.to_string(),
            theme_name: Self::DEFAULT_THEME.to_string(),
            store: NodeStore::new(),
            groups: Vec::new(),
        }
    }
}
