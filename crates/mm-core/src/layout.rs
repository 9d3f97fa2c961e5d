//! Group layout engine.
//!
//! Turns a [`Partition`] into a grid of group anchors (row-major, a fixed
//! number of groups per row) and packs each group's members into a
//! near-square grid below its anchor. Pure: the same partition and config
//! always produce the same coordinates.

use crate::id::NodeId;
use crate::model::{Color, Group, GroupType, Point, Size};
use crate::partition::Partition;
use crate::store::NodeStore;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Anchor grid, member cell pitch and group palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Anchor of the first group.
    pub origin: Point,
    /// Distance between neighbouring group anchors.
    pub group_pitch: Size,
    pub groups_per_row: usize,
    /// Distance between neighbouring members inside a group.
    pub cell_pitch: Size,
    /// Cycled by group index.
    pub palette: Vec<Color>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin: Point::new(100.0, 100.0),
            group_pitch: Size::new(300.0, 250.0),
            groups_per_row: 3,
            cell_pitch: Size::new(140.0, 120.0),
            palette: vec![
                Color::rgb(0xFF, 0x6B, 0x6B),
                Color::rgb(0x4E, 0xCD, 0xC4),
                Color::rgb(0x45, 0xB7, 0xD1),
                Color::rgb(0x96, 0xCE, 0xB4),
                Color::rgb(0xFF, 0xEA, 0xA7),
                Color::rgb(0xDD, 0xA0, 0xDD),
            ],
        }
    }
}

impl LayoutConfig {
    pub fn anchor(&self, index: usize) -> Point {
        let per_row = self.groups_per_row.max(1);
        let col = (index % per_row) as f32;
        let row = (index / per_row) as f32;
        Point::new(
            self.origin.x + col * self.group_pitch.width,
            self.origin.y + row * self.group_pitch.height,
        )
    }

    pub fn color(&self, index: usize) -> Color {
        match self.palette.len() {
            0 => Color::rgb(0x99, 0x99, 0x99),
            n => self.palette[index % n],
        }
    }
}

/// Columns for a group of `n` members: `ceil(sqrt(n))`.
pub fn grid_columns(n: usize) -> usize {
    (n as f64).sqrt().ceil() as usize
}

/// `(row, col)` of the `j`-th member in a grid with `cols` columns.
pub fn grid_cell(j: usize, cols: usize) -> (usize, usize) {
    (j / cols, j % cols)
}

/// Result of laying out a partition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupLayout {
    pub groups: Vec<Group>,
    /// Target position per member, in group then member order.
    pub positions: Vec<(NodeId, Point)>,
}

impl GroupLayout {
    pub fn position_of(&self, id: NodeId) -> Option<Point> {
        self.positions.iter().find(|(n, _)| *n == id).map(|(_, p)| *p)
    }
}

/// Compute anchors, colors and member positions for every label.
pub fn layout_partition(
    partition: &Partition,
    group_type: GroupType,
    config: &LayoutConfig,
) -> GroupLayout {
    let mut layout = GroupLayout::default();

    for (i, (label, members)) in partition.iter().enumerate() {
        let anchor = config.anchor(i);
        let cols = grid_columns(members.len()).max(1);

        for (j, id) in members.iter().enumerate() {
            let (row, col) = grid_cell(j, cols);
            let pos = Point::new(
                anchor.x + col as f32 * config.cell_pitch.width,
                anchor.y + row as f32 * config.cell_pitch.height,
            );
            layout.positions.push((*id, pos));
        }

        layout.groups.push(Group {
            id: format!("{}-{i}", group_type.as_str()),
            label: label.to_string(),
            group_type,
            member_ids: SmallVec::from_slice(members),
            anchor,
            color: config.color(i),
        });
    }

    layout
}

/// Move members to their computed positions and tag them with their group.
///
/// Tags from earlier runs are cleared first; nodes outside every group
/// keep their position.
pub fn apply_layout(store: &mut NodeStore, layout: &GroupLayout) {
    store.clear_groups();
    for group in &layout.groups {
        for &id in &group.member_ids {
            if let Some(node) = store.get_mut(id) {
                node.group_id = Some(group.id.clone());
                node.group_label = Some(group.label.clone());
                node.group_type = Some(group.group_type);
            }
        }
    }
    for &(id, pos) in &layout.positions {
        if let Some(node) = store.get_mut(id) {
            node.x = pos.x;
            node.y = pos.y;
        }
    }
    log::debug!(
        "layout: {} group(s), {} node(s) repositioned",
        layout.groups.len(),
        layout.positions.len()
    );
}
