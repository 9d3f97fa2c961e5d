//! Ordered node list with z-order semantics.
//!
//! List position is render order: the last node is drawn on top. Any node
//! that is placed, moved or selected is moved to the end.

use crate::id::NodeId;
use crate::model::{Node, NodeKind, Size};

#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
    selected: Option<NodeId>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted nodes, keeping their order.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            selected: None,
        }
    }

    /// Append a staged node and return its id.
    pub fn add_node(&mut self, kind: NodeKind, content: impl Into<String>, size: Size) -> NodeId {
        let id = self.fresh_id(kind);
        self.nodes.push(Node::new(id, kind, content, size));
        log::debug!("add {} node {id}", kind.as_str());
        id
    }

    /// Put a node on the canvas at `(x, y)` and raise it to the top.
    /// Unknown ids are ignored. Returns whether a node was moved.
    pub fn place_node(&mut self, id: NodeId, x: f32, y: f32) -> bool {
        let Some(pos) = self.position_of(id) else {
            log::debug!("place: unknown node {id}");
            return false;
        };
        let mut node = self.nodes.remove(pos);
        node.x = x;
        node.y = y;
        self.nodes.push(node);
        true
    }

    /// Drag-end on a node that is already on the canvas.
    pub fn move_node(&mut self, id: NodeId, x: f32, y: f32) -> bool {
        self.place_node(id, x, y)
    }

    /// Look a node up, mark it selected and raise it to the top.
    pub fn select_node(&mut self, id: NodeId) -> Option<&Node> {
        let pos = self.position_of(id)?;
        let node = self.nodes.remove(pos);
        self.nodes.push(node);
        self.selected = Some(id);
        self.nodes.last()
    }

    /// Remove a node; clears the selection if it pointed at it.
    pub fn delete_node(&mut self, id: NodeId) -> Option<Node> {
        let pos = self.position_of(id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        log::debug!("delete node {id}");
        Some(self.nodes.remove(pos))
    }

    pub fn selected(&self) -> Option<&Node> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.position_of(id).is_some()
    }

    /// All nodes in render order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Nodes drawn on the canvas.
    pub fn placed(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_placed())
    }

    /// Nodes waiting in the staging list.
    pub fn staged(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| !n.is_placed())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop group tags from every node.
    pub fn clear_groups(&mut self) {
        for node in &mut self.nodes {
            node.clear_group();
        }
    }

    /// Generate an id that no node in this store uses yet.
    ///
    /// The process counter restarts on reload, so restored ids may
    /// already occupy the next candidates.
    pub fn fresh_id(&self, kind: NodeKind) -> NodeId {
        loop {
            let id = NodeId::next(kind.as_str());
            if !self.contains(id) {
                return id;
            }
        }
    }

    fn position_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }
}
