//! An open board: node operations, autosave and the grouping cycle.
//!
//! Every mutation is written through the repository immediately. Storage
//! failures are logged and otherwise ignored; the session keeps working
//! from memory.

use std::future::Future;
use std::time::Duration;

use mm_classifier::{Classifier, ClassifierError, Labels, RequestSnapshot};
use mm_core::{Board, BoardRepository, Group, GroupType, KeyValueStore, Node, NodeId, NodeKind, Size};

use crate::grouping::{GroupingConfig, GroupingCycle, GroupingError, Notice};

pub struct BoardSession<S: KeyValueStore> {
    board: Board,
    repo: BoardRepository<S>,
    cycle: GroupingCycle,
}

impl<S: KeyValueStore> BoardSession<S> {
    /// Load `board_id` from `storage`, creating an empty board on first visit.
    pub fn open(storage: S, board_id: &str, config: GroupingConfig) -> Self {
        let repo = BoardRepository::new(storage);
        let first_visit = !repo.exists(board_id);
        let mut board = repo.load(board_id);
        if first_visit {
            if let Some(theme) = repo.global_theme() {
                board.theme_name = theme;
            }
        }
        let mut session = Self {
            board,
            repo,
            cycle: GroupingCycle::new(config),
        };
        if first_visit {
            log::info!("board {board_id}: created");
            session.persist();
        }
        session
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn repository(&self) -> &BoardRepository<S> {
        &self.repo
    }

    pub fn cycle(&self) -> &GroupingCycle {
        &self.cycle
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.cycle.drain_notices()
    }

    fn persist(&mut self) {
        if let Err(e) = self.repo.save(&self.board) {
            log::warn!("board {}: not saved, continuing in memory: {e}", self.board.id);
        }
    }

    // ─── Node operations ─────────────────────────────────────────────────

    pub fn add_node(&mut self, kind: NodeKind, content: impl Into<String>, size: Size) -> NodeId {
        let id = self.board.store.add_node(kind, content, size);
        self.persist();
        id
    }

    pub fn place_node(&mut self, id: NodeId, x: f32, y: f32) -> bool {
        let moved = self.board.store.place_node(id, x, y);
        if moved {
            self.persist();
        }
        moved
    }

    pub fn move_node(&mut self, id: NodeId, x: f32, y: f32) -> bool {
        let moved = self.board.store.move_node(id, x, y);
        if moved {
            self.persist();
        }
        moved
    }

    pub fn select_node(&mut self, id: NodeId) -> Option<&Node> {
        self.board.store.select_node(id)?;
        self.persist();
        self.board.store.selected()
    }

    pub fn delete_node(&mut self, id: NodeId) -> Option<Node> {
        let removed = self.board.store.delete_node(id)?;
        for group in &mut self.board.groups {
            group.member_ids.retain(|m| *m != id);
        }
        self.board.groups.retain(|g| !g.member_ids.is_empty());
        self.persist();
        Some(removed)
    }

    pub fn rename(&mut self, name: &str) {
        self.board.name = name.to_string();
        self.persist();
    }

    pub fn set_theme(&mut self, theme: &str) {
        self.board.theme_name = theme.to_string();
        self.persist();
    }

    pub fn set_global_theme(&mut self, theme: &str) {
        if let Err(e) = self.repo.set_global_theme(theme) {
            log::warn!("global theme not saved: {e}");
        }
    }

    /// Remove the board from storage and start over with an empty one.
    pub fn delete_board(&mut self) {
        if let Err(e) = self.repo.delete(&self.board.id) {
            log::warn!("board {}: delete failed: {e}", self.board.id);
        }
        self.board = Board::new(self.board.id.clone());
    }

    // ─── Grouping ────────────────────────────────────────────────────────

    pub fn begin_grouping(&mut self, mode: GroupType) -> Result<RequestSnapshot, GroupingError> {
        self.cycle.begin(mode, &self.board.store)
    }

    pub fn complete_grouping(
        &mut self,
        outcome: Result<Labels, ClassifierError>,
    ) -> Result<(), GroupingError> {
        self.cycle.complete(outcome)
    }

    pub fn start_layout(&mut self) -> Result<(), GroupingError> {
        self.cycle.start_layout()
    }

    pub fn finish_layout(&mut self) -> Result<Vec<Group>, GroupingError> {
        let groups = self.cycle.finish_layout(&mut self.board)?.to_vec();
        self.persist();
        Ok(groups)
    }

    /// Run a whole grouping cycle.
    ///
    /// The session stays mutably borrowed until the cycle ends, so the
    /// board cannot be edited while the request is out. Hosts that keep
    /// the board editable drive the steps instead: `begin_grouping`,
    /// `complete_grouping`, `start_layout`, `finish_layout`.
    pub async fn run_grouping<C, P, F>(
        &mut self,
        mode: GroupType,
        classifier: &C,
        pause: P,
    ) -> Result<Vec<Group>, GroupingError>
    where
        C: Classifier + ?Sized,
        P: FnOnce(Duration) -> F,
        F: Future<Output = ()>,
    {
        let groups = self.cycle.run(&mut self.board, mode, classifier, pause).await?;
        self.persist();
        Ok(groups)
    }
}
