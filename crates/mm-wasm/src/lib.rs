//! WASM bridge for MindMesh: exposes the board engine to the browser UI.
//!
//! Compiled via `wasm-pack build --target web`. The page owns rendering and
//! the `fetch` to the placement service; this crate owns node state,
//! persistence and the grouping cycle. A grouping run from JS looks like:
//!
//! ```text
//! let req = board.begin_grouping("mood-theme");   // {"url": ..., "body": ...}
//! board.receive_response(await (await fetch(...)).text())   // or receive_failure(msg)
//! await sleep(board.reveal_delay_ms());
//! board.finish_grouping();                        // groups JSON
//! board.take_notices();
//! ```

mod bridge;
mod storage;

use mm_core::{NodeId, NodeKind, Size};
use mm_editor::GroupingConfig;
use wasm_bindgen::prelude::*;

pub use bridge::{BoardBridge, BridgeError};
pub use storage::LocalStorage;

/// One open board, backed by `localStorage`.
#[wasm_bindgen]
pub struct MindMeshBoard {
    bridge: BoardBridge<LocalStorage>,
}

#[wasm_bindgen]
impl MindMeshBoard {
    /// Open (or create) `board_id`. `service_url` overrides the default
    /// placement service location.
    #[wasm_bindgen(constructor)]
    pub fn new(board_id: &str, service_url: Option<String>) -> Self {
        console_error_panic_hook_setup();

        Self {
            bridge: BoardBridge::open(
                LocalStorage::open(),
                board_id,
                service_url.as_deref(),
                GroupingConfig::default(),
            ),
        }
    }

    // ─── Board ───────────────────────────────────────────────────────────

    pub fn board_id(&self) -> String {
        self.bridge.session().board().id.clone()
    }

    pub fn name(&self) -> String {
        self.bridge.session().board().name.clone()
    }

    pub fn rename(&mut self, name: &str) {
        self.bridge.session_mut().rename(name);
    }

    pub fn theme(&self) -> String {
        self.bridge.session().board().theme_name.clone()
    }

    pub fn set_theme(&mut self, theme: &str) {
        self.bridge.session_mut().set_theme(theme);
    }

    /// Theme new boards start with.
    pub fn set_global_theme(&mut self, theme: &str) {
        self.bridge.session_mut().set_global_theme(theme);
    }

    pub fn delete_board(&mut self) {
        self.bridge.session_mut().delete_board();
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Stage a new node. Returns its id, or an empty string for an unknown kind.
    pub fn add_node(&mut self, kind: &str, content: &str, width: f32, height: f32) -> String {
        let Some(kind) = parse_kind(kind) else {
            return String::new();
        };
        let size = if width > 0.0 && height > 0.0 {
            Size { width, height }
        } else {
            Size::default()
        };
        self.bridge
            .session_mut()
            .add_node(kind, content, size)
            .as_str()
            .to_string()
    }

    /// Drop a node on the board (staged or placed). Returns `false` for unknown ids.
    pub fn place_node(&mut self, node_id: &str, x: f32, y: f32) -> bool {
        NodeId::get(node_id).is_some_and(|id| self.bridge.session_mut().place_node(id, x, y))
    }

    pub fn move_node(&mut self, node_id: &str, x: f32, y: f32) -> bool {
        NodeId::get(node_id).is_some_and(|id| self.bridge.session_mut().move_node(id, x, y))
    }

    pub fn select_node(&mut self, node_id: &str) -> bool {
        NodeId::get(node_id).is_some_and(|id| self.bridge.session_mut().select_node(id).is_some())
    }

    pub fn selected_id(&self) -> String {
        self.bridge
            .session()
            .board()
            .store
            .selected_id()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn delete_node(&mut self, node_id: &str) -> bool {
        NodeId::get(node_id).is_some_and(|id| self.bridge.session_mut().delete_node(id).is_some())
    }

    /// All nodes in draw order as a JSON array.
    pub fn nodes_json(&self) -> String {
        serde_json::to_string(self.bridge.session().board().store.nodes())
            .unwrap_or_else(|_| "[]".to_string())
    }

    /// Groups from the last grouping run as a JSON array.
    pub fn groups_json(&self) -> String {
        serde_json::to_string(&self.bridge.session().board().groups)
            .unwrap_or_else(|_| "[]".to_string())
    }

    // ─── Grouping ────────────────────────────────────────────────────────

    /// Whether the grouping trigger should be enabled.
    pub fn can_group(&self) -> bool {
        self.bridge.session().cycle().is_idle()
    }

    pub fn grouping_state(&self) -> String {
        self.bridge.session().cycle().state().name().to_string()
    }

    /// Start a grouping run in `mode` (`art-style`, `mood-theme`, `semantic`).
    ///
    /// Returns `{"url":...,"body":...}` for the request the page should POST.
    /// When there is nothing the service could use, the run falls back
    /// immediately and `url` is `null`; go straight to `finish_grouping`.
    pub fn begin_grouping(&mut self, mode: &str) -> Result<String, JsValue> {
        self.bridge.begin(mode).map_err(js_error)
    }

    /// Feed the raw service response body. Returns the new state name.
    pub fn receive_response(&mut self, body: &str) -> Result<String, JsValue> {
        self.bridge
            .receive_response(body)
            .map(str::to_string)
            .map_err(js_error)
    }

    /// Report a failed call (network error, non-2xx, timeout).
    pub fn receive_failure(&mut self, reason: &str) -> Result<String, JsValue> {
        self.bridge
            .receive_failure(reason)
            .map(str::to_string)
            .map_err(js_error)
    }

    /// How long the page should wait before `finish_grouping`.
    pub fn reveal_delay_ms(&self) -> u32 {
        self.bridge.reveal_delay_ms()
    }

    /// Move members into their groups and return the groups JSON.
    pub fn finish_grouping(&mut self) -> Result<String, JsValue> {
        let groups = self.bridge.finish().map_err(js_error)?;
        serde_json::to_string(&groups).map_err(js_error)
    }

    /// Messages for the user since the last call, as a JSON array of
    /// `{"kind":"error"|"fallback","message":...}`.
    pub fn take_notices(&mut self) -> String {
        self.bridge.take_notices()
    }
}

fn parse_kind(kind: &str) -> Option<NodeKind> {
    match kind {
        "text" => Some(NodeKind::Text),
        "image" => Some(NodeKind::Image),
        _ => None,
    }
}

fn js_error(e: impl ToString) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("MindMesh WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
