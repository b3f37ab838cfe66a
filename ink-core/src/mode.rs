//! Tool modes and the handler bindings they own.
//!
//! [`ModeMachine`] is the single source of truth for the active tool. Every
//! transition unbinds the previous mode's handlers before binding the next
//! mode's, and re-derives object interactivity in one pass over the scene.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Scene;

/// Number of transitions kept for inspection.
const TRANSITION_LOG_LEN: usize = 32;

/// The active tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Free-hand ink.
    Draw,
    /// Remove objects by dragging over them.
    Erase,
    /// Select and manipulate objects.
    #[default]
    Select,
    /// Drag the viewport.
    Pan,
    /// Insert a text box.
    Text,
}

impl Mode {
    /// All modes.
    pub const ALL: [Self; 5] = [Self::Draw, Self::Erase, Self::Select, Self::Pan, Self::Text];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draw => "draw",
            Self::Erase => "erase",
            Self::Select => "select",
            Self::Pan => "pan",
            Self::Text => "text",
        }
    }

    /// Side effects this mode applies.
    #[must_use]
    pub const fn profile(self) -> ModeProfile {
        match self {
            Self::Select => ModeProfile {
                selectable: true,
                evented: true,
                group_selection: true,
                controls_visible: true,
                cursor: Cursor::Default,
                handlers: &[Handler::Manipulate],
            },
            Self::Draw => ModeProfile {
                selectable: false,
                evented: false,
                group_selection: false,
                controls_visible: false,
                cursor: Cursor::Pen,
                handlers: &[Handler::FreeDraw],
            },
            Self::Erase => ModeProfile {
                selectable: false,
                evented: true,
                group_selection: false,
                controls_visible: false,
                cursor: Cursor::Eraser,
                handlers: &[Handler::EraseOnDrag],
            },
            Self::Pan => ModeProfile {
                selectable: false,
                evented: false,
                group_selection: false,
                controls_visible: false,
                cursor: Cursor::Grab,
                handlers: &[Handler::PanDrag],
            },
            Self::Text => ModeProfile {
                selectable: false,
                evented: false,
                group_selection: false,
                controls_visible: false,
                cursor: Cursor::Text,
                handlers: &[Handler::TextInsert, Handler::TextEditExit],
            },
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown mode '{s}'"))
    }
}

/// Mode-specific input handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    /// Click to select, drag to move, rubber-band selection.
    Manipulate,
    /// Brush capture on pointer-down/move/up.
    FreeDraw,
    /// Hit-test and remove on pointer-move while pressed.
    EraseOnDrag,
    /// Viewport drag.
    PanDrag,
    /// Pointer-down inserts a text box (once per activation).
    TextInsert,
    /// Leaving edit focus commits and returns to select.
    TextEditExit,
}

/// Pointer cursor shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cursor {
    /// Arrow.
    Default,
    /// Pen tip.
    Pen,
    /// Eraser.
    Eraser,
    /// Open hand.
    Grab,
    /// Closed hand while dragging.
    Grabbing,
    /// Text caret.
    Text,
    /// Busy while a conversion is running.
    Progress,
}

/// What a mode does to the scene and which handlers it binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeProfile {
    /// Objects can be selected.
    pub selectable: bool,
    /// Objects receive pointer events.
    pub evented: bool,
    /// Rubber-band selection enabled.
    pub group_selection: bool,
    /// Transform/convert controls drawn.
    pub controls_visible: bool,
    /// Idle cursor.
    pub cursor: Cursor,
    /// Handlers bound while active.
    pub handlers: &'static [Handler],
}

/// One (un)binding step of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Handler detached.
    Unbound(Handler),
    /// Handler attached.
    Bound(Handler),
}

/// Record of a mode change, in the order things happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeTransition {
    /// Previous mode.
    pub from: Mode,
    /// New mode.
    pub to: Mode,
    /// Unbind/bind steps.
    pub steps: Vec<Binding>,
}

/// Holds the active mode and its bound handlers.
#[derive(Debug, Clone)]
pub struct ModeMachine {
    mode: Mode,
    bound: Vec<Handler>,
    text_inserted: bool,
    transitions: VecDeque<ModeTransition>,
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

impl ModeMachine {
    /// Start in `mode` with its handlers bound. Scene flags are not touched;
    /// call [`ModeMachine::apply_flags`] once objects exist.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            bound: mode.profile().handlers.to_vec(),
            text_inserted: false,
            transitions: VecDeque::new(),
        }
    }

    /// The active mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Side effects of the active mode.
    #[must_use]
    pub fn profile(&self) -> ModeProfile {
        self.mode.profile()
    }

    /// Handlers currently bound.
    #[must_use]
    pub fn bound_handlers(&self) -> &[Handler] {
        &self.bound
    }

    /// Whether `handler` is currently bound.
    #[must_use]
    pub fn is_bound(&self, handler: Handler) -> bool {
        self.bound.contains(&handler)
    }

    /// Recent transitions, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &ModeTransition> {
        self.transitions.iter()
    }

    /// The most recent transition.
    #[must_use]
    pub fn last_transition(&self) -> Option<&ModeTransition> {
        self.transitions.back()
    }

    /// Switch to `mode`.
    ///
    /// Unbinds everything, re-derives object flags, then binds the new
    /// handlers. Re-applying the active mode starts a fresh activation.
    /// Scene content is never modified.
    pub fn apply(&mut self, scene: &mut Scene, mode: Mode) -> &ModeTransition {
        let from = self.mode;
        let mut steps = Vec::with_capacity(self.bound.len() + 2);
        for handler in self.bound.drain(..) {
            debug!(?handler, mode = %from, "unbind handler");
            steps.push(Binding::Unbound(handler));
        }

        self.mode = mode;
        self.text_inserted = false;
        self.apply_flags(scene);

        for &handler in mode.profile().handlers {
            debug!(?handler, %mode, "bind handler");
            self.bound.push(handler);
            steps.push(Binding::Bound(handler));
        }

        debug!(%from, to = %mode, "mode applied");
        if self.transitions.len() == TRANSITION_LOG_LEN {
            self.transitions.pop_front();
        }
        self.transitions.push_back(ModeTransition {
            from,
            to: mode,
            steps,
        });
        // Just pushed, so the log is non-empty
        &self.transitions[self.transitions.len() - 1]
    }

    /// Set every object's interactivity for the active mode.
    pub fn apply_flags(&self, scene: &mut Scene) {
        let profile = self.profile();
        scene.set_selectable_all(profile.selectable);
        scene.set_evented_all(profile.evented);
        if !profile.selectable {
            scene.deselect_all();
        }
    }

    /// Claim the single text insertion of this activation.
    ///
    /// Returns `true` exactly once per text-mode activation.
    pub fn claim_text_insertion(&mut self) -> bool {
        if self.mode != Mode::Text || !self.is_bound(Handler::TextInsert) || self.text_inserted {
            return false;
        }
        self.text_inserted = true;
        true
    }
}
