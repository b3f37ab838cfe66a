//! The interactive canvas: tool modes, pointer handling and the command
//! surface a host toolbar drives.
//!
//! All mutation happens on the caller's thread. Committing edits record one
//! history snapshot each; mode changes and viewport moves never do.

use tracing::{debug, info, warn};

use crate::capture::{Brush, PointerTracker, StrokeCapture};
use crate::config::CanvasConfig;
use crate::convert::{
    ConversionKind, ConversionRequest, ConversionTicket, DocumentStore, InkSynthesizer,
    PendingConversion, PendingConversions, RecognizedText, SynthesizedInk, TextRecognizer,
};
use crate::element::{text_height, ConvertControl, ObjectKind, Transform};
use crate::event::{Axis, PointerEvent, PointerOutcome, PointerPhase};
use crate::export::{filename_for, ExportArtifact, ExportFormat, SceneEncoder};
use crate::geometry::{Point, Rect, Size, Viewport};
use crate::history::History;
use crate::media;
use crate::mode::{Cursor, Mode, ModeMachine};
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::persist::{self, SceneBlob};
use crate::schema::SceneDocument;
use crate::text::TextEditSession;
use crate::{CanvasError, CanvasResult, CapabilityError, ObjectId, Scene, SceneObject};

/// Callback run with the scene content after every commit, undo and redo.
pub type CommitHook = Box<dyn FnMut(&SceneDocument)>;

/// Drag gesture in progress.
#[derive(Debug, Clone, Copy)]
enum Drag {
    /// Viewport drag; last pointer position in screen space.
    Pan { last: Point },
    /// Moving the selection; last pointer position in scene space.
    Move { last: Point, moved: bool },
    /// Rubber-band selection in scene space.
    Band { start: Point, current: Point },
}

/// A headless drawing surface.
pub struct Canvas {
    config: CanvasConfig,
    scene: Scene,
    history: History,
    modes: ModeMachine,
    pointer: PointerTracker,
    brush: Brush,
    capture: StrokeCapture,
    drag: Option<Drag>,
    editing: Option<TextEditSession>,
    placement: Option<ObjectId>,
    pending: PendingConversions,
    recognized: RecognizedText,
    notifier: Box<dyn Notifier>,
    on_commit: Option<CommitHook>,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("mode", &self.modes.mode())
            .field("objects", &self.scene.len())
            .field("past", &self.history.past_len())
            .field("future", &self.history.future_len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Canvas {
    /// Create an empty canvas in select mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is out of range or the initial
    /// snapshot cannot be taken.
    pub fn new(config: CanvasConfig, size: Size) -> CanvasResult<Self> {
        let config = config.validated()?;
        let scene = Scene::new(size);
        let history = History::new(&scene, config.history_limit)?;
        let brush = Brush::new(config.brush.color.clone(), config.brush.width);
        Ok(Self {
            config,
            scene,
            history,
            modes: ModeMachine::new(Mode::Select),
            pointer: PointerTracker::default(),
            brush,
            capture: StrokeCapture::default(),
            drag: None,
            editing: None,
            placement: None,
            pending: PendingConversions::default(),
            recognized: RecognizedText::default(),
            notifier: Box::new(TracingNotifier),
            on_commit: None,
        })
    }

    /// Replace the notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Register the commit callback (e.g. to schedule autosave).
    pub fn set_on_commit(&mut self, hook: impl FnMut(&SceneDocument) + 'static) {
        self.on_commit = Some(Box::new(hook));
    }

    // ======================================================================
    // Read-only state
    // ======================================================================

    /// Read-only view of the scene.
    #[must_use]
    pub fn get_scene(&self) -> &Scene {
        &self.scene
    }

    /// Serializable copy of the scene content.
    #[must_use]
    pub fn document(&self) -> SceneDocument {
        SceneDocument::from_scene(&self.scene)
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Undo/redo stacks.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Mode state machine.
    #[must_use]
    pub fn modes(&self) -> &ModeMachine {
        &self.modes
    }

    /// The active mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    /// Current pen brush.
    #[must_use]
    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    /// Whether the pointer is held down.
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.pointer.is_pressed()
    }

    /// Text box with edit focus, if any.
    #[must_use]
    pub fn editing(&self) -> Option<ObjectId> {
        self.editing.as_ref().map(|s| s.target)
    }

    /// Image still following the pointer, if any.
    #[must_use]
    pub fn pending_placement(&self) -> Option<ObjectId> {
        self.placement
    }

    /// Whether a conversion is in flight for `id`.
    #[must_use]
    pub fn is_converting(&self, id: ObjectId) -> bool {
        self.pending.is_pending(id)
    }

    /// Latest OCR result.
    #[must_use]
    pub fn recognized_text(&self) -> &RecognizedText {
        &self.recognized
    }

    /// Cursor to show right now.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        if !self.pending.is_empty() {
            return Cursor::Progress;
        }
        if matches!(self.drag, Some(Drag::Pan { .. })) {
            return Cursor::Grabbing;
        }
        self.modes.profile().cursor
    }

    /// Current rubber-band rectangle in scene space.
    #[must_use]
    pub fn selection_band(&self) -> Option<Rect> {
        match self.drag {
            Some(Drag::Band { start, current }) => Rect::from_points([start, current]),
            _ => None,
        }
    }

    // ======================================================================
    // Modes
    // ======================================================================

    /// Switch tools.
    ///
    /// Unfinished interactions are settled first: an open text edit is
    /// committed, a floating image is placed, a half-drawn stroke is dropped.
    /// The switch itself never records history.
    pub fn apply_mode(&mut self, mode: Mode) {
        self.settle_interactions();
        let transition = self.modes.apply(&mut self.scene, mode);
        info!(from = %transition.from, to = %transition.to, "mode changed");
    }

    fn settle_interactions(&mut self) {
        self.capture.cancel();
        self.drag = None;
        if self.editing.is_some() {
            self.end_text_edit();
        }
        if self.placement.is_some() {
            self.place_image();
        }
    }

    /// Change the pen. Applies to strokes drawn from now on.
    pub fn set_brush(&mut self, color: impl Into<String>, width: f64) {
        self.brush = Brush::new(color, width);
        debug!(color = %self.brush.color, width = self.brush.width, "brush changed");
    }

    // ======================================================================
    // Pointer input
    // ======================================================================

    /// Dispatch a pointer event.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> PointerOutcome {
        match event.phase {
            PointerPhase::Down => self.pointer_down(event.position()),
            PointerPhase::Move => {
                self.pointer_move(event.position());
                PointerOutcome::None
            }
            PointerPhase::Up => {
                self.pointer_up(event.position());
                PointerOutcome::None
            }
        }
    }

    /// Pointer pressed at a screen position.
    pub fn pointer_down(&mut self, screen: Point) -> PointerOutcome {
        self.pointer.press();
        let p = self.scene.viewport().screen_to_scene(screen);

        if self.placement.is_some() {
            self.place_image();
            return PointerOutcome::None;
        }

        match self.modes.mode() {
            Mode::Draw => self.capture.begin(p),
            Mode::Erase => {}
            Mode::Pan => self.drag = Some(Drag::Pan { last: screen }),
            Mode::Text => self.text_pointer_down(p),
            Mode::Select => return self.select_pointer_down(screen, p),
        }
        PointerOutcome::None
    }

    /// Pointer moved to a screen position.
    pub fn pointer_move(&mut self, screen: Point) {
        let p = self.scene.viewport().screen_to_scene(screen);

        if let Some(id) = self.placement {
            if let Some(image) = self.scene.get_object_mut(id) {
                image.transform.x = p.x;
                image.transform.y = p.y;
            }
            return;
        }

        match self.modes.mode() {
            Mode::Draw => self.capture.extend(p),
            Mode::Erase => {
                if self.pointer.is_pressed() {
                    self.erase_at(p);
                }
            }
            Mode::Pan => {
                if let Some(Drag::Pan { last }) = self.drag {
                    let viewport = self.scene.viewport().pan_by(
                        screen.x - last.x,
                        screen.y - last.y,
                        &self.scene.pan_bounds(),
                        self.scene.size(),
                    );
                    self.scene.set_viewport(viewport);
                    self.drag = Some(Drag::Pan { last: screen });
                }
            }
            Mode::Select => self.select_pointer_move(p),
            Mode::Text => {}
        }
    }

    /// Pointer released at a screen position.
    pub fn pointer_up(&mut self, screen: Point) {
        self.pointer.release();
        let p = self.scene.viewport().screen_to_scene(screen);

        match self.modes.mode() {
            Mode::Draw => {
                self.capture.extend(p);
                if let Some(stroke) = self.capture.finish(&self.brush) {
                    match self.scene.add_object(stroke) {
                        Ok(id) => {
                            debug!(%id, "stroke committed");
                            self.refresh_flags();
                            self.commit();
                        }
                        Err(e) => self.report(&e),
                    }
                }
            }
            Mode::Select => self.select_pointer_up(),
            Mode::Pan | Mode::Erase | Mode::Text => {}
        }
        self.drag = None;
    }

    fn erase_at(&mut self, p: Point) {
        let Some(id) = self.scene.object_at(p) else {
            return;
        };
        if self.placement == Some(id) {
            return;
        }
        if let Some(removed) = self.scene.remove_object(id) {
            debug!(%id, kind = removed.kind.name(), "erased");
            self.commit();
        }
    }

    fn text_pointer_down(&mut self, p: Point) {
        if let Some(session) = &self.editing {
            let inside = self
                .scene
                .get_object(session.target)
                .is_some_and(|o| o.contains_point(p));
            if !inside {
                self.exit_text_editing();
            }
            return;
        }
        if !self.modes.claim_text_insertion() {
            return;
        }
        let text = &self.config.text;
        let textbox = SceneObject::textbox("", p, text.width, text.style.clone());
        let id = textbox.id;
        match self.scene.add_object(textbox) {
            Ok(_) => {
                self.refresh_flags();
                self.attach_control(id);
                self.scene.deselect_all();
                let _ = self.scene.select(id);
                self.editing = Some(TextEditSession::new(id, ""));
                debug!(%id, "text box inserted");
            }
            Err(e) => self.report(&e),
        }
    }

    fn select_pointer_down(&mut self, screen: Point, p: Point) -> PointerOutcome {
        if let Some(id) = self.convert_control_at(screen) {
            return PointerOutcome::ConvertRequested(id);
        }
        let hit = self
            .scene
            .object_at(p)
            .filter(|id| self.scene.get_object(*id).is_some_and(|o| o.selectable));
        match hit {
            Some(id) => {
                if !self.scene.selected().contains(&id) {
                    self.scene.deselect_all();
                    let _ = self.scene.select(id);
                }
                self.drag = Some(Drag::Move {
                    last: p,
                    moved: false,
                });
            }
            None => {
                self.scene.deselect_all();
                if self.modes.profile().group_selection {
                    self.drag = Some(Drag::Band {
                        start: p,
                        current: p,
                    });
                }
            }
        }
        PointerOutcome::None
    }

    fn select_pointer_move(&mut self, p: Point) {
        match self.drag {
            Some(Drag::Move { last, .. }) => {
                let (dx, dy) = (p.x - last.x, p.y - last.y);
                let selected = self.scene.selected().to_vec();
                for id in selected {
                    if let Some(object) = self.scene.get_object_mut(id) {
                        object.transform.x += dx;
                        object.transform.y += dy;
                    }
                }
                self.drag = Some(Drag::Move {
                    last: p,
                    moved: true,
                });
            }
            Some(Drag::Band { start, .. }) => {
                self.drag = Some(Drag::Band { start, current: p });
            }
            _ => {}
        }
    }

    fn select_pointer_up(&mut self) {
        match self.drag {
            Some(Drag::Move { moved: true, .. }) => self.commit(),
            Some(Drag::Band { start, current }) => {
                if let Some(band) = Rect::from_points([start, current]) {
                    for id in self.scene.objects_in(&band) {
                        let _ = self.scene.select(id);
                    }
                }
            }
            _ => {}
        }
    }

    /// Object whose visible convert control is under a screen point.
    #[must_use]
    pub fn convert_control_at(&self, screen: Point) -> Option<ObjectId> {
        if !self.modes.profile().controls_visible {
            return None;
        }
        let viewport = self.scene.viewport();
        self.scene.selected().iter().rev().copied().find(|id| {
            self.scene.get_object(*id).is_some_and(|o| {
                o.control
                    .is_some_and(|c| c.screen_rect(o, &viewport).contains(screen))
            })
        })
    }

    // ======================================================================
    // Viewport
    // ======================================================================

    /// Zoom by `factor` around a screen point.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        let viewport =
            self.scene
                .viewport()
                .zoom_at_point(screen, factor, self.config.zoom_limits());
        self.scene.set_viewport(viewport);
    }

    /// Pan by a screen delta, clamped to the scene bounds.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let viewport = self.scene.viewport().pan_by(
            dx,
            dy,
            &self.scene.pan_bounds(),
            self.scene.size(),
        );
        self.scene.set_viewport(viewport);
    }

    /// Resize the canvas; degenerate sizes are clamped.
    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        self.scene.set_size(width, height);
    }

    // ======================================================================
    // History
    // ======================================================================

    /// Step back one edit. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        self.settle_interactions();
        let result = self.history.undo(&mut self.scene);
        self.after_history_step(result, "undo")
    }

    /// Re-apply the last undone edit. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        self.settle_interactions();
        let result = self.history.redo(&mut self.scene);
        self.after_history_step(result, "redo")
    }

    fn after_history_step(&mut self, result: CanvasResult<bool>, action: &str) -> bool {
        match result {
            Ok(true) => {
                self.after_restore();
                self.fire_commit_hook();
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(error = %e, action, "history step failed, scene unchanged");
                self.notifier
                    .notify(Notification::error(format!("Could not {action}: {e}")));
                false
            }
        }
    }

    /// Record a snapshot and notify the host.
    ///
    /// A floating image is not part of the document yet, so it is lifted
    /// out while the snapshot is taken.
    fn commit(&mut self) {
        let floating = self.placement.and_then(|id| self.scene.remove_object(id));
        match self.history.record(&self.scene) {
            Ok(true) => self.fire_commit_hook(),
            Ok(false) => {}
            Err(e) => self.report(&e),
        }
        if let Some(image) = floating {
            if let Err(e) = self.scene.add_object(image) {
                self.report(&e);
            }
        }
    }

    /// Mode-derived interactivity; nothing is interactive while an image floats.
    fn refresh_flags(&mut self) {
        self.modes.apply_flags(&mut self.scene);
        if self.placement.is_some() {
            self.scene.set_selectable_all(false);
            self.scene.set_evented_all(false);
        }
    }

    fn fire_commit_hook(&mut self) {
        if let Some(hook) = self.on_commit.as_mut() {
            hook(&SceneDocument::from_scene(&self.scene));
        }
    }

    /// Re-derive runtime state after the object set was replaced.
    fn after_restore(&mut self) {
        self.refresh_flags();
        self.attach_controls();
    }

    fn attach_control(&mut self, id: ObjectId) {
        if let Some(object) = self.scene.get_object_mut(id) {
            object.control = object.is_convertible().then(ConvertControl::default);
        }
    }

    fn attach_controls(&mut self) {
        for object in self.scene.objects_mut() {
            object.control = object.is_convertible().then(ConvertControl::default);
        }
    }

    fn report(&self, error: &CanvasError) {
        warn!(%error, "operation failed");
        self.notifier.notify(Notification::error(error.to_string()));
    }

    // ======================================================================
    // Text editing
    // ======================================================================

    /// Give edit focus to a text box.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist or is not a text box.
    pub fn begin_text_editing(&mut self, id: ObjectId) -> CanvasResult<()> {
        let object = self
            .scene
            .get_object(id)
            .ok_or(CanvasError::ObjectNotFound(id))?;
        let ObjectKind::Textbox { content, .. } = &object.kind else {
            return Err(CanvasError::WrongKind {
                id,
                expected: "textbox",
            });
        };
        let session = TextEditSession::new(id, content);
        if self.editing.as_ref().is_some_and(|s| s.target != id) {
            self.end_text_edit();
        }
        self.editing = Some(session);
        Ok(())
    }

    fn with_focused_text<R>(
        &mut self,
        edit: impl FnOnce(&mut TextEditSession, &mut String) -> R,
    ) -> Option<R> {
        let session = self.editing.as_mut()?;
        match self.scene.get_object_mut(session.target) {
            Some(SceneObject {
                kind: ObjectKind::Textbox { content, style, .. },
                transform,
                ..
            }) => {
                let before = text_height(content.as_str(), style.font_size);
                let result = edit(session, &mut *content);
                keep_top_edge(transform, text_height(content.as_str(), style.font_size) - before);
                Some(result)
            }
            _ => {
                self.editing = None;
                None
            }
        }
    }

    /// Type text at the cursor. Returns false without edit focus.
    pub fn insert_text(&mut self, text: &str) -> bool {
        self.with_focused_text(|s, content| s.insert(content, text))
            .is_some()
    }

    /// Insert a line break at the cursor.
    pub fn insert_newline(&mut self) -> bool {
        self.insert_text("\n")
    }

    /// Delete the character before the cursor.
    pub fn delete_backward(&mut self) -> bool {
        self.with_focused_text(TextEditSession::delete_backward)
            .unwrap_or(false)
    }

    /// Move the cursor left.
    pub fn move_cursor_left(&mut self) -> bool {
        self.with_focused_text(|s, content| s.move_left(content))
            .unwrap_or(false)
    }

    /// Move the cursor right.
    pub fn move_cursor_right(&mut self) -> bool {
        self.with_focused_text(|s, content| s.move_right(content))
            .unwrap_or(false)
    }

    /// Leave edit focus: commit the edit and return to select mode.
    pub fn exit_text_editing(&mut self) {
        if self.editing.is_none() {
            return;
        }
        self.end_text_edit();
        if self.modes.mode() != Mode::Select {
            let transition = self.modes.apply(&mut self.scene, Mode::Select);
            info!(from = %transition.from, to = %transition.to, "text edit finished");
        }
    }

    fn end_text_edit(&mut self) {
        if let Some(session) = self.editing.take() {
            debug!(id = %session.target, "text edit committed");
            self.scene.deselect_all();
            self.commit();
        }
    }

    /// Change font size and fill of a text box.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist or is not a text box.
    pub fn set_text_style(&mut self, id: ObjectId, font_size: f64, fill: &str) -> CanvasResult<()> {
        match self.scene.get_object_mut(id) {
            Some(SceneObject {
                kind: ObjectKind::Textbox { content, style, .. },
                transform,
                ..
            }) => {
                if font_size.is_finite() && font_size > 0.0 {
                    let before = text_height(content.as_str(), style.font_size);
                    style.font_size = font_size;
                    keep_top_edge(transform, text_height(content.as_str(), font_size) - before);
                }
                style.fill = fill.to_string();
            }
            Some(_) => {
                return Err(CanvasError::WrongKind {
                    id,
                    expected: "textbox",
                })
            }
            None => return Err(CanvasError::ObjectNotFound(id)),
        }
        if self.editing.is_none() {
            self.commit();
        }
        Ok(())
    }

    // ======================================================================
    // Selection commands
    // ======================================================================

    /// Select a single object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing or not selectable in this mode.
    pub fn select(&mut self, id: ObjectId) -> CanvasResult<()> {
        let selectable = self
            .scene
            .get_object(id)
            .ok_or(CanvasError::ObjectNotFound(id))?
            .selectable;
        if !selectable {
            return Err(CanvasError::NotSelectable(id));
        }
        self.scene.deselect_all();
        self.scene.select(id)
    }

    /// Clear the selection.
    pub fn discard_selection(&mut self) {
        self.scene.deselect_all();
    }

    /// Remove every selected object as one edit.
    pub fn delete_selected(&mut self) -> usize {
        let selected = self.scene.selected().to_vec();
        let removed = selected
            .into_iter()
            .filter(|id| self.scene.remove_object(*id).is_some())
            .count();
        if removed > 0 {
            self.commit();
        }
        removed
    }

    fn transform_selected(&mut self, f: impl Fn(&mut Transform)) -> usize {
        let selected = self.scene.selected().to_vec();
        let mut changed = 0;
        for id in selected {
            if let Some(object) = self.scene.get_object_mut(id) {
                f(&mut object.transform);
                changed += 1;
            }
        }
        if changed > 0 {
            self.commit();
        }
        changed
    }

    /// Rotate the selection about each object's center.
    pub fn rotate_selected(&mut self, degrees: f64) -> usize {
        if !degrees.is_finite() {
            return 0;
        }
        self.transform_selected(|t| t.angle = (t.angle + degrees).rem_euclid(360.0))
    }

    /// Scale the selection about each object's center.
    pub fn scale_selected(&mut self, factor: f64) -> usize {
        if !(factor.is_finite() && factor > 0.0) {
            return 0;
        }
        self.transform_selected(|t| {
            t.scale_x *= factor;
            t.scale_y *= factor;
        })
    }

    /// Mirror the selection.
    pub fn flip_selected(&mut self, axis: Axis) -> usize {
        self.transform_selected(|t| match axis {
            Axis::Horizontal => t.flip_x = !t.flip_x,
            Axis::Vertical => t.flip_y = !t.flip_y,
        })
    }

    /// Replace an object's transform as one edit.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist.
    pub fn set_transform(&mut self, id: ObjectId, transform: Transform) -> CanvasResult<()> {
        let object = self
            .scene
            .get_object_mut(id)
            .ok_or(CanvasError::ObjectNotFound(id))?;
        object.transform = transform;
        self.commit();
        Ok(())
    }

    // ======================================================================
    // Images
    // ======================================================================

    /// Insert an encoded image that follows the pointer until the next
    /// pointer-down places it.
    ///
    /// # Errors
    ///
    /// Returns an error if another image is still floating or the bytes are
    /// not a supported image.
    pub fn insert_image(&mut self, bytes: &[u8]) -> CanvasResult<ObjectId> {
        if self.placement.is_some() {
            return Err(CanvasError::PlacementPending);
        }
        let info = media::read_info(bytes).inspect_err(|e| self.report(e))?;
        self.capture.cancel();
        self.drag = None;
        if self.editing.is_some() {
            self.end_text_edit();
        }

        let size = self.scene.size();
        let center = self
            .scene
            .viewport()
            .screen_to_scene(Point::new(size.width / 2.0, size.height / 2.0));
        let mut image = SceneObject::image(
            media::to_data_url(bytes, info.mime),
            f64::from(info.width),
            f64::from(info.height),
            center,
        )
        .with_opacity(0.5);
        image.control = Some(ConvertControl::default());

        self.scene.set_selectable_all(false);
        self.scene.set_evented_all(false);
        image.selectable = false;
        image.evented = false;
        let id = self.scene.add_object(image)?;
        self.placement = Some(id);
        info!(%id, width = info.width, height = info.height, mime = info.mime, "image floating");
        Ok(id)
    }

    fn place_image(&mut self) {
        let Some(id) = self.placement.take() else {
            return;
        };
        if let Some(image) = self.scene.get_object_mut(id) {
            image.opacity = 1.0;
        }
        self.refresh_flags();
        debug!(%id, "image placed");
        self.commit();
    }

    // ======================================================================
    // Conversion
    // ======================================================================

    /// Start converting a text box or image into handwriting.
    ///
    /// The source object stays in the scene until the result arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing, already converting, or of
    /// a kind that has no conversion.
    pub fn trigger_conversion(&mut self, id: ObjectId) -> CanvasResult<ConversionTicket> {
        if self.pending.is_pending(id) {
            warn!(%id, "conversion already running");
            return Err(CanvasError::ConversionPending(id));
        }
        if self.placement == Some(id) {
            return Err(CanvasError::PlacementPending);
        }
        if self.editing.as_ref().is_some_and(|s| s.target == id) {
            self.end_text_edit();
        }
        let object = self
            .scene
            .get_object(id)
            .ok_or(CanvasError::ObjectNotFound(id))?;
        let (kind, request) = match &object.kind {
            ObjectKind::Textbox { content, .. } => (
                ConversionKind::TextToInk,
                ConversionRequest::Synthesize {
                    text: content.clone(),
                },
            ),
            ObjectKind::Image { src, .. } => {
                let (image, _mime) = media::from_data_url(src).inspect_err(|e| self.report(e))?;
                (
                    ConversionKind::ImageToInk,
                    ConversionRequest::RecognizeThenSynthesize {
                        image,
                        document_id: self.config.document_id.clone(),
                    },
                )
            }
            ObjectKind::Stroke { .. } => return Err(CanvasError::NotConvertible(id)),
        };
        self.pending.begin(id, PendingConversion { kind })?;
        self.scene.deselect_all();
        info!(%id, ?kind, "conversion started");
        Ok(ConversionTicket {
            object: id,
            kind,
            request,
        })
    }

    /// Apply the outcome of a conversion.
    ///
    /// On success the source object is replaced by one stroke per subpath,
    /// centered where the source is now, and a single snapshot is recorded.
    /// On failure the source object is left in place. If the source vanished
    /// in the meantime the result is discarded.
    ///
    /// # Errors
    ///
    /// Returns the capability error or an error for unusable ink.
    pub fn finish_conversion(
        &mut self,
        ticket: &ConversionTicket,
        outcome: Result<SynthesizedInk, CapabilityError>,
    ) -> CanvasResult<Vec<ObjectId>> {
        let id = ticket.object;
        if self.pending.finish(id).is_none() {
            warn!(%id, "result for a conversion that is not pending, ignored");
            return Ok(Vec::new());
        }

        let ink = match outcome {
            Ok(ink) => ink,
            Err(e) => {
                warn!(%id, error = %e, "conversion failed, original kept");
                let message = format!("Conversion failed: {e}. The original was kept.");
                self.notifier.notify(if e.is_transient() {
                    Notification::warning(message)
                } else {
                    Notification::error(message)
                });
                return Err(e.into());
            }
        };

        let Some(source) = self.scene.get_object(id) else {
            info!(%id, "conversion target removed before completion, result discarded");
            self.notifier.notify(Notification::info(
                "Conversion finished after the object was removed; nothing changed.",
            ));
            return Ok(Vec::new());
        };
        let center = source.bounding_box().center();

        let objects = ink
            .into_objects(center, &self.config.synthesized_stroke)
            .inspect_err(|e| {
                self.notifier.notify(Notification::error(format!(
                    "Conversion failed: {e}. The original was kept."
                )));
            })?;

        let removed = self.scene.remove_object(id);
        let ids = match self.scene.add_objects(objects) {
            Ok(ids) => ids,
            Err(e) => {
                if let Some(original) = removed {
                    let _ = self.scene.add_object(original);
                }
                self.report(&e);
                return Err(e);
            }
        };
        self.refresh_flags();
        self.commit();
        info!(%id, strokes = ids.len(), "conversion applied");
        Ok(ids)
    }

    /// Run a conversion end to end.
    ///
    /// Holds the canvas for the duration of the external calls; hosts that
    /// must stay interactive use [`Canvas::trigger_conversion`],
    /// [`ConversionTicket::run`] and [`Canvas::finish_conversion`] instead.
    ///
    /// # Errors
    ///
    /// See [`Canvas::trigger_conversion`] and [`Canvas::finish_conversion`].
    pub async fn convert(
        &mut self,
        id: ObjectId,
        recognizer: &dyn TextRecognizer,
        synthesizer: &dyn InkSynthesizer,
    ) -> CanvasResult<Vec<ObjectId>> {
        let ticket = self.trigger_conversion(id)?;
        let outcome = ticket.run(recognizer, synthesizer).await;
        self.finish_conversion(&ticket, outcome)
    }

    /// Rasterize the scene for OCR at the configured multiplier.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization fails.
    pub fn ocr_image(&mut self, encoder: &dyn SceneEncoder) -> CanvasResult<Vec<u8>> {
        let multiplier = self.config.ocr_multiplier;
        self.with_identity_viewport(|scene| encoder.rasterize_png(scene, multiplier))
    }

    /// Store an OCR result for the viewer.
    pub fn set_recognized_text(&mut self, text: impl Into<String>) {
        self.recognized = RecognizedText::new(text);
    }

    /// Recognize the handwriting on the whole scene. The scene is not modified.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or recognition fails.
    pub async fn extract_text(
        &mut self,
        encoder: &dyn SceneEncoder,
        recognizer: &dyn TextRecognizer,
    ) -> CanvasResult<String> {
        let image = self.ocr_image(encoder).inspect_err(|e| self.report(e))?;
        match recognizer
            .recognize_text(&image, &self.config.document_id)
            .await
        {
            Ok(text) => {
                self.set_recognized_text(text.clone());
                Ok(text)
            }
            Err(e) => {
                warn!(error = %e, "text extraction failed");
                self.notifier
                    .notify(Notification::warning(format!("Text extraction failed: {e}")));
                Err(e.into())
            }
        }
    }

    // ======================================================================
    // Export and persistence
    // ======================================================================

    fn with_identity_viewport<R>(&mut self, f: impl FnOnce(&Scene) -> R) -> R {
        let saved = self.scene.viewport();
        self.scene.set_viewport(Viewport::IDENTITY);
        let result = f(&self.scene);
        self.scene.set_viewport(saved);
        result
    }

    /// Encode the scene in true scene coordinates.
    ///
    /// The live viewport is swapped for the identity while encoding and
    /// restored afterwards, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn export_as(
        &mut self,
        format: ExportFormat,
        filename: &str,
        encoder: &dyn SceneEncoder,
    ) -> CanvasResult<ExportArtifact> {
        let bytes = self
            .with_identity_viewport(|scene| encoder.encode(scene, format))
            .inspect_err(|e| self.report(e))?;
        let artifact = ExportArtifact {
            filename: filename_for(filename, format),
            format,
            bytes,
        };
        info!(file = %artifact.filename, bytes = artifact.bytes.len(), "exported");
        Ok(artifact)
    }

    /// Serialize the scene for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn save(&self) -> CanvasResult<SceneBlob> {
        persist::save(&self.scene)
    }

    /// Replace the scene with a stored blob and start a fresh history.
    ///
    /// A corrupt blob leaves the canvas untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be decoded.
    pub fn load(&mut self, blob: &SceneBlob) -> CanvasResult<()> {
        let document = persist::load(blob).inspect_err(|e| {
            warn!(error = %e, "scene blob rejected");
            self.notifier
                .notify(Notification::error(format!("Could not load scene: {e}")));
        })?;
        self.settle_interactions();
        if let Some(viewport) = document.viewport {
            let size = viewport.size();
            self.scene.set_size(size.width, size.height);
            self.scene
                .set_viewport(viewport.viewport().sanitized(self.config.zoom_limits()));
        }
        self.scene.replace_objects(document.objects);
        self.after_restore();
        self.history.reset(&self.scene)?;
        info!(objects = self.scene.len(), "scene loaded");
        Ok(())
    }

    /// Fetch this canvas's document from storage and load it.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the blob is corrupt.
    pub async fn load_from(&mut self, store: &dyn DocumentStore) -> CanvasResult<()> {
        let stored = match store.load_document(&self.config.document_id).await {
            Ok(stored) => stored,
            Err(e) => {
                self.notifier
                    .notify(Notification::warning(format!("Could not fetch document: {e}")));
                return Err(e.into());
            }
        };
        if let Some(blob) = &stored.scene {
            self.load(blob)?;
        }
        if let Some(text) = stored.recognized_text {
            self.set_recognized_text(text);
        }
        Ok(())
    }

    /// Persist the scene through storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or storage fails.
    pub async fn save_to(&self, store: &dyn DocumentStore) -> CanvasResult<()> {
        let blob = self.save()?;
        store
            .save_document(&self.config.document_id, &blob)
            .await
            .inspect_err(|e| {
                self.notifier
                    .notify(Notification::warning(format!("Could not save document: {e}")));
            })?;
        debug!(bytes = blob.len(), "document saved");
        Ok(())
    }
}

/// Shift a text box's center so its top edge stays put after the box grew
/// by `grown` local units.
fn keep_top_edge(transform: &mut Transform, grown: f64) {
    if grown.abs() <= f64::EPSILON {
        return;
    }
    let center = transform.matrix().apply(Point::new(0.0, grown / 2.0));
    transform.x = center.x;
    transform.y = center.y;
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::notify::{CollectingNotifier, Level};

    fn canvas() -> Canvas {
        Canvas::new(CanvasConfig::default(), Size::default()).expect("canvas")
    }

    fn draw(canvas: &mut Canvas, from: (f64, f64), to: (f64, f64)) {
        canvas.pointer_down(Point::new(from.0, from.1));
        canvas.pointer_move(Point::new((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0 + 3.0));
        canvas.pointer_up(Point::new(to.0, to.1));
    }

    fn tiny_png() -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbaImage::from_pixel(8, 4, image::Rgba([10, 20, 30, 255]))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    #[test]
    fn test_new_canvas_starts_in_select_with_one_snapshot() {
        let canvas = canvas();
        assert_eq!(canvas.mode(), Mode::Select);
        assert_eq!(canvas.history().past_len(), 1);
        assert!(canvas.get_scene().is_empty());
        assert_eq!(canvas.cursor(), Cursor::Default);
    }

    #[test]
    fn test_draw_stroke_commits_once() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Draw);
        draw(&mut canvas, (10.0, 10.0), (60.0, 40.0));
        assert_eq!(canvas.get_scene().len(), 1);
        assert_eq!(canvas.history().past_len(), 2);
        assert!(!canvas.is_pressed());
        let stroke = canvas.get_scene().objects().next().expect("stroke");
        assert!(!stroke.selectable);
        assert!(!stroke.evented);
    }

    #[test]
    fn test_brush_applies_to_new_strokes() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Draw);
        canvas.set_brush("#ff0000", 7.0);
        draw(&mut canvas, (10.0, 10.0), (60.0, 40.0));
        let stroke = canvas.get_scene().objects().next().expect("stroke");
        let ObjectKind::Stroke { stroke: style, .. } = &stroke.kind else {
            panic!("expected stroke");
        };
        assert_eq!(style.color, "#ff0000");
        assert!((style.width - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mode_switch_does_not_record() {
        let mut canvas = canvas();
        for mode in Mode::ALL {
            canvas.apply_mode(mode);
        }
        assert_eq!(canvas.history().past_len(), 1);
    }

    #[test]
    fn test_erase_only_while_pressed() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Draw);
        draw(&mut canvas, (10.0, 10.0), (60.0, 40.0));
        canvas.apply_mode(Mode::Erase);

        canvas.pointer_move(Point::new(35.0, 28.0));
        assert_eq!(canvas.get_scene().len(), 1);

        canvas.pointer_down(Point::new(200.0, 200.0));
        canvas.pointer_move(Point::new(35.0, 28.0));
        canvas.pointer_up(Point::new(35.0, 28.0));
        assert!(canvas.get_scene().is_empty());
        assert_eq!(canvas.history().past_len(), 3);
    }

    #[test]
    fn test_pan_drag_shows_grabbing_cursor() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Pan);
        assert_eq!(canvas.cursor(), Cursor::Grab);
        canvas.pointer_down(Point::new(100.0, 100.0));
        assert_eq!(canvas.cursor(), Cursor::Grabbing);
        canvas.pointer_up(Point::new(100.0, 100.0));
        assert_eq!(canvas.cursor(), Cursor::Grab);
    }

    #[test]
    fn test_zoom_is_clamped_and_not_recorded() {
        let mut canvas = canvas();
        canvas.zoom_at(Point::new(400.0, 300.0), 100.0);
        assert!((canvas.get_scene().viewport().zoom - 20.0).abs() < 1e-9);
        canvas.zoom_at(Point::new(400.0, 300.0), 0.001);
        assert!((canvas.get_scene().viewport().zoom - 1.0).abs() < 1e-9);
        assert_eq!(canvas.history().past_len(), 1);
    }

    #[test]
    fn test_text_tool_inserts_once_and_exits_to_select() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Text);
        canvas.pointer_down(Point::new(100.0, 100.0));
        canvas.pointer_up(Point::new(100.0, 100.0));
        let id = canvas.editing().expect("editing");
        assert!(canvas.insert_text("hi"));
        assert!(canvas.insert_newline());
        assert!(canvas.insert_text("there"));
        assert!(canvas.delete_backward());
        assert_eq!(canvas.history().past_len(), 1);

        // Click outside the box finishes the edit
        canvas.pointer_down(Point::new(700.0, 500.0));
        canvas.pointer_up(Point::new(700.0, 500.0));
        assert_eq!(canvas.mode(), Mode::Select);
        assert_eq!(canvas.editing(), None);
        assert_eq!(canvas.get_scene().len(), 1);
        assert_eq!(canvas.history().past_len(), 2);
        let ObjectKind::Textbox { content, .. } = &canvas.get_scene().get_object(id).expect("box").kind
        else {
            panic!("expected textbox");
        };
        assert_eq!(content, "hi\nther");
    }

    #[test]
    fn test_textbox_top_left_at_pointer() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Text);
        canvas.pointer_down(Point::new(120.0, 80.0));
        let id = canvas.editing().expect("editing");
        let bounds = canvas.get_scene().get_object(id).expect("box").bounding_box();
        assert!((bounds.x - 120.0).abs() < 1e-9);
        assert!((bounds.y - 80.0).abs() < 1e-9);
        assert!((bounds.width - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_mode_reapplied_allows_another_insertion() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Text);
        canvas.pointer_down(Point::new(10.0, 10.0));
        canvas.apply_mode(Mode::Text);
        assert_eq!(canvas.editing(), None);
        canvas.pointer_down(Point::new(300.0, 300.0));
        assert!(canvas.editing().is_some());
        assert_eq!(canvas.get_scene().len(), 2);
    }

    #[test]
    fn test_select_drag_moves_and_records_once() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Draw);
        draw(&mut canvas, (10.0, 10.0), (60.0, 40.0));
        canvas.apply_mode(Mode::Select);
        let id = canvas.get_scene().objects().next().expect("stroke").id;
        let before = canvas.get_scene().get_object(id).expect("stroke").transform;

        canvas.pointer_down(Point::new(35.0, 28.0));
        canvas.pointer_move(Point::new(45.0, 38.0));
        canvas.pointer_move(Point::new(55.0, 48.0));
        canvas.pointer_up(Point::new(55.0, 48.0));

        let after = canvas.get_scene().get_object(id).expect("stroke").transform;
        assert!((after.x - before.x - 20.0).abs() < 1e-9);
        assert!((after.y - before.y - 20.0).abs() < 1e-9);
        assert_eq!(canvas.history().past_len(), 3);
    }

    #[test]
    fn test_click_without_drag_records_nothing() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Draw);
        draw(&mut canvas, (10.0, 10.0), (60.0, 40.0));
        canvas.apply_mode(Mode::Select);
        canvas.pointer_down(Point::new(35.0, 28.0));
        canvas.pointer_up(Point::new(35.0, 28.0));
        assert_eq!(canvas.get_scene().selected().len(), 1);
        assert_eq!(canvas.history().past_len(), 2);
    }

    #[test]
    fn test_rubber_band_selects_intersecting() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Draw);
        draw(&mut canvas, (10.0, 10.0), (40.0, 40.0));
        draw(&mut canvas, (300.0, 300.0), (340.0, 340.0));
        canvas.apply_mode(Mode::Select);

        canvas.pointer_down(Point::new(0.0, 0.0));
        canvas.pointer_move(Point::new(50.0, 50.0));
        assert!(canvas.selection_band().is_some());
        canvas.pointer_up(Point::new(50.0, 50.0));
        assert_eq!(canvas.get_scene().selected().len(), 1);
        assert!(canvas.selection_band().is_none());
    }

    #[test]
    fn test_selection_commands_record_one_snapshot_each() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Draw);
        draw(&mut canvas, (10.0, 10.0), (40.0, 40.0));
        canvas.apply_mode(Mode::Select);
        let id = canvas.get_scene().objects().next().expect("stroke").id;
        canvas.select(id).expect("select");

        assert_eq!(canvas.rotate_selected(90.0), 1);
        assert_eq!(canvas.scale_selected(2.0), 1);
        assert_eq!(canvas.flip_selected(Axis::Horizontal), 1);
        assert_eq!(canvas.history().past_len(), 5);

        let t = canvas.get_scene().get_object(id).expect("stroke").transform;
        assert!((t.angle - 90.0).abs() < 1e-9);
        assert!((t.scale_x - 2.0).abs() < 1e-9);
        assert!(t.flip_x);

        assert_eq!(canvas.delete_selected(), 1);
        assert!(canvas.get_scene().is_empty());
        assert_eq!(canvas.history().past_len(), 6);
    }

    #[test]
    fn test_select_rejects_unselectable_mode() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Draw);
        draw(&mut canvas, (10.0, 10.0), (40.0, 40.0));
        let id = canvas.get_scene().objects().next().expect("stroke").id;
        assert!(matches!(canvas.select(id), Err(CanvasError::NotSelectable(_))));
    }

    #[test]
    fn test_undo_redo_fire_commit_hook() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut canvas = canvas();
        let sink = Rc::clone(&seen);
        canvas.set_on_commit(move |doc| sink.borrow_mut().push(doc.objects.len()));

        canvas.apply_mode(Mode::Draw);
        draw(&mut canvas, (10.0, 10.0), (40.0, 40.0));
        assert!(canvas.undo());
        assert!(canvas.redo());
        assert!(!canvas.redo());
        assert_eq!(*seen.borrow(), vec![1, 0, 1]);
    }

    #[test]
    fn test_insert_image_floats_then_places() {
        let mut canvas = canvas();
        let id = canvas.insert_image(&tiny_png()).expect("insert");
        assert_eq!(canvas.pending_placement(), Some(id));
        assert_eq!(canvas.history().past_len(), 1);
        let image = canvas.get_scene().get_object(id).expect("image");
        assert!((image.opacity - 0.5).abs() < 1e-9);
        assert!(!image.evented);
        assert!(!image.selectable);

        assert!(matches!(
            canvas.insert_image(&tiny_png()),
            Err(CanvasError::PlacementPending)
        ));

        canvas.pointer_move(Point::new(200.0, 150.0));
        canvas.pointer_down(Point::new(200.0, 150.0));
        canvas.pointer_up(Point::new(200.0, 150.0));
        let image = canvas.get_scene().get_object(id).expect("image");
        assert!((image.opacity - 1.0).abs() < 1e-9);
        assert!((image.transform.x - 200.0).abs() < 1e-9);
        assert!(image.selectable);
        assert_eq!(canvas.pending_placement(), None);
        assert_eq!(canvas.history().past_len(), 2);
    }

    #[test]
    fn test_insert_garbage_image_notifies() {
        let notes = CollectingNotifier::new();
        let mut canvas = canvas().with_notifier(notes.clone());
        assert!(matches!(
            canvas.insert_image(b"not an image"),
            Err(CanvasError::Image(_))
        ));
        let seen = notes.take();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].level, Level::Error);
        assert!(canvas.get_scene().is_empty());
    }

    #[test]
    fn test_convert_control_hit() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Text);
        canvas.pointer_down(Point::new(100.0, 100.0));
        let id = canvas.editing().expect("editing");
        canvas.insert_text("abc");
        canvas.exit_text_editing();
        canvas.select(id).expect("select");

        let object = canvas.get_scene().get_object(id).expect("box");
        let control = object.control.expect("control attached");
        let rect = control.screen_rect(object, &canvas.get_scene().viewport());
        let outcome = canvas.pointer_down(rect.center());
        assert_eq!(outcome, PointerOutcome::ConvertRequested(id));
    }

    #[test]
    fn test_trigger_conversion_rules() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Draw);
        draw(&mut canvas, (10.0, 10.0), (40.0, 40.0));
        let stroke = canvas.get_scene().objects().next().expect("stroke").id;
        assert!(matches!(
            canvas.trigger_conversion(stroke),
            Err(CanvasError::NotConvertible(_))
        ));
        assert!(matches!(
            canvas.trigger_conversion(ObjectId::new()),
            Err(CanvasError::ObjectNotFound(_))
        ));

        canvas.apply_mode(Mode::Text);
        canvas.pointer_down(Point::new(300.0, 300.0));
        let text = canvas.editing().expect("editing");
        canvas.insert_text("hello");

        let ticket = canvas.trigger_conversion(text).expect("ticket");
        assert_eq!(canvas.editing(), None);
        assert_eq!(
            ticket.request,
            ConversionRequest::Synthesize {
                text: "hello".into()
            }
        );
        assert_eq!(canvas.cursor(), Cursor::Progress);
        assert!(matches!(
            canvas.trigger_conversion(text),
            Err(CanvasError::ConversionPending(_))
        ));
    }

    #[test]
    fn test_corrupt_load_leaves_canvas_untouched() {
        let notes = CollectingNotifier::new();
        let mut canvas = canvas().with_notifier(notes.clone());
        canvas.apply_mode(Mode::Draw);
        draw(&mut canvas, (10.0, 10.0), (40.0, 40.0));
        let before = canvas.document();
        assert!(canvas.load(&SceneBlob::from_bytes(b"{oops".to_vec())).is_err());
        assert_eq!(canvas.document(), before);
        assert_eq!(canvas.history().past_len(), 2);
        assert_eq!(notes.take().len(), 1);
    }

    #[test]
    fn test_load_resets_history_and_restores_viewport() {
        let mut source = canvas();
        source.apply_mode(Mode::Draw);
        draw(&mut source, (10.0, 10.0), (40.0, 40.0));
        source.zoom_at(Point::new(100.0, 100.0), 3.0);
        source.apply_mode(Mode::Select);
        let blob = source.save().expect("save");

        let mut target = canvas();
        target.load(&blob).expect("load");
        assert_eq!(target.document().objects, source.document().objects);
        assert_eq!(target.get_scene().viewport(), source.get_scene().viewport());
        assert_eq!(target.history().past_len(), 1);
        assert!(!target.history().can_undo());
    }
    #[test]
    fn test_inverted_zoom_range_rejected_at_construction() {
        let config = CanvasConfig {
            min_zoom: 5.0,
            max_zoom: 2.0,
            ..CanvasConfig::default()
        };
        assert!(matches!(
            Canvas::new(config, Size::default()),
            Err(CanvasError::Config(_))
        ));
    }

    #[test]
    fn test_load_clamps_degenerate_zoom() {
        let mut source = canvas();
        source.apply_mode(Mode::Draw);
        draw(&mut source, (10.0, 10.0), (40.0, 40.0));
        let blob = source.save().expect("save");
        let mut value: serde_json::Value =
            serde_json::from_slice(blob.as_bytes()).expect("json");
        value["viewport"]["zoom"] = serde_json::json!(0.0);
        let blob = SceneBlob::from_bytes(serde_json::to_vec(&value).expect("encode"));

        let mut target = canvas();
        target.load(&blob).expect("load");
        assert!((target.get_scene().viewport().zoom - 1.0).abs() < 1e-9);

        target.zoom_at(Point::new(400.0, 300.0), 2.0);
        let viewport = target.get_scene().viewport();
        assert!((viewport.zoom - 2.0).abs() < 1e-9);
        assert!(viewport.pan_x.is_finite());
        assert!(viewport.pan_y.is_finite());
    }

    #[test]
    fn test_conversion_finishing_under_floating_image() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Text);
        canvas.pointer_down(Point::new(100.0, 100.0));
        canvas.insert_text("ink");
        let text = canvas.editing().expect("editing");
        let ticket = canvas.trigger_conversion(text).expect("ticket");
        let image = canvas.insert_image(&tiny_png()).expect("insert");

        let ink = SynthesizedInk {
            paths: vec![vec![
                crate::path::PathCommand::MoveTo(Point::new(0.0, 0.0)),
                crate::path::PathCommand::LineTo(Point::new(10.0, 5.0)),
            ]],
        };
        let ids = canvas.finish_conversion(&ticket, Ok(ink)).expect("finish");
        assert_eq!(ids.len(), 1);

        // Still floating: nothing interactive, image untouched
        let floating = canvas.get_scene().get_object(image).expect("image");
        assert!((floating.opacity - 0.5).abs() < 1e-9);
        assert!(canvas
            .get_scene()
            .objects()
            .all(|o| !o.selectable && !o.evented));
        let head = canvas
            .history()
            .current()
            .expect("head")
            .document()
            .expect("document");
        assert_eq!(head.objects.len(), 1);
        assert!(head.objects.iter().all(|o| o.id != image));

        canvas.pointer_down(Point::new(300.0, 300.0));
        canvas.pointer_up(Point::new(300.0, 300.0));
        let head = canvas
            .history()
            .current()
            .expect("head")
            .document()
            .expect("document");
        assert_eq!(head.objects.len(), 2);
        let placed = head
            .objects
            .iter()
            .find(|o| o.id == image)
            .expect("image recorded");
        assert!((placed.opacity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_box_grows_downward() {
        let mut canvas = canvas();
        canvas.apply_mode(Mode::Text);
        canvas.pointer_down(Point::new(120.0, 80.0));
        let id = canvas.editing().expect("editing");
        let top = |canvas: &Canvas| {
            canvas
                .get_scene()
                .get_object(id)
                .expect("box")
                .bounding_box()
        };

        canvas.insert_text("one");
        canvas.insert_newline();
        canvas.insert_text("two");
        canvas.insert_newline();
        let bounds = top(&canvas);
        assert!((bounds.y - 80.0).abs() < 1e-9, "y = {}", bounds.y);
        assert!((bounds.x - 120.0).abs() < 1e-9);
        assert!((bounds.height - 3.0 * 24.0 * crate::element::TEXT_LINE_HEIGHT).abs() < 1e-9);

        canvas.delete_backward();
        assert!((top(&canvas).y - 80.0).abs() < 1e-9);

        canvas.set_text_style(id, 48.0, "#ff0000").expect("style");
        assert!((top(&canvas).y - 80.0).abs() < 1e-9);
    }
}
