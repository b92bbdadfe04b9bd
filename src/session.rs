// ============================================================================
// SESSION CONTROLLER — owns all mutable editing state for one session
// ============================================================================
//
// Everything mutable (source image, checkpoint history, prompt, target
// dimensions, pending adjustments) lives here and is mutated only through
// these methods; the view layer is a pure function of `snapshot()`.
//
// Exactly one operation may be in flight: the `Processing` state is a
// cooperative lock, so every mutating entry point checks it and bails
// instead of relying on a scheduler.

use image::RgbaImage;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::debounce::Debouncer;
use crate::error::EditorError;
use crate::gateway::{AspectRatio, EditGateway, EditRequest};
use crate::history::{Checkpoint, HistoryStore};
use crate::io::{self, ExportFormat, ImageData};
use crate::panel::{AdjustmentPanel, CropSettings, PendingAdjustment};

/// Target dimensions fall back to this after a confirmed reset.
pub const DEFAULT_DIMENSION: u32 = 1024;

/// Checkpoint label for the denoise quick action. Overwrites the prompt
/// field so the UI shows what produced the current view.
pub const DENOISE_LABEL: &str = "Remove Noise (AI)";
/// Checkpoint label for the auto-enhance quick action.
pub const ENHANCE_LABEL: &str = "Auto Enhance (AI)";

/// Fixed, non-user-editable instructions sent to the gateway for the quick
/// actions.
const DENOISE_INSTRUCTION: &str =
    "Remove all noise and grain from this image while preserving fine detail and sharpness.";
const ENHANCE_INSTRUCTION: &str = "Automatically enhance this image: balance exposure and color, \
     recover shadow and highlight detail, and improve overall clarity. Keep the result natural.";

/// Quiet period before a burst of width/height edits commits.
const DIMENSION_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No source image selected.
    Idle,
    /// Source set, no checkpoint currently selected.
    ReadyToEdit,
    /// A gateway call or bake is in flight; mutating controls are gated.
    Processing,
    /// A checkpoint is available and selected.
    Complete,
    /// The last operation failed; prior checkpoints remain selectable.
    Error,
}

/// The user's uploaded (or crop-accepted) image. Replaced wholesale —
/// never mutated — and replacing it invalidates all prior checkpoints.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub image: ImageData,
    /// Decoded natural dimensions, `None` when the probe failed.
    pub natural_size: Option<(u32, u32)>,
}

/// Immutable snapshot for the view layer. `can_undo`/`can_redo` are already
/// gated on `busy`, so they map directly onto control enablement.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub state: SessionState,
    pub prompt: String,
    pub error: Option<String>,
    pub busy: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    pub has_source: bool,
    pub target_width: u32,
    pub target_height: u32,
    pub reset_pending: bool,
    pub checkpoint_count: usize,
    pub cursor: isize,
    pub current_label: Option<String>,
    pub has_active_adjustments: bool,
}

/// Encoded bytes plus naming metadata for a client-side save action.
#[derive(Debug, Clone)]
pub struct ExportPayload {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// An in-flight remote edit, detached from the controller.
///
/// Produced by the `begin_*` methods: it owns a clone of the base payload
/// and a handle to the gateway, so the controller stays free while the call
/// runs and `snapshot()` can report `busy == true` in the meantime. Feed
/// the outcome back through [`SessionController::finish_edit`].
pub struct EditCall {
    gateway: Arc<dyn EditGateway>,
    base: ImageData,
    instruction: String,
    aspect_ratio: AspectRatio,
    width: u32,
    height: u32,
}

impl EditCall {
    /// One round trip: base image → gateway → resample to the exact target
    /// dimensions (the service only honors a coarse ratio bucket) →
    /// re-encoded payload.
    pub async fn run(self) -> Result<ImageData, EditorError> {
        let request = EditRequest {
            image: &self.base,
            instruction: &self.instruction,
            aspect_ratio: self.aspect_ratio,
        };
        let result = self.gateway.edit(request).await?;
        let pixels = result.decode()?;
        let resampled = crate::ops::transform::resample(&pixels, self.width, self.height);
        ImageData::from_rgba(&resampled)
    }
}

pub struct SessionController {
    gateway: Arc<dyn EditGateway>,
    state: SessionState,
    source: Option<SourceImage>,
    history: HistoryStore,
    panel: AdjustmentPanel,
    prompt: String,
    /// Last prompt the *user* typed, restored when undo steps past the
    /// first checkpoint. Quick actions overwrite `prompt` but not this.
    last_user_prompt: String,
    /// Label for the checkpoint the in-flight edit will produce; `Some`
    /// exactly while `Processing`.
    pending_label: Option<String>,
    target_width: u32,
    target_height: u32,
    dimension_batch: Debouncer<(u32, u32)>,
    error: Option<String>,
    reset_requested: bool,
}

impl SessionController {
    pub fn new(gateway: Box<dyn EditGateway>) -> Self {
        Self {
            gateway: Arc::from(gateway),
            state: SessionState::Idle,
            source: None,
            history: HistoryStore::new(),
            panel: AdjustmentPanel::default(),
            prompt: String::new(),
            last_user_prompt: String::new(),
            pending_label: None,
            target_width: DEFAULT_DIMENSION,
            target_height: DEFAULT_DIMENSION,
            dimension_batch: Debouncer::new(DIMENSION_DEBOUNCE),
            error: None,
            reset_requested: false,
        }
    }

    // ------------------------------------------------------------------
    //  Source ingestion
    // ------------------------------------------------------------------

    /// Replace the source image. Valid from any state; clears the history,
    /// the prompt, and any error, and adopts the image's natural size as
    /// the target dimensions once decoded (current values persist if the
    /// probe fails).
    pub fn select_source(&mut self, bytes: Vec<u8>, mime: impl Into<String>) {
        let natural_size = match io::probe_dimensions(&bytes) {
            Ok((w, h)) => {
                self.target_width = w;
                self.target_height = h;
                Some((w, h))
            }
            Err(e) => {
                log::warn!("could not read source dimensions, keeping current: {}", e);
                None
            }
        };
        self.source = Some(SourceImage {
            image: ImageData::new(bytes, mime),
            natural_size,
        });
        self.history.reset();
        self.panel.reset();
        self.prompt.clear();
        self.last_user_prompt.clear();
        self.pending_label = None;
        self.error = None;
        self.reset_requested = false;
        self.dimension_batch.clear();
        self.state = SessionState::ReadyToEdit;
        log::info!("source image selected ({:?})", natural_size);
    }

    /// Accept cropped pixels from the host's crop UI. The crop result
    /// replaces the source wholesale, so this behaves like a fresh upload
    /// (prior checkpoints are invalidated). Gated while processing.
    pub fn accept_crop(&mut self, bytes: Vec<u8>, mime: impl Into<String>) {
        if self.is_processing() {
            return;
        }
        self.select_source(bytes, mime);
    }

    // ------------------------------------------------------------------
    //  Prompt & target dimensions
    // ------------------------------------------------------------------

    pub fn set_prompt(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.last_user_prompt = text.clone();
        self.prompt = text;
    }

    /// Stage a dimension edit. Rapid edits coalesce into one pending batch
    /// that commits after a quiet period (`tick`) or immediately before any
    /// quick action.
    pub fn set_target_dimensions(&mut self, width: u32, height: u32, now: Instant) {
        if self.is_processing() {
            return;
        }
        self.dimension_batch.submit((width.max(1), height.max(1)), now);
    }

    /// Drive the debounce clock; hosts call this from their frame loop.
    pub fn tick(&mut self, now: Instant) {
        if let Some((w, h)) = self.dimension_batch.poll(now) {
            self.target_width = w;
            self.target_height = h;
        }
    }

    /// Set the target dimensions from a ratio preset, keeping the current
    /// width. Presets are actions, not keystrokes, so any pending dimension
    /// batch commits first.
    pub fn apply_aspect_preset(&mut self, ratio: AspectRatio) {
        if self.is_processing() {
            return;
        }
        self.commit_pending_dimensions();
        self.target_height = ((self.target_width as f64 / ratio.value()).round() as u32).max(1);
    }

    fn commit_pending_dimensions(&mut self) {
        if let Some((w, h)) = self.dimension_batch.flush() {
            self.target_width = w;
            self.target_height = h;
        }
    }

    // ------------------------------------------------------------------
    //  Remote edits
    // ------------------------------------------------------------------

    /// Send the current prompt to the edit service. Silent no-op on a blank
    /// prompt (the button is disabled upstream) or outside an editable
    /// state.
    pub async fn request_generate(&mut self) {
        if let Some(call) = self.begin_generate() {
            let outcome = call.run().await;
            self.finish_edit(outcome);
        }
    }

    /// Quick action: denoise the currently viewed image with a fixed
    /// instruction. The resulting checkpoint is labeled `DENOISE_LABEL`.
    pub async fn request_denoise(&mut self) {
        if let Some(call) = self.begin_denoise() {
            let outcome = call.run().await;
            self.finish_edit(outcome);
        }
    }

    /// Quick action: auto-enhance the currently viewed image.
    pub async fn request_auto_enhance(&mut self) {
        if let Some(call) = self.begin_auto_enhance() {
            let outcome = call.run().await;
            self.finish_edit(outcome);
        }
    }

    /// Start a prompt edit and enter `Processing` without blocking the
    /// controller: the returned [`EditCall`] runs independently, so the
    /// host can keep rendering snapshots (with `busy == true` and the
    /// mutating controls gated) until it feeds the outcome back through
    /// [`finish_edit`](Self::finish_edit). `None` when the session is not
    /// in an editable state or the prompt is blank.
    pub fn begin_generate(&mut self) -> Option<EditCall> {
        if !self.can_start_edit() {
            return None;
        }
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            log::debug!("blank prompt, ignoring generate request");
            return None;
        }
        self.begin_edit(prompt.clone(), prompt)
    }

    pub fn begin_denoise(&mut self) -> Option<EditCall> {
        if !self.can_start_edit() {
            return None;
        }
        self.begin_edit(DENOISE_INSTRUCTION.to_string(), DENOISE_LABEL.to_string())
    }

    pub fn begin_auto_enhance(&mut self) -> Option<EditCall> {
        if !self.can_start_edit() {
            return None;
        }
        self.begin_edit(ENHANCE_INSTRUCTION.to_string(), ENHANCE_LABEL.to_string())
    }

    fn can_start_edit(&self) -> bool {
        matches!(
            self.state,
            SessionState::ReadyToEdit | SessionState::Complete | SessionState::Error
        ) && self.source.is_some()
    }

    fn begin_edit(&mut self, instruction: String, label: String) -> Option<EditCall> {
        let base = self.current_view_image()?.clone();
        self.commit_pending_dimensions();
        self.state = SessionState::Processing;
        self.error = None;
        self.pending_label = Some(label);
        Some(EditCall {
            gateway: Arc::clone(&self.gateway),
            base,
            instruction,
            aspect_ratio: AspectRatio::closest(self.target_width, self.target_height),
            width: self.target_width,
            height: self.target_height,
        })
    }

    /// Resolve the in-flight edit: append a checkpoint on success, or move
    /// to the `Error` state with the failure message. Either way the
    /// cooperative lock is released. Ignored when nothing is in flight.
    pub fn finish_edit(&mut self, outcome: Result<ImageData, EditorError>) {
        if !self.is_processing() {
            log::warn!("finish_edit without an in-flight edit, ignoring");
            return;
        }
        let label = self.pending_label.take().unwrap_or_default();
        match outcome {
            Ok(image) => {
                self.history.append(Checkpoint::new(
                    image,
                    label.clone(),
                    self.target_width,
                    self.target_height,
                ));
                // The prompt field always shows what produced the current
                // view; for a user prompt this is the text itself.
                self.prompt = label;
                self.panel.reset();
                self.state = SessionState::Complete;
                log::info!("checkpoint {} appended", self.history.cursor());
            }
            Err(e) => {
                log::error!("edit failed: {}", e);
                self.error = Some(e.to_string());
                self.state = SessionState::Error;
            }
        }
    }

    // ------------------------------------------------------------------
    //  Undo / redo
    // ------------------------------------------------------------------

    /// Step back one checkpoint, restoring the prompt and target dimensions
    /// stored on the checkpoint that becomes current. Stepping past the
    /// first checkpoint shows the unedited source again and restores the
    /// last user-typed prompt.
    pub fn undo(&mut self) {
        if self.is_processing() || !self.history.can_undo() {
            return;
        }
        match self.history.undo() {
            Some(cp) => {
                self.prompt = cp.label.clone();
                self.target_width = cp.width;
                self.target_height = cp.height;
                self.state = SessionState::Complete;
            }
            None => {
                self.prompt = self.last_user_prompt.clone();
                self.state = SessionState::ReadyToEdit;
            }
        }
        self.error = None;
        self.dimension_batch.clear();
        self.panel.reset();
    }

    pub fn redo(&mut self) {
        if self.is_processing() || !self.history.can_redo() {
            return;
        }
        if let Some(cp) = self.history.redo() {
            self.prompt = cp.label.clone();
            self.target_width = cp.width;
            self.target_height = cp.height;
            self.state = SessionState::Complete;
        }
        self.error = None;
        self.dimension_batch.clear();
        self.panel.reset();
    }

    // ------------------------------------------------------------------
    //  Local adjustments
    // ------------------------------------------------------------------

    /// Replace the pending adjustment parameters (slider commit).
    pub fn set_adjustments(&mut self, params: PendingAdjustment) {
        self.panel.set_params(params);
    }

    pub fn set_crop_settings(&mut self, crop: CropSettings) {
        self.panel.set_crop(crop);
    }

    pub fn rotate_adjustment_cw(&mut self) {
        self.panel.rotate_cw();
    }

    pub fn rotate_adjustment_ccw(&mut self) {
        self.panel.rotate_ccw();
    }

    /// Live preview of the current view with pending adjustments applied.
    pub fn preview(&self) -> Result<RgbaImage, EditorError> {
        let base = self
            .current_view_image()
            .ok_or(EditorError::NoSource)?
            .decode()?;
        Ok(self.panel.preview(&base))
    }

    /// Bake the pending adjustments into a new checkpoint: one compositor
    /// pass over the selected checkpoint, then append. No-op when nothing
    /// deviates from neutral or when no checkpoint is selected.
    pub fn bake_adjustments(&mut self) {
        if self.is_processing() || !self.panel.has_active_adjustments() {
            return;
        }
        let Some(current) = self.history.current() else {
            log::warn!("bake requires a selected checkpoint, ignoring");
            return;
        };
        let base = match current.image.decode() {
            Ok(pixels) => pixels,
            Err(e) => {
                log::error!("bake decode failed: {}", e);
                self.error = Some(e.to_string());
                self.state = SessionState::Error;
                return;
            }
        };
        if let Some(baked) = self.panel.bake(&base) {
            self.bake_local_adjustment(baked);
        }
    }

    /// Append already-composited pixels as a new checkpoint. Baking does
    /// not change provenance: the new checkpoint carries the same label and
    /// target dimensions as the currently selected one.
    pub fn bake_local_adjustment(&mut self, pixels: RgbaImage) {
        if self.is_processing() {
            return;
        }
        let Some(current) = self.history.current() else {
            log::warn!("bake requires a selected checkpoint, ignoring");
            return;
        };
        let (label, width, height) = (current.label.clone(), current.width, current.height);
        match ImageData::from_rgba(&pixels) {
            Ok(image) => {
                self.history.append(Checkpoint::new(image, label, width, height));
                self.panel.reset();
                self.error = None;
                self.state = SessionState::Complete;
            }
            Err(e) => {
                log::error!("bake encode failed: {}", e);
                self.error = Some(e.to_string());
                self.state = SessionState::Error;
            }
        }
    }

    // ------------------------------------------------------------------
    //  Reset (two-phase)
    // ------------------------------------------------------------------

    /// Raise the confirmation gate. Mutates nothing else — the destructive
    /// clear happens only in `confirm_reset`.
    pub fn request_reset(&mut self) {
        if self.is_processing() {
            return;
        }
        self.reset_requested = true;
    }

    pub fn cancel_reset(&mut self) {
        self.reset_requested = false;
    }

    /// Clear the whole session: source, history, prompt, error, and target
    /// dimensions back to the `DEFAULT_DIMENSION` square. Ignored unless a
    /// reset was explicitly requested first.
    pub fn confirm_reset(&mut self) {
        if !self.reset_requested {
            log::warn!("confirm_reset without a pending request, ignoring");
            return;
        }
        self.source = None;
        self.history.reset();
        self.panel.reset();
        self.prompt.clear();
        self.last_user_prompt.clear();
        self.pending_label = None;
        self.target_width = DEFAULT_DIMENSION;
        self.target_height = DEFAULT_DIMENSION;
        self.error = None;
        self.reset_requested = false;
        self.dimension_batch.clear();
        self.state = SessionState::Idle;
        log::info!("session reset");
    }

    // ------------------------------------------------------------------
    //  Export
    // ------------------------------------------------------------------

    /// Composite the current view (including pending adjustments) and
    /// encode it for a client-side save.
    pub fn export(&self, format: ExportFormat, quality: u8) -> Result<ExportPayload, EditorError> {
        let composed = self.preview()?;
        let bytes = io::export_encode(&composed, format, quality)?;
        Ok(ExportPayload {
            file_name: io::export_file_name(format),
            mime: format.mime(),
            bytes,
        })
    }

    // ------------------------------------------------------------------
    //  Derived view
    // ------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_processing(&self) -> bool {
        self.state == SessionState::Processing
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn reset_pending(&self) -> bool {
        self.reset_requested
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn panel(&self) -> &AdjustmentPanel {
        &self.panel
    }

    /// Committed target width, or the staged value while a dimension batch
    /// is pending (the view shows the live value either way).
    pub fn target_width(&self) -> u32 {
        self.dimension_batch
            .pending()
            .map(|&(w, _)| w)
            .unwrap_or(self.target_width)
    }

    pub fn target_height(&self) -> u32 {
        self.dimension_batch
            .pending()
            .map(|&(_, h)| h)
            .unwrap_or(self.target_height)
    }

    /// The image the user is looking at: the selected checkpoint, or the
    /// unedited source at cursor -1. Quick actions (denoise/enhance) use
    /// this as their base as well.
    pub fn current_view_image(&self) -> Option<&ImageData> {
        self.history
            .current()
            .map(|cp| &cp.image)
            .or_else(|| self.source.as_ref().map(|s| &s.image))
    }

    pub fn snapshot(&self) -> ViewState {
        let busy = self.is_processing();
        ViewState {
            state: self.state,
            prompt: self.prompt.clone(),
            error: self.error.clone(),
            busy,
            can_undo: !busy && self.history.can_undo(),
            can_redo: !busy && self.history.can_redo(),
            has_source: self.source.is_some(),
            target_width: self.target_width(),
            target_height: self.target_height(),
            reset_pending: self.reset_requested,
            checkpoint_count: self.history.len(),
            cursor: self.history.cursor(),
            current_label: self.history.current().map(|cp| cp.label.clone()),
            has_active_adjustments: self.panel.has_active_adjustments(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;
    use futures::future::BoxFuture;

    /// Gateway that must never be reached in these tests.
    struct UnreachableGateway;

    impl EditGateway for UnreachableGateway {
        fn edit<'a>(
            &'a self,
            _: EditRequest<'a>,
        ) -> BoxFuture<'a, Result<ImageData, GatewayError>> {
            panic!("gateway must not be called");
        }
    }

    fn controller() -> SessionController {
        SessionController::new(Box::new(UnreachableGateway))
    }

    fn png_source() -> Vec<u8> {
        let img = image::RgbaImage::new(640, 480);
        crate::io::encode_png(&img).unwrap()
    }

    #[test]
    fn starts_idle_with_default_dimensions() {
        let c = controller();
        assert_eq!(c.state(), SessionState::Idle);
        assert_eq!(c.target_width(), DEFAULT_DIMENSION);
        assert_eq!(c.target_height(), DEFAULT_DIMENSION);
    }

    #[test]
    fn select_source_adopts_natural_dimensions() {
        let mut c = controller();
        c.select_source(png_source(), io::MIME_PNG);
        assert_eq!(c.state(), SessionState::ReadyToEdit);
        assert_eq!((c.target_width(), c.target_height()), (640, 480));
    }

    #[test]
    fn unreadable_source_keeps_current_dimensions() {
        let mut c = controller();
        c.select_source(vec![0, 1, 2, 3], io::MIME_PNG);
        assert_eq!(c.state(), SessionState::ReadyToEdit);
        assert_eq!((c.target_width(), c.target_height()), (1024, 1024));
    }

    #[test]
    fn dimension_edits_commit_after_the_quiet_period() {
        let mut c = controller();
        let t0 = Instant::now();
        c.set_target_dimensions(800, 600, t0);
        // Staged immediately for the view, not yet committed.
        assert_eq!((c.target_width(), c.target_height()), (800, 600));
        c.tick(t0 + Duration::from_millis(100));
        c.set_target_dimensions(801, 601, t0 + Duration::from_millis(200));
        c.tick(t0 + Duration::from_millis(800));
        assert_eq!((c.target_width(), c.target_height()), (801, 601));
    }

    #[test]
    fn aspect_preset_flushes_the_batch_and_derives_height() {
        let mut c = controller();
        c.set_target_dimensions(1600, 1600, Instant::now());
        c.apply_aspect_preset(AspectRatio::Landscape16x9);
        assert_eq!((c.target_width(), c.target_height()), (1600, 900));
    }

    #[test]
    fn request_reset_alone_mutates_nothing() {
        let mut c = controller();
        c.select_source(png_source(), io::MIME_PNG);
        c.set_prompt("sunset glow");
        c.request_reset();
        assert!(c.reset_pending());
        assert_eq!(c.state(), SessionState::ReadyToEdit);
        assert_eq!(c.prompt(), "sunset glow");
        assert!(c.source().is_some());
    }

    #[test]
    fn cancel_reset_lowers_the_gate() {
        let mut c = controller();
        c.request_reset();
        c.cancel_reset();
        c.confirm_reset();
        // Confirm without a pending request is ignored.
        assert_eq!(c.state(), SessionState::Idle);
        c.select_source(png_source(), io::MIME_PNG);
        c.confirm_reset();
        assert_eq!(c.state(), SessionState::ReadyToEdit);
    }

    #[test]
    fn confirmed_reset_restores_defaults() {
        let mut c = controller();
        c.select_source(png_source(), io::MIME_PNG);
        c.set_prompt("make it rain");
        c.request_reset();
        c.confirm_reset();
        assert_eq!(c.state(), SessionState::Idle);
        assert!(c.source().is_none());
        assert!(c.history().is_empty());
        assert_eq!(c.prompt(), "");
        assert_eq!((c.target_width(), c.target_height()), (1024, 1024));
        assert!(!c.reset_pending());
    }

    #[test]
    fn undo_redo_are_no_ops_with_empty_history() {
        let mut c = controller();
        c.select_source(png_source(), io::MIME_PNG);
        c.undo();
        c.redo();
        assert_eq!(c.state(), SessionState::ReadyToEdit);
    }

    #[test]
    fn bake_without_a_selected_checkpoint_is_ignored() {
        let mut c = controller();
        c.select_source(png_source(), io::MIME_PNG);
        c.set_adjustments(PendingAdjustment {
            sepia: 50.0,
            ..PendingAdjustment::default()
        });
        c.bake_adjustments();
        assert!(c.history().is_empty());
        // The panel keeps its pending values; nothing was consumed.
        assert!(c.panel().has_active_adjustments());
    }

    #[test]
    fn snapshot_reflects_controller_state() {
        let mut c = controller();
        c.select_source(png_source(), io::MIME_PNG);
        c.set_prompt("soft film look");
        let view = c.snapshot();
        assert_eq!(view.state, SessionState::ReadyToEdit);
        assert_eq!(view.prompt, "soft film look");
        assert!(view.has_source);
        assert!(!view.can_undo);
        assert!(!view.busy);
        assert_eq!(view.cursor, -1);
        assert_eq!(view.current_label, None);
    }

    #[test]
    fn processing_is_observable_between_begin_and_finish() {
        let mut c = controller();
        c.select_source(png_source(), io::MIME_PNG);
        c.set_prompt("blue hour");

        let call = c.begin_generate().expect("edit should start");
        assert_eq!(c.state(), SessionState::Processing);
        let view = c.snapshot();
        assert!(view.busy);
        assert!(!view.can_undo);
        assert!(!view.can_redo);

        // A second edit cannot start while one is in flight.
        assert!(c.begin_generate().is_none());
        drop(call);

        let image = ImageData::from_rgba(&image::RgbaImage::new(640, 480)).unwrap();
        c.finish_edit(Ok(image));
        assert_eq!(c.state(), SessionState::Complete);
        assert!(!c.snapshot().busy);
        assert_eq!(c.history().current().unwrap().label, "blue hour");
    }

    #[test]
    fn mutating_controls_are_gated_while_processing() {
        let mut c = controller();
        c.select_source(png_source(), io::MIME_PNG);
        c.set_prompt("frost");
        let call = c.begin_generate().unwrap();

        c.undo();
        c.redo();
        c.request_reset();
        c.set_target_dimensions(32, 32, Instant::now());
        c.accept_crop(png_source(), io::MIME_PNG);
        assert_eq!(c.state(), SessionState::Processing);
        assert!(!c.reset_pending());
        assert_eq!((c.target_width(), c.target_height()), (640, 480));
        assert!(c.history().is_empty());
        drop(call);

        c.finish_edit(Err(EditorError::NoSource));
        assert_eq!(c.state(), SessionState::Error);
    }

    #[test]
    fn finish_without_an_in_flight_edit_is_ignored() {
        let mut c = controller();
        c.select_source(png_source(), io::MIME_PNG);
        let image = ImageData::from_rgba(&image::RgbaImage::new(4, 4)).unwrap();
        c.finish_edit(Ok(image));
        assert_eq!(c.state(), SessionState::ReadyToEdit);
        assert!(c.history().is_empty());
    }

    #[test]
    fn failed_edit_releases_the_lock_and_keeps_the_error() {
        let mut c = controller();
        c.select_source(png_source(), io::MIME_PNG);
        c.set_prompt("grain");
        let call = c.begin_generate().unwrap();
        drop(call);
        c.finish_edit(Err(EditorError::Gateway(GatewayError::new("quota exceeded"))));
        assert_eq!(c.state(), SessionState::Error);
        assert_eq!(c.error(), Some("quota exceeded"));
        // The session is editable again.
        assert!(c.begin_generate().is_some());
    }

    #[test]
    fn export_without_a_source_fails_cleanly() {
        let c = controller();
        assert!(matches!(
            c.export(ExportFormat::Png, 100),
            Err(EditorError::NoSource)
        ));
    }

    #[test]
    fn export_encodes_the_current_view() {
        let mut c = controller();
        c.select_source(png_source(), io::MIME_PNG);
        let payload = c.export(ExportFormat::Jpeg, 85).unwrap();
        assert_eq!(payload.mime, io::MIME_JPEG);
        assert!(payload.file_name.ends_with(".jpg"));
        let decoded = image::load_from_memory(&payload.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (640, 480));
    }
}
