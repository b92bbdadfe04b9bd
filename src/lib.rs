//! promptshop — the edit-history core of a prompt-driven image editor.
//!
//! A user uploads a photo, issues natural-language edit instructions that a
//! remote generative service fulfils, and reviews the results. This crate
//! owns the part with real state: every remote result becomes an immutable
//! checkpoint in a linear undo/redo timeline, reversible local transforms
//! (color filters, rotation, crop) layer on top without mutating any
//! checkpoint, and a session controller reconciles the two on every apply,
//! undo, redo, and export.
//!
//! The host application supplies the thin I/O around it: file picking,
//! layout, the interactive crop rectangle, and an [`EditGateway`]
//! implementation wrapping the actual network call.
//!
//! All state is in-memory for one session; an explicit, confirmed reset
//! discards it.

pub mod debounce;
pub mod error;
pub mod gateway;
pub mod history;
pub mod io;
pub mod ops;
pub mod panel;
pub mod session;

pub use error::EditorError;
pub use gateway::{AspectRatio, EditGateway, EditRequest, GatewayError, TimeoutGateway};
pub use history::{Checkpoint, HistoryStore};
pub use io::{ExportFormat, ImageData};
pub use panel::{AdjustmentPanel, CropSettings, PendingAdjustment};
pub use session::{
    EditCall, ExportPayload, SessionController, SessionState, SourceImage, ViewState,
};
