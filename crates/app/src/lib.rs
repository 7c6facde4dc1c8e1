//! # config-console-app
//!
//! The config editor: session state, section controller, import/export, and
//! status notifications.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod import_export;
pub mod section_controller;
pub mod session;
pub mod status;

pub use import_export::{ExportView, ImportReport};
pub use section_controller::{ConfigEditor, ConfigEditorDeps, SaveReport, connectivity_text};
pub use session::{EditMode, LoadPhase, SessionState};
pub use status::{DEFAULT_TOAST_TTL, Status, StatusLevel, StatusNotifier, Toast};

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
