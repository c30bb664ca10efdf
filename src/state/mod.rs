/// State management module
///
/// This module holds all application state:
/// - Incident records and coordinates (data.rs)
/// - Map regions and the refetch threshold (region.rs)
/// - The transient report draft (draft.rs)
/// - The screen-level session driving the UI (session.rs)

pub mod data;
pub mod draft;
pub mod region;
pub mod session;
