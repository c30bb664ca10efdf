/// View state for the map screen
///
/// `Session` owns every piece of mutable UI state. The iced `update`
/// function translates messages into calls on this type and turns the
/// returned values into background tasks, so all of the decision logic
/// here can be tested without a running UI.
use std::path::{Path, PathBuf};

use tracing::debug;

use super::data::{Coordinate, Event};
use super::draft::{Draft, ReportSubmission};
use super::region::Region;
use crate::config::Config;
use crate::error::user_message;

/// Identifies one event fetch so late responses can be recognised
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchTicket {
    pub id: u64,
    pub at: Coordinate,
}

/// What happened to a finished fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Events were replaced
    Applied,
    /// Prior events kept, error shown
    Failed,
    /// A newer fetch was started; the response was dropped
    Stale,
}

/// Identifies one geocode request; only the newest one may move the map
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTicket {
    pub id: u64,
    pub query: String,
}

/// What the refresh button should do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshPlan {
    /// Re-read the device position, then fetch there
    Relocate,
    /// Fetch at the committed region
    FetchAt(Coordinate),
}

#[derive(Debug, Clone)]
pub struct Session {
    /// Region the last fetch was issued for
    pub region: Region,
    /// Region currently drawn; follows every pan and zoom
    pub viewport: Region,
    /// Last known device position
    pub current_location: Option<Coordinate>,
    pub events: Vec<Event>,
    pub loading: bool,
    /// Inline error line under the search bar
    pub error: Option<String>,
    /// Dismissable banner replacing blocking alerts
    pub notice: Option<String>,
    pub permission_granted: bool,
    /// Capture/gallery sheet visibility
    pub sheet_open: bool,
    /// Floating "+" button visibility
    pub button_visible: bool,
    /// Open report form, if any
    pub draft: Option<Draft>,
    refresh_threshold: f64,
    default_delta: f64,
    latest_ticket: u64,
    latest_search: u64,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        let region = config.default_region();
        Self {
            region,
            viewport: region,
            current_location: None,
            events: Vec::new(),
            loading: false,
            error: None,
            notice: None,
            permission_granted: false,
            sheet_open: false,
            button_visible: true,
            draft: None,
            refresh_threshold: config.map.refresh_threshold,
            default_delta: config.map.default_delta,
            latest_ticket: 0,
            latest_search: 0,
        }
    }

    // ========== Fetching ==========

    /// Start a fetch at `at`; only the newest ticket's response is applied
    pub fn begin_fetch(&mut self, at: Coordinate) -> FetchTicket {
        self.latest_ticket += 1;
        self.loading = true;
        self.error = None;
        FetchTicket {
            id: self.latest_ticket,
            at,
        }
    }

    /// Apply a fetch result. `None` means the request failed.
    pub fn finish_fetch(&mut self, ticket: u64, events: Option<Vec<Event>>) -> FetchOutcome {
        if ticket != self.latest_ticket {
            debug!(ticket, latest = self.latest_ticket, "dropping stale fetch response");
            return FetchOutcome::Stale;
        }

        self.loading = false;
        match events {
            Some(events) => {
                self.events = events;
                FetchOutcome::Applied
            }
            None => {
                self.error = Some(user_message::FETCH_FAILED.to_string());
                FetchOutcome::Failed
            }
        }
    }

    // ========== Map ==========

    /// Move the drawn map while a drag is in progress
    pub fn pan_viewport(&mut self, d_latitude: f64, d_longitude: f64) {
        self.viewport = self.viewport.panned(d_latitude, d_longitude);
    }

    /// The map settled on `new`. Returns where to fetch when the center
    /// moved past the refresh threshold since the last commit.
    pub fn region_change_complete(&mut self, new: Region) -> Option<Coordinate> {
        self.viewport = new;
        if new.moved_beyond(&self.region, self.refresh_threshold) {
            self.region = new;
            Some(new.center())
        } else {
            None
        }
    }

    fn recenter(&mut self, center: Coordinate) {
        self.region = Region::centered(center, self.default_delta);
        self.viewport = self.region;
    }

    // ========== Location ==========

    pub fn permission_resolved(&mut self, granted: bool) {
        self.permission_granted = granted;
        if !granted {
            self.error = Some(user_message::PERMISSION_DENIED.to_string());
        }
    }

    /// A device position arrived. Returns where to fetch: always when
    /// `always_fetch` is set, otherwise only if the map moved meaningfully.
    pub fn location_resolved(
        &mut self,
        position: Coordinate,
        always_fetch: bool,
    ) -> Option<Coordinate> {
        let previous = self.region;
        self.recenter(position);
        self.current_location = Some(position);
        self.error = None;

        if always_fetch || self.region.moved_beyond(&previous, self.refresh_threshold) {
            Some(position)
        } else {
            None
        }
    }

    /// A permission check and position read finished. Returns where to fetch.
    /// A refresh still fetches, at the committed region, when no position
    /// could be read.
    pub fn location_report(
        &mut self,
        granted: bool,
        position: Option<Coordinate>,
        refresh: bool,
    ) -> Option<Coordinate> {
        self.permission_resolved(granted);
        match position {
            Some(position) => self.location_resolved(position, refresh),
            None if refresh => Some(self.region.center()),
            None => None,
        }
    }

    pub fn refresh(&self) -> RefreshPlan {
        if self.permission_granted {
            RefreshPlan::Relocate
        } else {
            RefreshPlan::FetchAt(self.region.center())
        }
    }

    // ========== Search ==========

    /// Returns the query to geocode, or None (with a notice) when it is blank
    pub fn begin_search(&mut self, query: &str) -> Option<SearchTicket> {
        let query = query.trim();
        if query.is_empty() {
            self.notice = Some(user_message::EMPTY_SEARCH.to_string());
            return None;
        }
        self.latest_search += 1;
        self.loading = true;
        Some(SearchTicket {
            id: self.latest_search,
            query: query.to_string(),
        })
    }

    /// A geocode answered. Returns where to fetch, or None when a newer
    /// search has been started since.
    pub fn search_resolved(&mut self, ticket: u64, center: Coordinate) -> Option<Coordinate> {
        if ticket != self.latest_search {
            debug!(ticket, latest = self.latest_search, "dropping stale geocode response");
            return None;
        }
        self.recenter(center);
        Some(center)
    }

    pub fn search_failed(&mut self, ticket: u64) {
        if ticket != self.latest_search {
            return;
        }
        self.error = Some(user_message::GEOCODE_FAILED.to_string());
        self.loading = false;
    }

    // ========== Capture ==========

    pub fn open_sheet(&mut self) {
        self.sheet_open = true;
        self.button_visible = false;
    }

    pub fn cancel_sheet(&mut self) {
        self.sheet_open = false;
        self.button_visible = true;
    }

    /// The picker returned. `None` means the user backed out of it.
    pub fn media_picked(&mut self, media: Option<PathBuf>) {
        self.sheet_open = false;
        match media {
            Some(path) => self.draft = Some(Draft::with_media(path)),
            None => self.button_visible = self.draft.is_none(),
        }
    }

    pub fn capture_failed(&mut self, message: &str) {
        self.notice = Some(message.to_string());
        self.cancel_sheet();
    }

    /// Attach a preview if the draft still refers to the same media
    pub fn preview_ready(&mut self, media: &Path, preview: PathBuf) {
        if let Some(draft) = self.draft.as_mut() {
            if draft.media.as_deref() == Some(media) {
                draft.preview = Some(preview);
            }
        }
    }

    // ========== Form ==========

    pub fn set_title(&mut self, title: String) {
        if let Some(draft) = self.draft.as_mut() {
            draft.title = title;
        }
    }

    pub fn set_tags(&mut self, tags: String) {
        if let Some(draft) = self.draft.as_mut() {
            draft.tags = tags;
        }
    }

    pub fn close_form(&mut self) {
        self.draft = None;
        self.button_visible = true;
    }

    /// Reports go to the device position when known, else the map center
    pub fn report_target(&self) -> Coordinate {
        self.current_location.unwrap_or_else(|| self.region.center())
    }

    /// Validate the draft and mark it in flight. Returns None when there
    /// is nothing to send, a send is already running, or a field is blank.
    pub fn begin_submit(&mut self) -> Option<ReportSubmission> {
        let target = self.report_target();
        let draft = self.draft.as_mut()?;
        if draft.submitting {
            return None;
        }

        match draft.submission(target) {
            Some(submission) => {
                draft.submitting = true;
                Some(submission)
            }
            None => {
                self.notice = Some(user_message::EMPTY_FIELDS.to_string());
                None
            }
        }
    }

    pub fn submit_finished(&mut self, success: bool) {
        if let Some(draft) = self.draft.as_mut() {
            draft.submitting = false;
        }

        if success {
            self.notice = Some(user_message::UPLOAD_SUCCEEDED.to_string());
            self.close_form();
        } else {
            self.notice = Some(user_message::UPLOAD_FAILED.to_string());
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::GeoPoint;
    use chrono::Utc;

    fn session() -> Session {
        Session::new(&Config::default())
    }

    fn event(id: &str) -> Event {
        Event {
            id: id.to_string(),
            title: format!("event {id}"),
            image_path: String::new(),
            tags: "Fire".to_string(),
            location: GeoPoint {
                kind: "Point".to_string(),
                coordinates: vec![78.0322, 30.3165],
            },
            created_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_failed_fetch_keeps_prior_events() {
        let mut s = session();
        let first = s.begin_fetch(s.region.center());
        assert_eq!(s.finish_fetch(first.id, Some(vec![event("a"), event("b")])), FetchOutcome::Applied);

        let second = s.begin_fetch(s.region.center());
        assert!(s.loading);
        assert_eq!(s.finish_fetch(second.id, None), FetchOutcome::Failed);

        assert_eq!(s.events.len(), 2);
        assert!(!s.loading);
        assert_eq!(s.error.as_deref(), Some(user_message::FETCH_FAILED));
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let mut s = session();
        let slow = s.begin_fetch(Coordinate::new(30.0, 78.0));
        let fast = s.begin_fetch(Coordinate::new(31.0, 78.0));

        assert_eq!(s.finish_fetch(fast.id, Some(vec![event("new")])), FetchOutcome::Applied);
        assert_eq!(s.finish_fetch(slow.id, Some(vec![event("old")])), FetchOutcome::Stale);

        assert_eq!(s.events[0].id, "new");
        assert!(!s.loading);
    }

    #[test]
    fn test_stale_failure_keeps_loading_for_newer_request() {
        let mut s = session();
        let slow = s.begin_fetch(s.region.center());
        let fast = s.begin_fetch(s.region.center());

        assert_eq!(s.finish_fetch(slow.id, None), FetchOutcome::Stale);
        assert!(s.loading);
        assert!(s.error.is_none());

        s.finish_fetch(fast.id, Some(Vec::new()));
        assert!(!s.loading);
    }

    #[test]
    fn test_small_region_change_does_not_fetch() {
        let mut s = session();
        let committed = s.region;
        let nudged = committed.panned(0.004, 0.004);

        assert_eq!(s.region_change_complete(nudged), None);
        assert_eq!(s.region, committed);
        assert_eq!(s.viewport, nudged);
    }

    #[test]
    fn test_drag_moves_only_the_viewport() {
        let mut s = session();
        let committed = s.region;
        s.pan_viewport(0.5, 0.5);
        assert_eq!(s.region, committed);
        assert!(s.viewport.moved_beyond(&committed, 0.4));

        // Releasing the drag commits it
        let released = s.viewport;
        assert_eq!(s.region_change_complete(released), Some(released.center()));
    }

    #[test]
    fn test_nudges_accumulate_until_threshold() {
        let mut s = session();
        let step = s.region.panned(0.006, 0.0);
        assert!(s.region_change_complete(step).is_none());

        let further = step.panned(0.006, 0.0);
        let target = s.region_change_complete(further).unwrap();
        assert_eq!(target, further.center());
        assert_eq!(s.region, further);
    }

    #[test]
    fn test_zoom_alone_does_not_fetch() {
        let mut s = session();
        let zoomed = s.region.zoomed(0.5);
        assert!(s.region_change_complete(zoomed).is_none());
        assert_eq!(s.viewport.latitude_delta, 0.005);
    }

    #[test]
    fn test_permission_denied_keeps_default_region() {
        let mut s = session();
        let default = s.region;
        s.permission_resolved(false);

        assert_eq!(s.region, default);
        assert_eq!(s.error.as_deref(), Some(user_message::PERMISSION_DENIED));
        assert_eq!(s.refresh(), RefreshPlan::FetchAt(default.center()));
    }

    #[test]
    fn test_location_updates_region_and_current_location() {
        let mut s = session();
        s.permission_resolved(true);
        assert_eq!(s.refresh(), RefreshPlan::Relocate);

        let far = Coordinate::new(28.6139, 77.2090);
        assert_eq!(s.location_resolved(far, false), Some(far));
        assert_eq!(s.region.center(), far);
        assert_eq!(s.current_location, Some(far));

        // Same spot again: nothing to fetch unless forced
        assert_eq!(s.location_resolved(far, false), None);
        assert_eq!(s.location_resolved(far, true), Some(far));
    }

    #[test]
    fn test_report_target_prefers_device_location() {
        let mut s = session();
        assert_eq!(s.report_target(), s.region.center());

        let here = Coordinate::new(30.33, 78.05);
        s.location_resolved(here, false);
        s.region_change_complete(s.region.panned(1.0, 1.0));
        assert_eq!(s.report_target(), here);
    }

    #[test]
    fn test_blank_search_is_rejected() {
        let mut s = session();
        assert_eq!(s.begin_search("  "), None);
        assert_eq!(s.notice.as_deref(), Some(user_message::EMPTY_SEARCH));
        assert!(!s.loading);

        let ticket = s.begin_search(" Dehradun ").unwrap();
        assert_eq!(ticket.query, "Dehradun");
        assert!(s.loading);
        s.search_failed(ticket.id);
        assert!(!s.loading);
        assert_eq!(s.error.as_deref(), Some(user_message::GEOCODE_FAILED));
    }

    #[test]
    fn test_older_search_answering_last_is_dropped() {
        let mut s = session();
        let first = s.begin_search("Dehradun").unwrap();
        let second = s.begin_search("Delhi").unwrap();

        let delhi = Coordinate::new(28.6139, 77.2090);
        assert_eq!(s.search_resolved(second.id, delhi), Some(delhi));

        let dehradun = Coordinate::new(30.3165, 78.0322);
        assert_eq!(s.search_resolved(first.id, dehradun), None);
        assert_eq!(s.region.center(), delhi);

        // A late failure from the old search doesn't show an error either
        s.search_failed(first.id);
        assert!(s.error.is_none());
    }

    #[test]
    fn test_location_report_without_position() {
        let mut s = session();
        let committed = s.region.center();

        // Startup read with no fix: nothing to fetch
        assert_eq!(s.location_report(true, None, false), None);
        assert!(s.permission_granted);

        // Refresh with no fix still fetches where the map is
        assert_eq!(s.location_report(true, None, true), Some(committed));
        assert!(s.current_location.is_none());
    }

    #[test]
    fn test_location_report_with_position() {
        let mut s = session();
        let far = Coordinate::new(28.6139, 77.2090);
        assert_eq!(s.location_report(true, Some(far), false), Some(far));
        assert_eq!(s.current_location, Some(far));

        assert_eq!(s.location_report(false, None, false), None);
        assert_eq!(s.error.as_deref(), Some(user_message::PERMISSION_DENIED));
    }

    #[test]
    fn test_media_flow() {
        let mut s = session();
        s.open_sheet();
        assert!(s.sheet_open);
        assert!(!s.button_visible);

        s.media_picked(None);
        assert!(!s.sheet_open);
        assert!(s.button_visible);
        assert!(s.draft.is_none());

        s.open_sheet();
        let media = PathBuf::from("/tmp/a.jpg");
        s.media_picked(Some(media.clone()));
        assert!(!s.button_visible);
        assert_eq!(s.draft.as_ref().unwrap().media.as_ref(), Some(&media));

        s.preview_ready(Path::new("/tmp/other.jpg"), PathBuf::from("/tmp/p0.jpg"));
        assert!(s.draft.as_ref().unwrap().preview.is_none());
        s.preview_ready(&media, PathBuf::from("/tmp/p1.jpg"));
        assert_eq!(
            s.draft.as_ref().unwrap().preview.as_deref(),
            Some(Path::new("/tmp/p1.jpg"))
        );
    }

    #[test]
    fn test_empty_fields_block_submission() {
        let mut s = session();
        s.media_picked(Some(PathBuf::from("/tmp/a.jpg")));
        s.set_title("Crash".to_string());

        assert!(s.begin_submit().is_none());
        assert_eq!(s.notice.as_deref(), Some(user_message::EMPTY_FIELDS));
        assert!(!s.draft.as_ref().unwrap().submitting);
    }

    #[test]
    fn test_successful_submission_clears_draft() {
        let mut s = session();
        s.open_sheet();
        s.media_picked(Some(PathBuf::from("/tmp/a.png")));
        s.set_title("Crash".to_string());
        s.set_tags("Accident".to_string());

        let submission = s.begin_submit().unwrap();
        assert_eq!(submission.attachment.unwrap().mime, "image/png");
        // A second press while in flight sends nothing
        assert!(s.begin_submit().is_none());

        s.submit_finished(true);
        assert!(s.draft.is_none());
        assert!(s.button_visible);
        assert_eq!(s.notice.as_deref(), Some(user_message::UPLOAD_SUCCEEDED));
    }

    #[test]
    fn test_failed_submission_keeps_draft() {
        let mut s = session();
        s.media_picked(None);
        s.media_picked(Some(PathBuf::from("/tmp/a.png")));
        s.set_title("Crash".to_string());
        s.set_tags("Accident".to_string());
        s.begin_submit().unwrap();

        s.submit_finished(false);
        let draft = s.draft.as_ref().unwrap();
        assert!(!draft.submitting);
        assert_eq!(draft.title, "Crash");
        assert_eq!(s.notice.as_deref(), Some(user_message::UPLOAD_FAILED));
    }
}
