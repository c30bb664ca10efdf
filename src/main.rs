use iced::widget::{button, canvas, column, container, row, text, text_input, Column};
use iced::{Color, Element, Length, Task, Theme};
use std::path::PathBuf;
use tracing::{debug, error, info};

mod api;
mod config;
mod error;
mod location;
mod logging;
mod media;
mod services;
mod state;
mod ui;

use config::Config;
use services::{LocationReport, Services};
use state::data::{Coordinate, Event};
use state::region::Region;
use state::session::{FetchOutcome, RefreshPlan, Session};

const ERROR_COLOR: Color = Color {
    r: 1.0,
    g: 0.54,
    b: 0.5,
    a: 1.0,
};

/// Main application state
struct IncidentMap {
    /// Everything the screen shows and the rules for changing it
    session: Session,
    /// Network and platform services
    services: Services,
    config: Config,
    /// Text in the search bar
    search_query: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    SearchChanged(String),
    /// User pressed "Search" or hit enter in the search bar
    Search,
    SearchResolved(u64, Option<Coordinate>),
    Refresh,
    LocationResolved {
        report: LocationReport,
        /// Fetch even if the position did not move
        refresh: bool,
    },
    EventsFetched(u64, Option<Vec<Event>>),
    /// Drag in progress, (longitude, latitude) shift in degrees
    MapPanned(cgmath::Vector2<f64>),
    /// Drag released or wheel zoom finished
    RegionChangeComplete(Region),
    OpenSheet,
    CancelSheet,
    Capture,
    CaptureFinished(Result<Option<PathBuf>, &'static str>),
    PickFromGallery,
    PreviewReady(PathBuf, Option<PathBuf>),
    TitleChanged(String),
    TagsChanged(String),
    Submit,
    SubmitFinished(bool),
    CloseForm,
    DismissNotice,
}

impl IncidentMap {
    /// Create the application and kick off the first fetch and location lookup
    fn new(config: Config, services: Services) -> (Self, Task<Message>) {
        let session = Session::new(&config);
        let mut app = IncidentMap {
            session,
            services,
            config,
            search_query: String::new(),
        };

        info!(
            latitude = app.session.region.latitude,
            longitude = app.session.region.longitude,
            "incident map started at default region"
        );

        // Events at the default region first, then try for the device position
        let first_fetch = app.fetch(app.session.region.center());
        let locate = app.locate(false);
        (app, Task::batch([first_fetch, locate]))
    }

    /// Start a sequenced fetch at `at`
    fn fetch(&mut self, at: Coordinate) -> Task<Message> {
        let ticket = self.session.begin_fetch(at);
        Task::perform(
            services::fetch_events(self.services.api.clone(), ticket),
            |(id, events)| Message::EventsFetched(id, events),
        )
    }

    fn locate(&self, refresh: bool) -> Task<Message> {
        Task::perform(
            services::locate_device(
                self.services.location.clone(),
                self.config.default_coordinate(),
            ),
            move |report| Message::LocationResolved { report, refresh },
        )
    }

    /// Put picked media into a new draft and start its preview
    fn media_ready(&mut self, media: Option<PathBuf>) -> Task<Message> {
        self.session.media_picked(media.clone());

        match media {
            Some(path) if media::is_previewable(&path) => Task::perform(
                services::preview_media(path, Config::cache_dir().join("previews")),
                |(media, preview)| Message::PreviewReady(media, preview),
            ),
            _ => Task::none(),
        }
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SearchChanged(query) => {
                self.search_query = query;
                Task::none()
            }
            Message::Search => match self.session.begin_search(&self.search_query) {
                Some(ticket) => {
                    let id = ticket.id;
                    Task::perform(
                        services::geocode(self.services.geocoder.clone(), ticket.query),
                        move |found| Message::SearchResolved(id, found),
                    )
                }
                None => Task::none(),
            },
            Message::SearchResolved(ticket, Some(found)) => {
                match self.session.search_resolved(ticket, found) {
                    Some(center) => self.fetch(center),
                    None => Task::none(),
                }
            }
            Message::SearchResolved(ticket, None) => {
                self.session.search_failed(ticket);
                Task::none()
            }
            Message::Refresh => match self.session.refresh() {
                RefreshPlan::Relocate => self.locate(true),
                RefreshPlan::FetchAt(at) => self.fetch(at),
            },
            Message::LocationResolved { report, refresh } => {
                match self
                    .session
                    .location_report(report.granted, report.position, refresh)
                {
                    Some(at) => self.fetch(at),
                    None => Task::none(),
                }
            }
            Message::EventsFetched(ticket, events) => {
                match self.session.finish_fetch(ticket, events) {
                    FetchOutcome::Applied => {
                        debug!(count = self.session.events.len(), "events on map")
                    }
                    FetchOutcome::Failed => error!(ticket, "event fetch failed"),
                    FetchOutcome::Stale => {}
                }
                Task::none()
            }
            Message::MapPanned(delta) => {
                self.session.pan_viewport(delta.y, delta.x);
                Task::none()
            }
            Message::RegionChangeComplete(region) => {
                match self.session.region_change_complete(region) {
                    Some(at) => self.fetch(at),
                    None => Task::none(),
                }
            }
            Message::OpenSheet => {
                self.session.open_sheet();
                Task::none()
            }
            Message::CancelSheet => {
                self.session.cancel_sheet();
                Task::none()
            }
            Message::Capture => Task::perform(
                services::capture_media(
                    self.config.capture.command.clone(),
                    Config::cache_dir().join("captures"),
                ),
                Message::CaptureFinished,
            ),
            Message::CaptureFinished(Ok(media)) => self.media_ready(media),
            Message::CaptureFinished(Err(message)) => {
                self.session.capture_failed(message);
                Task::none()
            }
            Message::PickFromGallery => {
                // Native dialog; blocks until the user picks or cancels
                let picked = media::picker::pick_from_gallery();
                self.media_ready(picked)
            }
            Message::PreviewReady(media, preview) => {
                if let Some(preview) = preview {
                    self.session.preview_ready(&media, preview);
                }
                Task::none()
            }
            Message::TitleChanged(title) => {
                self.session.set_title(title);
                Task::none()
            }
            Message::TagsChanged(tags) => {
                self.session.set_tags(tags);
                Task::none()
            }
            Message::Submit => match self.session.begin_submit() {
                Some(report) => {
                    info!(
                        title = %report.title,
                        latitude = report.target.latitude,
                        longitude = report.target.longitude,
                        "submitting report"
                    );
                    Task::perform(
                        services::submit(self.services.api.clone(), report),
                        Message::SubmitFinished,
                    )
                }
                None => Task::none(),
            },
            Message::SubmitFinished(ok) => {
                self.session.submit_finished(ok);
                Task::none()
            }
            Message::CloseForm => {
                self.session.close_form();
                Task::none()
            }
            Message::DismissNotice => {
                self.session.dismiss_notice();
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let session = &self.session;

        let mut content: Column<Message> = column![
            text("Search for Location").size(20),
            text_input("Enter a location", &self.search_query)
                .on_input(Message::SearchChanged)
                .on_submit(Message::Search)
                .padding(8),
            row![
                button("Search").on_press(Message::Search).padding(8),
                button("Refresh")
                    .style(button::success)
                    .on_press(Message::Refresh)
                    .padding(8),
            ]
            .spacing(12),
        ]
        .spacing(10)
        .padding(10);

        if let Some(error) = &session.error {
            content = content.push(text(error).color(ERROR_COLOR));
        }

        if session.loading {
            content = content.push(text("Loading events...").size(14));
        }

        if let Some(notice) = &session.notice {
            content = content.push(
                container(
                    row![
                        text(notice).width(Length::Fill),
                        button("OK")
                            .style(button::secondary)
                            .on_press(Message::DismissNotice),
                    ]
                    .spacing(12),
                )
                .padding(10)
                .style(container::rounded_box),
            );
        }

        content = content.push(
            canvas(ui::map::MapView {
                viewport: session.viewport,
                events: &session.events,
                user_location: session.current_location,
            })
            .width(Length::Fill)
            .height(Length::Fill),
        );

        if let Some(draft) = &session.draft {
            content = content.push(ui::form::view(draft));
        }

        if session.button_visible {
            content = content.push(ui::sheet::add_button());
        }

        if session.sheet_open {
            content = content.push(ui::sheet::media_sheet());
        }

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            logging::init(&config::LoggingConfig::default().filter);
            error!("{e}");
            std::process::exit(2);
        }
    };
    logging::init(&config.logging.filter);

    let services = match Services::from_config(&config) {
        Ok(services) => services,
        Err(e) => {
            error!("failed to set up services: {e}");
            std::process::exit(2);
        }
    };

    info!(api = %config.api.base_url, "using incident service");

    iced::application("Incident Map", IncidentMap::update, IncidentMap::view)
        .theme(IncidentMap::theme)
        .centered()
        .run_with(move || IncidentMap::new(config, services))
}
