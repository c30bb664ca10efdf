/// Incident map canvas
///
/// Draws the viewport as a dark coordinate grid with one marker per event
/// and a dot for the device position. Dragging pans, the wheel zooms.
/// Each finished gesture reports the settled region so the session can
/// decide whether to refetch.
use iced::alignment;
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Frame, Path, Program, Stroke, Text};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Size, Theme};

use crate::state::data::{Coordinate, Event, EventKind};
use crate::state::region::Region;
use crate::Message;

const BACKGROUND: Color = Color {
    r: 0.141,
    g: 0.184,
    b: 0.243,
    a: 1.0,
};
const GRID: Color = Color {
    r: 0.55,
    g: 0.6,
    b: 0.7,
    a: 0.18,
};
const LABEL: Color = Color {
    r: 0.84,
    g: 0.58,
    b: 0.39,
    a: 1.0,
};
const USER_DOT: Color = Color {
    r: 0.26,
    g: 0.52,
    b: 0.96,
    a: 1.0,
};

const MARKER_RADIUS: f32 = 9.0;
/// Zoom step per wheel notch
const ZOOM_STEP: f64 = 0.8;
/// Upper bound on grid lines per axis
const MAX_GRID_LINES: usize = 64;

pub struct MapView<'a> {
    pub viewport: Region,
    pub events: &'a [Event],
    pub user_location: Option<Coordinate>,
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
    pub last_position: Option<Point>,
}

fn marker_color(kind: EventKind) -> Color {
    match kind {
        EventKind::Accident => Color::from_rgb(0.9, 0.22, 0.21),
        EventKind::Roadblock => Color::from_rgb(0.98, 0.76, 0.18),
        EventKind::Fire => Color::from_rgb(1.0, 0.46, 0.0),
        EventKind::Protest => Color::from_rgb(0.61, 0.35, 0.95),
        EventKind::Other => Color::from_rgb(0.6, 0.65, 0.7),
    }
}

fn grid_stroke() -> Stroke<'static> {
    Stroke::default().with_color(GRID).with_width(1.0)
}

/// Grid spacing in degrees: a power of ten giving a handful of lines per span
fn grid_step(span: f64) -> f64 {
    10f64.powf((span / 4.0).log10().floor())
}

impl MapView<'_> {
    fn draw_grid(&self, frame: &mut Frame, size: Size) {
        let r = &self.viewport;

        let step = grid_step(r.longitude_delta);
        let mut lon = ((r.longitude - r.longitude_delta / 2.0) / step).floor() * step;
        for _ in 0..MAX_GRID_LINES {
            if lon > r.longitude + r.longitude_delta / 2.0 {
                break;
            }
            let (x, _) = r.project(Coordinate::new(r.latitude, lon), size.width, size.height);
            frame.stroke(
                &Path::line(Point::new(x, 0.0), Point::new(x, size.height)),
                grid_stroke(),
            );
            lon += step;
        }

        let step = grid_step(r.latitude_delta);
        let mut lat = ((r.latitude - r.latitude_delta / 2.0) / step).floor() * step;
        for _ in 0..MAX_GRID_LINES {
            if lat > r.latitude + r.latitude_delta / 2.0 {
                break;
            }
            let (_, y) = r.project(Coordinate::new(lat, r.longitude), size.width, size.height);
            frame.stroke(
                &Path::line(Point::new(0.0, y), Point::new(size.width, y)),
                grid_stroke(),
            );
            lat += step;
        }
    }

    fn draw_marker(&self, frame: &mut Frame, event: &Event, at: Point, hovered: bool) {
        let kind = event.kind();
        let radius = if hovered { MARKER_RADIUS + 3.0 } else { MARKER_RADIUS };

        frame.fill(&Path::circle(at, radius), marker_color(kind));
        frame.stroke(
            &Path::circle(at, radius),
            Stroke::default().with_color(Color::WHITE).with_width(2.0),
        );

        frame.fill_text(Text {
            content: event.title.clone(),
            position: Point::new(at.x, at.y - radius - 2.0),
            color: Color::WHITE,
            size: Pixels(13.0),
            horizontal_alignment: alignment::Horizontal::Center,
            vertical_alignment: alignment::Vertical::Bottom,
            ..Text::default()
        });

        // Description shows on hover, like a marker callout
        if hovered {
            frame.fill_text(Text {
                content: match event.created_at {
                    Some(stamp) => format!("{} · {}", event.tags, stamp.format("%Y-%m-%d %H:%M")),
                    None => event.tags.clone(),
                },
                position: Point::new(at.x, at.y + radius + 2.0),
                color: LABEL,
                size: Pixels(12.0),
                horizontal_alignment: alignment::Horizontal::Center,
                vertical_alignment: alignment::Vertical::Top,
                ..Text::default()
            });
        }
    }
}

impl Program<Message> for MapView<'_> {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let size = bounds.size();
        let mut frame = Frame::new(renderer, size);
        let r = &self.viewport;

        frame.fill_rectangle(Point::ORIGIN, size, BACKGROUND);
        self.draw_grid(&mut frame, size);

        let cursor_at = cursor.position_in(bounds);
        for event in self.events {
            let Some(coordinate) = event.coordinate() else {
                continue;
            };
            let (x, y) = r.project(coordinate, size.width, size.height);
            let at = Point::new(x, y);
            let hovered = cursor_at.is_some_and(|c| c.distance(at) <= MARKER_RADIUS + 3.0);
            self.draw_marker(&mut frame, event, at, hovered);
        }

        if let Some(me) = self.user_location {
            let (x, y) = r.project(me, size.width, size.height);
            let at = Point::new(x, y);
            frame.fill(&Path::circle(at, 10.0), Color { a: 0.25, ..USER_DOT });
            frame.fill(&Path::circle(at, 5.0), USER_DOT);
            frame.stroke(
                &Path::circle(at, 5.0),
                Stroke::default().with_color(Color::WHITE).with_width(1.5),
            );
        }

        frame.fill_text(Text {
            content: format!("{:.4}, {:.4}", r.latitude, r.longitude),
            position: Point::new(8.0, size.height - 8.0),
            color: LABEL,
            size: Pixels(12.0),
            vertical_alignment: alignment::Vertical::Bottom,
            ..Text::default()
        });

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Mouse wheel for zooming
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if !cursor.is_over(bounds) {
                    return (canvas::event::Status::Ignored, None);
                }
                let notches = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => y,
                    mouse::ScrollDelta::Pixels { y, .. } => y / 50.0,
                };
                if notches == 0.0 {
                    return (canvas::event::Status::Ignored, None);
                }
                let factor = ZOOM_STEP.powf(f64::from(notches));
                return (
                    canvas::event::Status::Captured,
                    Some(Message::RegionChangeComplete(self.viewport.zoomed(factor))),
                );
            }

            // Mouse button press - start dragging
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(pos) = cursor.position_over(bounds) {
                    state.is_dragging = true;
                    state.last_position = Some(pos);
                    return (canvas::event::Status::Captured, None);
                }
            }

            // Mouse button release - the region has settled
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.is_dragging {
                    state.is_dragging = false;
                    state.last_position = None;
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::RegionChangeComplete(self.viewport)),
                    );
                }
            }

            // Mouse move - pan if dragging
            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if state.is_dragging {
                    if let Some(last) = state.last_position {
                        let delta = pixels_to_degrees(
                            &self.viewport,
                            bounds.size(),
                            position.x - last.x,
                            position.y - last.y,
                        );
                        state.last_position = Some(position);
                        return (canvas::event::Status::Captured, Some(Message::MapPanned(delta)));
                    }
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if state.is_dragging {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

/// Convert a cursor movement into a center shift, as (longitude, latitude).
/// Dragging right moves the map west; dragging down moves it north.
fn pixels_to_degrees(region: &Region, size: Size, dx: f32, dy: f32) -> cgmath::Vector2<f64> {
    let width = f64::from(size.width.max(1.0));
    let height = f64::from(size.height.max(1.0));
    cgmath::Vector2::new(
        -f64::from(dx) / width * region.longitude_delta,
        f64::from(dy) / height * region.latitude_delta,
    )
}
