/// Presentation-only widgets. They read state and emit `Message`s;
/// all mutation happens in `update`.
pub mod form;
pub mod map;
pub mod sheet;
