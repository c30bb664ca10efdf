/// Floating add button and the media source sheet it opens
use iced::widget::{button, column, container, text};
use iced::{Element, Length};

use crate::Message;

pub fn add_button<'a>() -> Element<'a, Message> {
    container(
        button(text("+").size(28))
            .on_press(Message::OpenSheet)
            .padding([6, 18]),
    )
    .center_x(Length::Fill)
    .into()
}

pub fn media_sheet<'a>() -> Element<'a, Message> {
    let choices = column![
        button("Capture Photo/Video")
            .on_press(Message::Capture)
            .width(Length::Fill)
            .padding(10),
        button("Pick from Gallery")
            .on_press(Message::PickFromGallery)
            .width(Length::Fill)
            .padding(10),
        button("Cancel")
            .style(button::secondary)
            .on_press(Message::CancelSheet)
            .width(Length::Fill)
            .padding(10),
    ]
    .spacing(8);

    container(choices)
        .padding(20)
        .width(Length::Fill)
        .style(container::rounded_box)
        .into()
}
