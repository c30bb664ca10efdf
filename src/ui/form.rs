/// New report form
use iced::widget::image::Handle;
use iced::widget::{button, column, container, row, text, text_input, Image, Row};
use iced::{Element, Length};

use crate::state::data::EventKind;
use crate::state::draft::Draft;
use crate::Message;

/// Tags offered as one-tap shortcuts
const QUICK_TAGS: [EventKind; 4] = [
    EventKind::Accident,
    EventKind::Fire,
    EventKind::Roadblock,
    EventKind::Protest,
];

pub fn view(draft: &Draft) -> Element<'_, Message> {
    let media: Element<'_, Message> = match (&draft.preview, &draft.media) {
        (Some(preview), _) => Image::new(Handle::from_path(preview))
            .width(Length::Fixed(400.0))
            .height(Length::Fixed(400.0))
            .into(),
        (None, Some(path)) => text(format!(
            "Attached: {}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        ))
        .size(14)
        .into(),
        (None, None) => text("No media attached").size(14).into(),
    };

    let quick_tags = QUICK_TAGS.iter().fold(Row::new().spacing(6), |row, kind| {
        row.push(
            button(text(kind.label()).size(13))
                .style(button::secondary)
                .on_press(Message::TagsChanged(kind.label().to_string())),
        )
    });

    let submit = button(if draft.submitting { "Submitting..." } else { "Submit" })
        .on_press_maybe((!draft.submitting).then_some(Message::Submit))
        .padding(8);

    let content = column![
        media,
        text_input("Title", &draft.title)
            .on_input(Message::TitleChanged)
            .padding(10),
        text_input("Tags (e.g., Accident, Fire, Roadblock)", &draft.tags)
            .on_input(Message::TagsChanged)
            .on_submit(Message::Submit)
            .padding(10),
        quick_tags,
        row![
            submit,
            button("Cancel")
                .style(button::secondary)
                .on_press(Message::CloseForm)
                .padding(8),
        ]
        .spacing(12),
    ]
    .spacing(10);

    container(content)
        .padding(15)
        .width(Length::Fill)
        .style(container::rounded_box)
        .into()
}
