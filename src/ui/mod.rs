/// View helpers for the slideshow window

use iced::widget::image::Handle;
use iced::widget::{container, text};
use iced::{Element, Length};

use crate::Message;

/// "3 / 10" style page counter
pub(crate) fn page_indicator(current: usize, len: usize) -> String {
    if len == 0 {
        "No images".to_string()
    } else {
        format!("{} / {}", current + 1, len)
    }
}

/// The current page's image, or a loading note while there is none
pub(crate) fn image_panel(handle: Option<&Handle>, loading: bool) -> Element<'static, Message> {
    let content: Element<'static, Message> = match handle {
        Some(handle) => iced::widget::image(handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        None if loading => text("Loading...").size(20).into(),
        None => text("Nothing to show. Open a folder or add sources to the config.")
            .size(16)
            .into(),
    };

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
