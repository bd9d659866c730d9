// SPDX-License-Identifier: GPL-3.0-only

//! Main application view
//!
//! Shows the current page below the error banner, if there is one.

use crate::app::state::{AppModel, Message, Page};
use cosmic::Element;
use cosmic::iced::Length;
use cosmic::widget;

impl AppModel {
    /// Build the main application view
    pub fn view(&self) -> Element<'_, Message> {
        let page = match self.page {
            Page::Gallery => self.gallery_page_view(),
            Page::Capture => self.capture_page_view(),
        };

        let mut column = widget::column().width(Length::Fill).height(Length::Fill);
        if let Some(error) = &self.error {
            column = column.push(widget::warning(error.as_str()).on_close(Message::DismissError));
        }
        column.push(page).into()
    }
}
