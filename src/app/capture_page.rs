// SPDX-License-Identifier: GPL-3.0-only

//! Capture page: live preview with a capture button

use crate::app::state::{AppModel, Message};
use crate::backends::camera::SessionState;
use crate::constants::ui;
use crate::fl;
use cosmic::Element;
use cosmic::iced::{Alignment, Background, Color, ContentFit, Length};
use cosmic::widget::{self, icon};

impl AppModel {
    pub fn capture_page_view(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let top_bar = widget::row()
            .push(
                widget::button::standard(fl!("back"))
                    .leading_icon(icon::from_name("go-previous-symbolic"))
                    .on_press(Message::BackToGallery),
            )
            .push(widget::Space::new(Length::Fill, Length::Shrink))
            .align_y(Alignment::Center)
            .padding(spacing.space_xs);

        let preview: Element<'_, Message> = match &self.preview {
            Some(handle) => widget::image::Image::new(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => widget::container(
                widget::text::body(self.preview_status()).class(cosmic::theme::Text::Color(
                    Color::from_rgb(0.8, 0.8, 0.8),
                )),
            )
            .center(Length::Fill)
            .into(),
        };

        widget::container(
            widget::column()
                .push(top_bar)
                .push(preview)
                .push(self.build_capture_button())
                .width(Length::Fill)
                .height(Length::Fill),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .style(|_theme| widget::container::Style {
            background: Some(Background::Color(Color::BLACK)),
            ..Default::default()
        })
        .into()
    }

    /// Placeholder text while there is no frame to show
    fn preview_status(&self) -> String {
        match self.session_state {
            _ if self.opening => fl!("camera-starting"),
            SessionState::Initializing | SessionState::Previewing => fl!("camera-starting"),
            SessionState::PreviewBlocked => fl!("camera-waiting"),
            SessionState::Closed => fl!("camera-unavailable"),
        }
    }

    /// White circle; gray and inert unless a frame can be captured
    fn build_capture_button(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();
        let enabled = self.session_state == SessionState::Previewing && !self.is_capturing;

        let color = if enabled {
            Color::WHITE
        } else {
            Color::from_rgba(0.7, 0.7, 0.7, 0.5)
        };
        let inner_size = ui::CAPTURE_BUTTON_SIZE * 0.8;

        let inner = widget::container(widget::Space::new(
            Length::Fixed(inner_size),
            Length::Fixed(inner_size),
        ))
        .style(move |_theme| widget::container::Style {
            background: Some(Background::Color(color)),
            border: cosmic::iced::Border {
                radius: (inner_size / 2.0).into(),
                ..Default::default()
            },
            ..Default::default()
        });

        let mut button = widget::button::custom(
            widget::container(inner)
                .center_x(Length::Fixed(ui::CAPTURE_BUTTON_SIZE))
                .center_y(Length::Fixed(ui::CAPTURE_BUTTON_SIZE)),
        )
        .padding(0)
        .width(Length::Fixed(ui::CAPTURE_BUTTON_SIZE))
        .height(Length::Fixed(ui::CAPTURE_BUTTON_SIZE))
        .class(cosmic::theme::Button::Image);
        if enabled {
            button = button.on_press(Message::Capture);
        }

        widget::container(button)
            .width(Length::Fill)
            .center_x(Length::Fill)
            .padding([spacing.space_s, 0])
            .into()
    }
}
