// SPDX-License-Identifier: GPL-3.0-only

//! Gallery page
//!
//! One row per file in the photo folder: thumbnail, name and a delete button
//! carrying the row's display name.

use crate::app::state::{AppModel, GalleryRow, Message};
use crate::constants::{thumbnail, ui};
use crate::fl;
use cosmic::Element;
use cosmic::iced::{Alignment, ContentFit, Length};
use cosmic::widget::{self, icon};

impl AppModel {
    pub fn gallery_page_view(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let header = widget::row()
            .push(widget::text::title3(fl!("gallery-title")))
            .push(widget::Space::new(Length::Fill, Length::Shrink))
            .push(widget::button::standard(fl!("open-folder")).on_press(Message::OpenFolder))
            .push(
                widget::button::suggested(fl!("take-photo"))
                    .leading_icon(icon::from_name("camera-photo-symbolic"))
                    .on_press(Message::OpenCapture),
            )
            .spacing(spacing.space_s)
            .align_y(Alignment::Center);

        let body: Element<'_, Message> = if self.gallery.rows.is_empty() {
            let text = if self.gallery.loading {
                fl!("gallery-loading")
            } else {
                fl!("gallery-empty")
            };
            widget::container(widget::text::body(text))
                .center(Length::Fill)
                .into()
        } else {
            let rows = self
                .gallery
                .rows
                .iter()
                .fold(widget::column(), |column, row| column.push(gallery_row(row)));
            widget::scrollable(rows.width(Length::Fill)).height(Length::Fill).into()
        };

        widget::column()
            .push(header)
            .push(body)
            .spacing(spacing.space_s)
            .padding(spacing.space_m)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

fn gallery_row(row: &GalleryRow) -> Element<'_, Message> {
    let size = Length::Fixed(thumbnail::DISPLAY_SIZE);

    let thumb: Element<'_, Message> = match &row.thumbnail {
        Some(handle) => widget::image::Image::new(handle.clone())
            .content_fit(ContentFit::Contain)
            .width(size)
            .height(size)
            .into(),
        None => widget::container(icon::from_name("image-missing-symbolic").size(24))
            .center_x(size)
            .center_y(size)
            .into(),
    };

    let mut label = widget::column().push(widget::text::body(row.display_name.as_str()));
    if let Some(modified) = row.modified {
        label = label.push(widget::text::caption(
            modified.format("%Y-%m-%d %H:%M").to_string(),
        ));
    }

    let delete = widget::button::destructive(fl!("delete"))
        .on_press(Message::DeletePhoto(row.display_name.clone()));

    widget::container(
        widget::row()
            .push(thumb)
            .push(
                widget::container(label)
                    .width(Length::Fixed(ui::GALLERY_DELETE_GAP))
                    .padding([0, 8]),
            )
            .push(delete)
            .align_y(Alignment::Center),
    )
    .padding([ui::GALLERY_ROW_TOP_MARGIN as u16, 0, 0, 0])
    .into()
}
