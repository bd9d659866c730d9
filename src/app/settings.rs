// SPDX-License-Identifier: GPL-3.0-only

//! Settings drawer view

use crate::app::state::{AppModel, ContextPage, Message};
use crate::fl;
use cosmic::Element;
use cosmic::app::context_drawer;
use cosmic::widget;

impl AppModel {
    /// Create the settings view for the context drawer
    pub fn settings_view(&self) -> context_drawer::ContextDrawer<'_, Message> {
        let camera_control: Element<'_, Message> = if self.camera_dropdown_options.is_empty() {
            widget::text::body(fl!("settings-no-cameras")).into()
        } else {
            widget::dropdown(
                &self.camera_dropdown_options,
                Some(self.current_camera_index),
                Message::SelectCamera,
            )
            .into()
        };

        let theme_dropdown = widget::dropdown(
            &self.theme_dropdown_options,
            Some(self.config.app_theme.index()),
            Message::SetAppTheme,
        );

        let mirror_toggle =
            widget::toggler(self.config.mirror_preview).on_toggle(|_| Message::ToggleMirrorPreview);

        let quality = self.config.effective_jpeg_quality();
        let quality_slider = widget::slider(1..=100, quality, Message::SetJpegQuality);

        let camera_section = widget::settings::section()
            .title(fl!("settings-camera"))
            .add(widget::settings::item::builder(fl!("settings-device")).control(camera_control))
            .add(
                widget::settings::item::builder(fl!("settings-mirror-preview"))
                    .description(fl!("settings-mirror-preview-description"))
                    .control(mirror_toggle),
            );

        let photo_section = widget::settings::section()
            .title(fl!("settings-photos"))
            .add(
                widget::settings::item::builder(fl!("settings-jpeg-quality"))
                    .description(quality.to_string())
                    .control(quality_slider),
            )
            .add(
                widget::settings::item::builder(fl!("settings-folder"))
                    .description(self.library.dir().display().to_string())
                    .control(widget::button::standard(fl!("open-folder")).on_press(Message::OpenFolder)),
            );

        let appearance_section = widget::settings::section()
            .title(fl!("settings-appearance"))
            .add(widget::settings::item::builder(fl!("settings-theme")).control(theme_dropdown));

        let content: Element<'_, Message> =
            widget::settings::view_column(vec![
                camera_section.into(),
                photo_section.into(),
                appearance_section.into(),
            ])
            .into();

        context_drawer::context_drawer(content, Message::ToggleContextPage(ContextPage::Settings))
            .title(fl!("settings"))
    }
}
