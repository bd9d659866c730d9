// SPDX-License-Identifier: GPL-3.0-only

//! Gallery handlers

use crate::app::state::{AppModel, GalleryRow, Message};
use crate::fl;
use crate::storage::{self, GalleryItem};
use cosmic::Task;
use tracing::{debug, error, info};

impl AppModel {
    /// Start a listing pass; any pass still running becomes stale
    pub(crate) fn handle_refresh_gallery(&mut self) -> Task<cosmic::Action<Message>> {
        self.gallery.generation += 1;
        self.gallery.loading = true;
        let generation = self.gallery.generation;
        let library = self.library.clone();
        debug!(generation, path = %library.dir().display(), "Listing photo folder");

        Task::perform(
            async move {
                storage::load_gallery(library)
                    .await
                    .map_err(|e| e.to_string())
            },
            move |result| cosmic::Action::App(Message::GalleryLoaded(generation, result)),
        )
    }

    pub(crate) fn handle_gallery_loaded(
        &mut self,
        generation: u64,
        result: Result<Vec<GalleryItem>, String>,
    ) -> Task<cosmic::Action<Message>> {
        if generation != self.gallery.generation {
            debug!(generation, current = self.gallery.generation, "Discarding stale listing");
            return Task::none();
        }
        self.gallery.loading = false;

        match result {
            Ok(items) => {
                info!(count = items.len(), "Gallery loaded");
                self.gallery.rows = items.into_iter().map(GalleryRow::from).collect();
            }
            Err(err) => {
                error!(error = %err, "Failed to list photo folder");
                self.gallery.rows.clear();
                self.error = Some(err);
            }
        }
        Task::none()
    }

    pub(crate) fn handle_delete_photo(&mut self, name: String) -> Task<cosmic::Action<Message>> {
        info!(name = %name, "Deleting photo");
        let library = self.library.clone();
        Task::perform(
            async move {
                storage::delete_photo(library, name)
                    .await
                    .map_err(|e| e.to_string())
            },
            |result| cosmic::Action::App(Message::PhotoDeleted(result)),
        )
    }

    /// Re-list after every deletion attempt, successful or not
    pub(crate) fn handle_photo_deleted(
        &mut self,
        result: Result<usize, String>,
    ) -> Task<cosmic::Action<Message>> {
        match result {
            Ok(count) => debug!(count, "Delete finished"),
            Err(err) => {
                error!(error = %err, "Failed to delete photo");
                self.error = Some(fl!("error-delete-failed", reason = err));
            }
        }
        self.handle_refresh_gallery()
    }

    pub(crate) fn handle_open_folder(&self) -> Task<cosmic::Action<Message>> {
        let dir = match self.library.ensure() {
            Ok(dir) => dir.to_path_buf(),
            Err(e) => {
                error!(error = %e, "Failed to create photo folder");
                return Task::none();
            }
        };
        info!(path = %dir.display(), "Opening photo folder");
        if let Err(e) = open::that_detached(&dir) {
            error!(error = %e, path = %dir.display(), "Failed to open photo folder");
        }
        Task::none()
    }
}
