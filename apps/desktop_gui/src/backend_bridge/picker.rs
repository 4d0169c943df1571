use std::path::PathBuf;

use async_trait::async_trait;
use uploader_core::FolderPicker;

/// Native folder dialog; blocks a pool thread until the user answers.
pub struct RfdFolderPicker;

#[async_trait]
impl FolderPicker for RfdFolderPicker {
    async fn pick_folder(&self) -> Option<PathBuf> {
        tokio::task::spawn_blocking(|| {
            rfd::FileDialog::new()
                .set_title("Select folder for exported XML files")
                .pick_folder()
        })
        .await
        .unwrap_or_else(|err| {
            tracing::error!("folder dialog task failed: {err}");
            None
        })
    }
}
