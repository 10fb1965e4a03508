use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] fieldpulse_core::Error),
    #[error(transparent)]
    Sync(#[from] fieldpulse_core::sync::SyncError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("No shift timer is running")]
    TimerNotRunning,
    #[error("No trip is running")]
    TripNotRunning,
    #[error(
        "Sync server is not configured. Set FIELDPULSE_SYNC_URL or pass --server <URL>."
    )]
    SyncNotConfigured,
}
