// SPDX-License-Identifier: AGPL-3.0-or-later
//! CLI errors

use fdk_core::FdkError;
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Driver(#[from] FdkError),

    #[error("No driver selected: pass --driver or --profile")]
    NoDriver,

    #[error("Unknown profile '{0}'")]
    UnknownProfile(String),

    #[error("Cannot load profiles from {path}: {message}")]
    Profiles { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
