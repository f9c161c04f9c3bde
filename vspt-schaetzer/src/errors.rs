//! Basic error handling.

use failure_derive::Fail;
use vspt_util::impl_from_for_error;
use std::io::Error as IoError;
use serde_json::Error as JsonError;

pub type Result<T> = ::std::result::Result<T, SchaetzerError>;

#[derive(Fail, Debug)]
pub enum SchaetzerError {
    /// Training was attempted on an empty or wholly unusable input.
    #[fail(display = "not enough data to train on")]
    InsufficientData,
    /// A category showed up at inference time that the encoders were
    /// never fit on.
    #[fail(display = "unknown category: {}", _0)]
    UnknownCategory(String),
    /// Artifact I/O failed.
    #[fail(display = "artifact I/O: {}", _0)]
    Io(IoError),
    /// Artifact (de)serialization failed.
    #[fail(display = "artifact serialization: {}", _0)]
    Json(JsonError)
}
impl_from_for_error!(SchaetzerError,
                     IoError => Io,
                     JsonError => Json);
