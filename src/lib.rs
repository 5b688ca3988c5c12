// Library root
// -----------
// The binary (`main.rs`) is a thin clap front end over these modules.
//
// Module responsibilities:
// - `api`: blocking HTTP access to the photo-hosting listing endpoint and
//   to the image URLs it returns.
// - `gallery`: pagination, sequential download and the JSON manifest.
// - `config`: the immutable description of the collection being fetched.
// - `publish`: git commit/push and the deployment trigger.
// - `ui`: prompts, progress bar and run summary.
// - `error`: the library error type.
pub mod api;
pub mod config;
pub mod error;
pub mod gallery;
pub mod publish;
pub mod ui;

pub use error::{Error, Result};
