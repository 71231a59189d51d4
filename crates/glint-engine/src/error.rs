use thiserror::Error;

use crate::render::{BackendError, FontHandle};

/// Errors reported by the overlay layer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("backend: {0}")]
    Backend(#[from] BackendError),

    #[error("could not resolve font family `{family}`: {reason}")]
    FontResolution { family: String, reason: String },

    #[error("font atlas would need {width}x{height}, above the {max}x{max} limit")]
    AtlasTooLarge { width: u32, height: u32, max: u32 },

    #[error("glyphs do not fit into the estimated atlas")]
    AtlasOverflow,

    #[error("unknown font handle {0:?}")]
    UnknownFont(FontHandle),

    #[error("`{op}` called while {state}")]
    InvalidState { op: &'static str, state: &'static str },

    #[error("font `{family}` has no atlas (device lost or not initialized)")]
    FontNotReady { family: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
