//! Media source abstractions for the monitor engine.
//!
//! The camera/microphone pair is an external collaborator: the engine only
//! consumes raster snapshots and frequency-magnitude buffers through the
//! [MediaSource] trait, and acquires/releases the underlying handles via
//! `start`/`stop`.

use crate::error::MediaError;

mod raster;
mod spectrum;
mod synthetic;

pub use raster::RasterFrame;
pub use spectrum::{SpectrumAnalyzer, SpectrumFrame, SPECTRUM_BIN_MAX};
pub use synthetic::SyntheticMediaSource;

/// Trait implemented by camera/microphone providers.
///
/// Implementations own the platform handles; the engine guarantees `start`
/// is called before any capture and `stop` on every session exit path.
pub trait MediaSource: Send + Sync {
    /// Acquire the capture devices. Fails without creating session state.
    fn start(&self) -> Result<(), MediaError>;

    /// Release the capture devices.
    fn stop(&self) -> Result<(), MediaError>;

    /// Pull a fixed-resolution RGBA snapshot of the video track.
    fn capture_frame(&self) -> Result<RasterFrame, MediaError>;

    /// Pull the current frequency-magnitude buffer of the audio track.
    fn capture_spectrum(&self) -> Result<SpectrumFrame, MediaError>;
}
