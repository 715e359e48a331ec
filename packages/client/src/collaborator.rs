//! Capture and render collaborators.
//!
//! The relay never interprets frame bytes. Producing them (screen capture
//! plus image encoding) and consuming them (decoding plus display) is left to
//! implementations of these traits.

use std::{fs, path::Path};

use crate::error::ClientError;

/// Supplies one encoded frame on demand.
#[cfg_attr(test, mockall::automock)]
pub trait FrameCapture: Send {
    fn capture_frame(&mut self) -> Result<Vec<u8>, ClientError>;
}

/// Consumes frames received while watching.
#[cfg_attr(test, mockall::automock)]
pub trait FrameRenderer: Send {
    fn render_frame(&mut self, frame: &[u8]) -> Result<(), ClientError>;

    /// Called when the stream ends.
    fn close(&mut self) {}
}

/// Replays the contents of one file (e.g. an encoded image) as every frame.
#[derive(Debug, Clone)]
pub struct FileFrameCapture {
    frame: Vec<u8>,
}

impl FileFrameCapture {
    pub fn open(path: &Path) -> Result<Self, ClientError> {
        let frame = fs::read(path).map_err(|e| {
            ClientError::Collaborator(format!("failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self { frame })
    }
}

impl FrameCapture for FileFrameCapture {
    fn capture_frame(&mut self) -> Result<Vec<u8>, ClientError> {
        Ok(self.frame.clone())
    }
}

/// Capture used when no source is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

impl FrameCapture for NoCapture {
    fn capture_frame(&mut self) -> Result<Vec<u8>, ClientError> {
        Err(ClientError::Collaborator(
            "no capture source configured (use --share-file)".to_string(),
        ))
    }
}

/// Logs frame sizes instead of displaying them.
#[derive(Debug, Default)]
pub struct LoggingRenderer {
    frames: u64,
    bytes: u64,
}

impl LoggingRenderer {
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameRenderer for LoggingRenderer {
    fn render_frame(&mut self, frame: &[u8]) -> Result<(), ClientError> {
        self.frames += 1;
        self.bytes += frame.len() as u64;
        tracing::debug!("Frame #{} ({} bytes)", self.frames, frame.len());
        Ok(())
    }

    fn close(&mut self) {
        tracing::info!(
            "Stream closed after {} frames ({} bytes)",
            self.frames,
            self.bytes
        );
        self.frames = 0;
        self.bytes = 0;
    }
}
