use futures_util::Stream;
use image::GrayImage;
use serde::Serialize;
use thiserror::Error;

use crate::services::scanner::{ScanResult, ScannerAdapter};

/// Camera lifecycle, shared by every scanner view
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CameraState {
    Unchecked,
    Checking,
    Supported,
    Denied,
    Active,
    Inactive,
    Error,
}

/// Platform camera failures, classified so each gets actionable guidance
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CameraError {
    #[error(
        "Camera access was denied. Allow camera access in your browser settings (lock icon in the address bar), then reload the page."
    )]
    PermissionDenied,
    #[error("No camera was found on this device.")]
    NotFound,
    #[error("The camera is already in use by another application.")]
    InUse,
    #[error("The requested camera settings are not supported by this camera.")]
    Overconstrained,
    #[error("Camera access requires HTTPS or localhost.")]
    InsecureContext,
    #[error("This browser does not support camera access.")]
    Unsupported,
    #[error("Camera error: {0}")]
    Other(String),
    #[error("Cannot {action} the camera while it is {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: CameraState,
    },
}

impl CameraError {
    /// Classify a platform error by its name
    pub fn from_platform(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => {
                CameraError::PermissionDenied
            }
            "NotFoundError" | "DevicesNotFoundError" => CameraError::NotFound,
            "NotReadableError" | "TrackStartError" => CameraError::InUse,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => CameraError::Overconstrained,
            "TypeError" => CameraError::InsecureContext,
            _ => CameraError::Other(message.to_string()),
        }
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, CameraError::PermissionDenied)
    }
}

/// An open camera stream
pub trait CameraStream: Send {
    /// Next captured frame; `None` once the stream has ended
    fn next_frame(&mut self) -> Option<Result<GrayImage, CameraError>>;

    /// Release the underlying device
    fn release(&mut self);
}

/// Access to the device's camera
pub trait CameraDevice: Send {
    type Stream: CameraStream;

    /// Ask for permission and confirm a camera exists
    fn probe(&mut self) -> Result<(), CameraError>;

    fn open(&mut self) -> Result<Self::Stream, CameraError>;
}

/// A camera that lives on the client. The probe replays the outcome the
/// client reported, and frames arrive separately, one request at a time.
pub struct ReportedCamera {
    failure: Option<CameraError>,
}

impl ReportedCamera {
    pub fn new(failure: Option<CameraError>) -> Self {
        Self { failure }
    }
}

pub struct ReportedStream;

impl CameraStream for ReportedStream {
    fn next_frame(&mut self) -> Option<Result<GrayImage, CameraError>> {
        None
    }

    fn release(&mut self) {}
}

impl CameraDevice for ReportedCamera {
    type Stream = ReportedStream;

    fn probe(&mut self) -> Result<(), CameraError> {
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn open(&mut self) -> Result<ReportedStream, CameraError> {
        Ok(ReportedStream)
    }
}

/// Drives one camera through its lifecycle and decodes its frames
pub struct CameraSession<D: CameraDevice> {
    device: D,
    scanner: ScannerAdapter,
    state: CameraState,
    stream: Option<D::Stream>,
    last_error: Option<CameraError>,
    autostart: bool,
}

impl<D: CameraDevice> CameraSession<D> {
    pub fn new(device: D, scanner: ScannerAdapter, autostart: bool) -> Self {
        Self {
            device,
            scanner,
            state: CameraState::Unchecked,
            stream: None,
            last_error: None,
            autostart,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn last_error(&self) -> Option<&CameraError> {
        self.last_error.as_ref()
    }

    fn fail(&mut self, error: CameraError) -> CameraError {
        self.state = if error.is_permission() {
            CameraState::Denied
        } else {
            CameraState::Error
        };
        log::warn!("Camera unavailable: {}", error);
        self.last_error = Some(error.clone());
        error
    }

    /// Check for permission. Starts the camera right away when autostart
    /// is configured.
    pub fn check(&mut self) -> Result<CameraState, CameraError> {
        match self.state {
            CameraState::Unchecked | CameraState::Denied | CameraState::Error => {}
            state => {
                return Err(CameraError::InvalidTransition {
                    action: "check",
                    state,
                });
            }
        }

        self.state = CameraState::Checking;
        if let Err(e) = self.device.probe() {
            return Err(self.fail(e));
        }
        self.state = CameraState::Supported;
        self.last_error = None;

        if self.autostart {
            self.start()?;
        }
        Ok(self.state)
    }

    pub fn start(&mut self) -> Result<(), CameraError> {
        match self.state {
            CameraState::Active => return Ok(()),
            CameraState::Supported | CameraState::Inactive => {}
            state => {
                return Err(CameraError::InvalidTransition {
                    action: "start",
                    state,
                });
            }
        }

        match self.device.open() {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state = CameraState::Active;
                log::info!("Camera started");
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Stop scanning. The device is released before the state changes.
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
        if self.state == CameraState::Active {
            self.state = CameraState::Inactive;
            log::info!("Camera stopped");
        }
    }

    /// Pull frames until one decodes. Misses are skipped silently; a
    /// stream error moves the session to `Error`.
    pub fn next_result(&mut self) -> Option<ScanResult> {
        loop {
            let frame = self.stream.as_mut()?.next_frame();
            match frame {
                Some(Ok(frame)) => {
                    if let Some(result) = self.scanner.scan_frame(frame) {
                        return Some(result);
                    }
                }
                Some(Err(e)) => {
                    if let Some(mut stream) = self.stream.take() {
                        stream.release();
                    }
                    self.fail(e);
                    return None;
                }
                None => {
                    self.stop();
                    return None;
                }
            }
        }
    }

    /// Decoded results as a lazy stream
    pub fn results(&mut self) -> impl Stream<Item = ScanResult> + '_ {
        futures_util::stream::poll_fn(move |_| std::task::Poll::Ready(self.next_result()))
    }
}

impl<D: CameraDevice> Drop for CameraSession<D> {
    fn drop(&mut self) {
        self.stop();
    }
}
