use std::io;
use std::num::TryFromIntError;
use quick_error::quick_error;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        /// Internal error
        ThreadSend {
            display("Internal error; unexpectedly aborted")
        }
        Aborted {
            display("aborted")
        }
        InvalidGrid(msg: String) {
            display("Invalid grid: {}", msg)
        }
        /// Cropped frame is empty or inverted
        InvalidCrop(width: f64, height: f64) {
            display("Crop exceeds cell size: cropped frame would be {:.1}×{:.1}px. Reduce crop top/bottom or left/right", width, height)
        }
        NegativeCrop {
            display("Crop margins must be zero or positive")
        }
        InvalidScale(scale: f64) {
            display("Scale must be a positive number, got {}", scale)
        }
        InvalidFps(fps: f64) {
            display("Frame rate must be a positive number, got {}", fps)
        }
        InvalidTolerance(tolerance: f64) {
            display("Tolerance must be between 0 and 100, got {}", tolerance)
        }
        InvalidColor(msg: String) {
            display("Invalid transparent color: {}", msg)
        }
        EmptySequence {
            display("No frames left to render: every frame is excluded or beyond the frame count")
        }
        CanvasAllocation(msg: String) {
            display("Can't create canvas: {}", msg)
        }
        Gif(err: gif::EncodingError) {
            display("GIF encoding error: {}", err)
        }
        Io(err: io::Error) {
            from()
            from(_oom: std::collections::TryReserveError) -> (io::ErrorKind::OutOfMemory.into())
            display("I/O: {}", err)
        }
        PNG(msg: String) {
            display("{}", msg)
        }
        WrongSize(msg: String) {
            display("{}", msg)
            from(e: TryFromIntError) -> (e.to_string())
            from(e: resize::Error) -> (e.to_string())
        }
        Quant(liq: imagequant::Error) {
            from()
            display("pngquant error: {}", liq)
        }
    }
}

pub type GifResult<T, E = Error> = Result<T, E>;

impl From<gif::EncodingError> for Error {
    #[cold]
    fn from(err: gif::EncodingError) -> Self {
        match err {
            gif::EncodingError::Io(err) => err.into(),
            other => Error::Gif(other),
        }
    }
}

impl<T> From<crossbeam_channel::SendError<T>> for Error {
    #[cold]
    fn from(_: crossbeam_channel::SendError<T>) -> Self {
        Self::ThreadSend
    }
}

impl From<crossbeam_channel::RecvError> for Error {
    #[cold]
    fn from(_: crossbeam_channel::RecvError) -> Self {
        Self::Aborted
    }
}
