use warp::http::StatusCode;

/// Everything that can go wrong while handling one `/detect` request.
#[derive(Debug, Fail)]
pub enum DetectError {
    #[fail(display = "no image provided")]
    MissingImage,
    #[fail(display = "missing or invalid road parameter")]
    InvalidRoad,
    #[fail(display = "malformed form data: {}", _0)]
    MalformedForm(String),
    #[fail(display = "invalid image data: {}", _0)]
    InvalidImage(String),
    #[fail(display = "OCR processing failed: {}", _0)]
    Ocr(String),
    #[fail(display = "flag update failed: {}", _0)]
    FlagWrite(String),
}

impl DetectError {
    pub fn status(&self) -> StatusCode {
        match self {
            DetectError::MissingImage | DetectError::InvalidRoad | DetectError::MalformedForm(_) => {
                StatusCode::BAD_REQUEST
            }
            DetectError::InvalidImage(_) | DetectError::Ocr(_) | DetectError::FlagWrite(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Startup failures; the process does not serve with any of these.
#[derive(Debug, Fail)]
pub enum ConfigError {
    #[fail(display = "missing required environment variable {}", _0)]
    Missing(&'static str),
    #[fail(display = "invalid value for {}: {}", name, reason)]
    Invalid { name: &'static str, reason: String },
}
