use crate::decode::{ChannelOrder, Frame};
use failure::Error;
use log::{debug, info};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::Path;

/// An OCR engine. Implementations are loaded once and shared read-only
/// between concurrent requests.
pub trait TextExtractor: Send + Sync {
    /// Channel order `extract` expects its frames in.
    fn channel_order(&self) -> ChannelOrder;

    /// Recognized text fragments, in the engine's detection order.
    fn extract(&self, frame: &Frame) -> Result<Vec<String>, Error>;
}

/// Pure-Rust OCR over the `ocrs` detection and recognition models.
pub struct OcrsExtractor {
    engine: OcrEngine,
}

impl OcrsExtractor {
    pub fn load(detection: &Path, recognition: &Path) -> Result<OcrsExtractor, Error> {
        info!(
            "Loading OCR models from {:?} and {:?}",
            detection, recognition
        );
        let detection_model = Model::load_file(detection)
            .map_err(|e| format_err!("Unable to load detection model {:?}: {}", detection, e))?;
        let recognition_model = Model::load_file(recognition).map_err(|e| {
            format_err!("Unable to load recognition model {:?}: {}", recognition, e)
        })?;
        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| format_err!("Unable to create OCR engine: {}", e))?;
        Ok(OcrsExtractor { engine })
    }
}

impl TextExtractor for OcrsExtractor {
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }

    fn extract(&self, frame: &Frame) -> Result<Vec<String>, Error> {
        if frame.order() != ChannelOrder::Rgb {
            return Err(format_err!("ocrs needs RGB frames, got {:?}", frame.order()));
        }
        let source = ImageSource::from_bytes(frame.data(), frame.dimensions())
            .map_err(|e| format_err!("Unusable frame: {}", e))?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|e| format_err!("{}", e))?;
        let words = self
            .engine
            .detect_words(&input)
            .map_err(|e| format_err!("{}", e))?;
        let lines = self.engine.find_text_lines(&input, &words);
        let texts = self
            .engine
            .recognize_text(&input, &lines)
            .map_err(|e| format_err!("{}", e))?;
        let fragments: Vec<String> = texts
            .iter()
            .flatten()
            .map(|line| line.to_string())
            .filter(|line| !line.trim().is_empty())
            .collect();
        debug!(
            "Recognized {} of {} text lines ({} words)",
            fragments.len(),
            lines.len(),
            words.len()
        );
        Ok(fragments)
    }
}
