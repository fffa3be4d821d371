use crate::classify;
use crate::decode;
use crate::error::DetectError;
use crate::firebase::FlagPublisher;
use crate::ocr::TextExtractor;
use crate::roads::RoadTable;
use crate::types::{DetectionRequest, DetectionResult};
use log::{debug, info};
use std::sync::Arc;

/// validate → decode → extract → classify → publish, one request at a time.
/// Cheap to clone; every clone shares the same engine and publisher.
#[derive(Clone)]
pub struct Detector {
    roads: Arc<RoadTable>,
    extractor: Arc<dyn TextExtractor>,
    publisher: Arc<dyn FlagPublisher>,
}

impl Detector {
    pub fn new(
        roads: RoadTable,
        extractor: Arc<dyn TextExtractor>,
        publisher: Arc<dyn FlagPublisher>,
    ) -> Detector {
        Detector {
            roads: Arc::new(roads),
            extractor,
            publisher,
        }
    }

    pub async fn detect(&self, request: DetectionRequest) -> Result<DetectionResult, DetectError> {
        let image = request.image.ok_or(DetectError::MissingImage)?;
        let road = request
            .road
            .as_deref()
            .and_then(|r| self.roads.resolve(r))
            .ok_or(DetectError::InvalidRoad)?;
        debug!("Processing {} byte image for road {}", image.len(), road.id);

        let text = self.extract_text(image).await?;
        let ambulance_detected = classify::contains_keyword(&text);
        info!(
            "Road {}: ambulance {} in {:?}",
            road.id,
            if ambulance_detected { "detected" } else { "not detected" },
            text
        );

        self.publisher.publish(road, ambulance_detected).await?;

        Ok(DetectionResult {
            extracted_text: text,
            ambulance_detected,
            road: road.id.clone(),
        })
    }

    /// Decoding and OCR are CPU-bound; they run on the blocking pool.
    async fn extract_text(&self, image: Vec<u8>) -> Result<String, DetectError> {
        let extractor = self.extractor.clone();
        tokio::task::spawn_blocking(move || -> Result<String, DetectError> {
            let frame = decode::decode(&image, extractor.channel_order())?;
            let fragments = extractor
                .extract(&frame)
                .map_err(|e| DetectError::Ocr(e.to_string()))?;
            Ok(classify::extracted_text(&fragments))
        })
        .await
        .map_err(|e| DetectError::Ocr(e.to_string()))?
    }
}
