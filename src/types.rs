use serde::Serialize;

/// One upload to `/detect`, as read off the multipart form.
#[derive(Debug, Default)]
pub struct DetectionRequest {
    pub image: Option<Vec<u8>>,
    pub road: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    pub extracted_text: String,
    pub ambulance_detected: bool,
    pub road: String,
}

/// Body written over a road's flag record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagRecord {
    #[serde(rename = "fa")]
    pub flag: &'static str,
}

impl FlagRecord {
    pub fn new(detected: bool) -> FlagRecord {
        FlagRecord {
            flag: if detected { "1" } else { "0" },
        }
    }
}
