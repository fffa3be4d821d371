use crate::auth::TokenSource;
use crate::error::DetectError;
use crate::roads::Road;
use crate::types::FlagRecord;
use futures::future::{BoxFuture, FutureExt};
use log::info;
use url::Url;

/// Writes a road's ambulance flag somewhere downstream signal logic reads it.
pub trait FlagPublisher: Send + Sync {
    /// Overwrites the road's flag record. Never reads the previous value.
    fn publish<'a>(&'a self, road: &'a Road, detected: bool) -> BoxFuture<'a, Result<(), DetectError>>;
}

/// Firebase Realtime Database over its REST API.
pub struct FirebasePublisher {
    client: reqwest::Client,
    database_url: Url,
    tokens: TokenSource,
}

impl FirebasePublisher {
    pub fn new(client: reqwest::Client, database_url: Url, tokens: TokenSource) -> FirebasePublisher {
        FirebasePublisher {
            client,
            database_url,
            tokens,
        }
    }

    async fn put(&self, road: &Road, record: FlagRecord) -> Result<(), DetectError> {
        let token = self
            .tokens
            .token()
            .await
            .map_err(|e| DetectError::FlagWrite(e.to_string()))?;
        let url = record_url(&self.database_url, &road.path)
            .map_err(|e| DetectError::FlagWrite(e.to_string()))?;
        // The token travels in a header so it can never surface in a URL.
        let response = self
            .client
            .put(url)
            .bearer_auth(&token)
            .json(&record)
            .send()
            .await
            .map_err(|e| {
                DetectError::FlagWrite(format!("request to database failed: {}", e.without_url()))
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectError::FlagWrite(format!(
                "database returned {}: {}",
                status, body
            )));
        }
        info!("Set {} to {:?}", road.path, record.flag);
        Ok(())
    }
}

impl FlagPublisher for FirebasePublisher {
    fn publish<'a>(&'a self, road: &'a Road, detected: bool) -> BoxFuture<'a, Result<(), DetectError>> {
        self.put(road, FlagRecord::new(detected)).boxed()
    }
}

/// REST location of a record: `<database>/<path>.json`.
pub fn record_url(database_url: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = database_url.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.set_query(None);
    base.join(&format!("{}.json", path.trim_matches('/')))
}
