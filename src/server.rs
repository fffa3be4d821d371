use crate::detect::Detector;
use crate::error::DetectError;
use crate::types::DetectionRequest;
use bytes::Buf;
use futures::{pin_mut, StreamExt};
use log::{debug, error, info, warn};
use serde_json::json;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::{Filter, Rejection, Reply};

pub async fn run(detector: Detector, port: u16, max_upload_bytes: u64) {
    info!("Listening on 0.0.0.0:{}", port);
    warp::serve(routes(detector, max_upload_bytes))
        .run(([0, 0, 0, 0], port))
        .await;
}

/// `POST /detect`, with every rejection rendered as a JSON error.
pub fn routes(
    detector: Detector,
    max_upload_bytes: u64,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    warp::post()
        .and(warp::path!("detect"))
        .and(warp::multipart::form().max_length(max_upload_bytes))
        .and(warp::any().map(move || detector.clone()))
        .and_then(handle_detect)
        .recover(handle_rejection)
}

async fn handle_detect(form: FormData, detector: Detector) -> Result<impl Reply, Rejection> {
    let result = match read_form(form).await {
        Ok(request) => detector.detect(request).await,
        Err(e) => Err(e),
    };
    Ok(match result {
        Ok(detection) => warp::reply::with_status(warp::reply::json(&detection), StatusCode::OK),
        Err(e) => {
            if e.status().is_server_error() {
                error!("Error handling detection: {}", e);
            } else {
                warn!("Rejected detection request: {}", e);
            }
            error_reply(e.status(), &e.to_string())
        }
    })
}

async fn read_form(form: FormData) -> Result<DetectionRequest, DetectError> {
    let mut request = DetectionRequest::default();
    pin_mut!(form);
    while let Some(part) = form.next().await {
        let part = part.map_err(|e| DetectError::MalformedForm(e.to_string()))?;
        debug!("Got part {}", part.name());
        match part.name() {
            // Only a file upload counts as the image; a plain text field does not.
            "image" if part.filename().is_some() => {
                request.image = Some(read_part(part).await?);
            }
            "road" => {
                let data = read_part(part).await?;
                request.road = Some(String::from_utf8_lossy(&data).into_owned());
            }
            _ => {
                warn!("Ignoring part {}", part.name());
            }
        }
    }
    Ok(request)
}

async fn read_part(part: Part) -> Result<Vec<u8>, DetectError> {
    let mut data: Vec<u8> = vec![];
    let stream = part.stream();
    pin_mut!(stream);
    while let Some(buf) = stream.next().await {
        let buf = buf.map_err(|e| DetectError::MalformedForm(e.to_string()))?;
        data.extend_from_slice(buf.chunk());
    }
    Ok(data)
}

fn error_reply(status: StatusCode, message: &str) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&json!({ "error": message })), status)
}

async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "upload too large".to_string())
    } else if rejection.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "content-length required".to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        warn!("Rejected request: {:?}", rejection);
        (
            StatusCode::BAD_REQUEST,
            "expected a multipart/form-data upload".to_string(),
        )
    };
    Ok(error_reply(status, &message))
}
