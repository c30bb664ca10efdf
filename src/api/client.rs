/// HTTP client for the incident service
///
/// Wire format:
/// - `GET  {base}/events?latitude=<f>&longitude=<f>` returns a JSON array of events
/// - `POST {base}/upload` takes a multipart body with `title`, `tags`, `lat`,
///   `long` and an optional `image` file
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use tracing::{debug, info};

use super::EventApi;
use crate::error::{Error, Result};
use crate::state::data::{Coordinate, Event};
use crate::state::draft::ReportSubmission;

#[derive(Debug, Clone)]
pub struct HttpEventApi {
    client: Client,
    events_url: Url,
    upload_url: Url,
}

impl HttpEventApi {
    /// Build a client for the service at `base_url`
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        Ok(Self {
            client,
            events_url: endpoint(base, "events")?,
            upload_url: endpoint(base, "upload")?,
        })
    }
}

fn endpoint(base: &str, path: &str) -> Result<Url> {
    let url = format!("{base}/{path}");
    Url::parse(&url).map_err(|e| Error::Url {
        url,
        message: e.to_string(),
    })
}

#[async_trait]
impl EventApi for HttpEventApi {
    async fn events_near(&self, at: Coordinate) -> Result<Vec<Event>> {
        debug!(latitude = at.latitude, longitude = at.longitude, "fetching events");

        let response = self
            .client
            .get(self.events_url.clone())
            .query(&[("latitude", at.latitude), ("longitude", at.longitude)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                endpoint: "events",
                status,
            });
        }

        let events: Vec<Event> = response.json().await?;
        info!(count = events.len(), "fetched events");
        Ok(events)
    }

    async fn upload(&self, report: &ReportSubmission) -> Result<()> {
        let mut form = Form::new()
            .text("title", report.title.clone())
            .text("tags", report.tags.clone())
            .text("lat", report.target.latitude.to_string())
            .text("long", report.target.longitude.to_string());

        if let Some(attachment) = &report.attachment {
            let bytes = tokio::fs::read(&attachment.path).await?;
            debug!(
                file = %attachment.path.display(),
                size = bytes.len(),
                mime = attachment.mime,
                "attaching media"
            );
            let part = Part::bytes(bytes)
                .file_name(attachment.file_name.clone())
                .mime_str(attachment.mime)?;
            form = form.part("image", part);
        }

        let response = self
            .client
            .post(self.upload_url.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                endpoint: "upload",
                status,
            });
        }

        info!(title = %report.title, "uploaded report");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::draft::Attachment;
    use axum::extract::{Multipart, Query, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// A multipart field as the server saw it: name, file name, content type, body
    type Received = (String, Option<String>, Option<String>, Vec<u8>);

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn list_events(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        Json(serde_json::json!([{
            "_id": "e1",
            "title": format!("near {}", params["latitude"]),
            "imagePath": "uploads/e1.jpg",
            "tags": "Roadblock",
            "location": { "type": "Point", "coordinates": [params["longitude"].parse::<f64>().unwrap(), 1.5] },
            "createdAt": "2024-05-24T09:15:00Z"
        }]))
    }

    async fn record_upload(
        State(received): State<Arc<Mutex<Vec<Received>>>>,
        mut multipart: Multipart,
    ) -> StatusCode {
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let body = field.bytes().await.unwrap().to_vec();
            received.lock().unwrap().push((name, file_name, content_type, body));
        }
        StatusCode::CREATED
    }

    fn api(base: &str) -> HttpEventApi {
        HttpEventApi::new(Client::new(), base).unwrap()
    }

    #[tokio::test]
    async fn test_events_near_sends_coordinates() {
        let base = serve(Router::new().route("/events", get(list_events))).await;

        let events = api(&base)
            .events_near(Coordinate::new(30.3165, 78.0322))
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "near 30.3165");
        assert_eq!(events[0].coordinate(), Some(Coordinate::new(1.5, 78.0322)));
    }

    #[tokio::test]
    async fn test_events_near_rejects_error_status() {
        let router = Router::new().route(
            "/events",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = serve(router).await;

        let err = api(&base)
            .events_near(Coordinate::new(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Status { endpoint: "events", status } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn test_events_near_rejects_malformed_body() {
        let router = Router::new().route("/events", get(|| async { "not json" }));
        let base = serve(router).await;

        let result = api(&base).events_near(Coordinate::new(0.0, 0.0)).await;
        assert!(matches!(result, Err(Error::Http(_))));
    }

    #[tokio::test]
    async fn test_upload_sends_fields_and_image() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/upload", post(record_upload))
            .with_state(received.clone());
        let base = serve(router).await;

        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("IMG_0001.jpg");
        std::fs::write(&media, b"fake jpeg bytes").unwrap();

        let report = ReportSubmission {
            title: "Tree down".to_string(),
            tags: "Roadblock".to_string(),
            target: Coordinate::new(30.5, 78.25),
            attachment: Some(Attachment::for_path(media)),
        };
        api(&format!("{base}/")).upload(&report).await.unwrap();

        let fields = received.lock().unwrap().clone();
        let text = |name: &str| {
            fields
                .iter()
                .find(|f| f.0 == name)
                .map(|f| String::from_utf8(f.3.clone()).unwrap())
        };
        assert_eq!(text("title").as_deref(), Some("Tree down"));
        assert_eq!(text("tags").as_deref(), Some("Roadblock"));
        assert_eq!(text("lat").as_deref(), Some("30.5"));
        assert_eq!(text("long").as_deref(), Some("78.25"));

        let image = fields.iter().find(|f| f.0 == "image").unwrap();
        assert_eq!(image.1.as_deref(), Some("photo.jpg"));
        assert_eq!(image.2.as_deref(), Some("image/jpeg"));
        assert_eq!(image.3, b"fake jpeg bytes");
    }

    #[tokio::test]
    async fn test_upload_failure_status() {
        let router = Router::new().route("/upload", post(|| async { StatusCode::BAD_REQUEST }));
        let base = serve(router).await;

        let report = ReportSubmission {
            title: "t".to_string(),
            tags: "Fire".to_string(),
            target: Coordinate::new(0.0, 0.0),
            attachment: None,
        };
        let err = api(&base).upload(&report).await.unwrap_err();
        assert!(matches!(err, Error::Status { endpoint: "upload", .. }));
    }

    #[tokio::test]
    async fn test_upload_missing_media_fails_before_sending() {
        let report = ReportSubmission {
            title: "t".to_string(),
            tags: "Fire".to_string(),
            target: Coordinate::new(0.0, 0.0),
            attachment: Some(Attachment::for_path("/nonexistent/clip.mp4".into())),
        };
        // Port 9 is never contacted: reading the file fails first
        let err = api("http://127.0.0.1:9").upload(&report).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            HttpEventApi::new(Client::new(), "::nope::"),
            Err(Error::Url { .. })
        ));
    }
}
