//! Fetching a track's audio ahead of binding it to the element.

use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::runtime::Handle;
use tracing::debug;

use crate::api::Track;

use super::error::PrefetchError;
use super::types::PlayerCmd;

/// Why a fetch was issued. A load first prefetches into a blob; when that
/// fails the same request id fetches the stream for the fallback source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPurpose {
    Prefetch,
    Stream,
}

/// One fetch issued by the engine. `request_id` increases with every
/// `load_and_play`; only the completion matching the latest id is used.
#[derive(Debug, Clone)]
pub struct PrefetchRequest {
    pub request_id: u64,
    pub purpose: FetchPurpose,
    pub track: Track,
    pub url: String,
}

#[derive(Debug)]
pub struct PrefetchOutcome {
    pub request_id: u64,
    pub purpose: FetchPurpose,
    pub result: Result<Arc<[u8]>, PrefetchError>,
}

impl PrefetchOutcome {
    /// The command that carries this outcome back to the player thread.
    pub fn into_cmd(self) -> PlayerCmd {
        match self.purpose {
            FetchPurpose::Prefetch => PlayerCmd::Prefetched(self),
            FetchPurpose::Stream => PlayerCmd::StreamLoaded(self),
        }
    }
}

/// Starts fetches. Completion is delivered later as `PlayerCmd::Prefetched`
/// or `PlayerCmd::StreamLoaded`, never from inside `start`.
pub trait Prefetcher {
    fn start(&mut self, request: PrefetchRequest);
}

/// Whether a response with this `Content-Type` can be handed to the decoder.
///
/// Accepts `audio/*` and `application/octet-stream`, ignoring parameters and
/// case. A missing header is not playable.
pub fn is_playable_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("audio/") || essence == "application/octet-stream"
}

/// GET `url` and return its body if it is audio.
pub async fn fetch_audio(
    http: &Client,
    url: &str,
    timeout: Duration,
) -> Result<Arc<[u8]>, PrefetchError> {
    let response = http.get(url).timeout(timeout).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(PrefetchError::Status(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !is_playable_content_type(&content_type) {
        return Err(PrefetchError::NotAudio(content_type));
    }

    let body = response.bytes().await?;
    debug!(url = %url, bytes = body.len(), content_type = %content_type, "Fetched audio");
    Ok(Arc::from(body.as_ref()))
}

/// Runs prefetches on the tokio runtime and posts the outcome back to the
/// player's command queue.
pub struct HttpPrefetcher {
    http: Client,
    runtime: Handle,
    timeout: Duration,
    reply: Sender<PlayerCmd>,
}

impl HttpPrefetcher {
    pub fn new(http: Client, runtime: Handle, timeout: Duration, reply: Sender<PlayerCmd>) -> Self {
        Self {
            http,
            runtime,
            timeout,
            reply,
        }
    }
}

impl Prefetcher for HttpPrefetcher {
    fn start(&mut self, request: PrefetchRequest) {
        let http = self.http.clone();
        let reply = self.reply.clone();
        let timeout = self.timeout;

        debug!(
            request_id = request.request_id,
            purpose = ?request.purpose,
            track_id = %request.track.id,
            url = %request.url,
            "Fetch started"
        );
        self.runtime.spawn(async move {
            let result = fetch_audio(&http, &request.url, timeout).await;
            let outcome = PrefetchOutcome {
                request_id: request.request_id,
                purpose: request.purpose,
                result,
            };
            // The player may have quit meanwhile.
            let _ = reply.send(outcome.into_cmd());
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn playable_content_types() {
        assert!(is_playable_content_type("audio/mpeg"));
        assert!(is_playable_content_type("Audio/Ogg; codecs=vorbis"));
        assert!(is_playable_content_type("application/octet-stream"));
        assert!(!is_playable_content_type("text/html; charset=utf-8"));
        assert!(!is_playable_content_type("application/json"));
        assert!(!is_playable_content_type(""));
    }

    async fn serve(status: u16, content_type: &str, body: &'static [u8]) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tracks/1/stream"))
            .respond_with(
                ResponseTemplate::new(status)
                    .insert_header("content-type", content_type)
                    .set_body_bytes(body),
            )
            .mount(&server)
            .await;
        server
    }

    fn stream_url(server: &MockServer) -> String {
        format!("{}/api/tracks/1/stream", server.uri())
    }

    #[tokio::test]
    async fn fetch_audio_returns_body_for_audio() {
        let server = serve(200, "audio/mpeg", b"ID3 bytes").await;
        let data = fetch_audio(&Client::new(), &stream_url(&server), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(&data[..], b"ID3 bytes");
    }

    #[tokio::test]
    async fn fetch_audio_rejects_html() {
        let server = serve(200, "text/html", b"<html>login</html>").await;
        let err = fetch_audio(&Client::new(), &stream_url(&server), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, PrefetchError::NotAudio(ct) if ct == "text/html"));
    }

    #[tokio::test]
    async fn fetch_audio_reports_status() {
        let server = serve(404, "application/json", b"{}").await;
        let err = fetch_audio(&Client::new(), &stream_url(&server), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, PrefetchError::Status(404)));
    }

    fn request(server: &MockServer, request_id: u64, purpose: FetchPurpose) -> PrefetchRequest {
        PrefetchRequest {
            request_id,
            purpose,
            track: serde_json::from_value(serde_json::json!({ "track_id": 1, "title": "One" }))
                .unwrap(),
            url: stream_url(server),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn http_prefetcher_posts_outcome_to_queue() {
        let server = serve(200, "application/octet-stream", b"raw").await;
        let (tx, rx) = mpsc::channel();
        let mut prefetcher = HttpPrefetcher::new(
            Client::new(),
            Handle::current(),
            Duration::from_secs(5),
            tx,
        );

        prefetcher.start(request(&server, 7, FetchPurpose::Prefetch));

        let cmd = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();
        match cmd {
            PlayerCmd::Prefetched(outcome) => {
                assert_eq!(outcome.request_id, 7);
                assert_eq!(outcome.purpose, FetchPurpose::Prefetch);
                assert_eq!(&outcome.result.unwrap()[..], b"raw");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stream_fetch_returns_as_stream_loaded() {
        let server = serve(404, "application/json", b"{}").await;
        let (tx, rx) = mpsc::channel();
        let mut prefetcher = HttpPrefetcher::new(
            Client::new(),
            Handle::current(),
            Duration::from_secs(5),
            tx,
        );

        // Returns before the request has been answered.
        prefetcher.start(request(&server, 3, FetchPurpose::Stream));

        let cmd = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();
        match cmd {
            PlayerCmd::StreamLoaded(outcome) => {
                assert_eq!(outcome.request_id, 3);
                assert!(matches!(outcome.result, Err(PrefetchError::Status(404))));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
