use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::types::LikedTracks;
use super::*;

fn track_json(id: i64, title: &str) -> serde_json::Value {
    json!({
        "track_id": id,
        "title": title,
        "artist_id": 3,
        "artist_name": "Nina",
        "album_id": null,
        "album_title": null,
        "duration": "00:03:30",
        "duration_seconds": 210,
        "likes_count": 2,
        "is_liked_by_user": false,
        "file_path": "song.mp3"
    })
}

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

async fn signed_in(server: &MockServer) -> ApiClient {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "user_id": 7, "username": "ada", "email": "ada@example.com" },
            "token": "tok-123"
        })))
        .mount(server)
        .await;

    let client = client_for(server);
    client.login("ada@example.com", "Secret123").await.unwrap();
    client
}

#[test]
fn new_rejects_empty_and_schemeless_urls() {
    assert!(matches!(
        ApiClient::new("", Duration::from_secs(1)),
        Err(ApiError::InvalidUrl(_))
    ));
    assert!(matches!(
        ApiClient::new("localhost:5000", Duration::from_secs(1)),
        Err(ApiError::InvalidUrl(_))
    ));
}

#[test]
fn stream_endpoint_is_derived_from_track_id() {
    let client = ApiClient::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
    assert_eq!(client.base_url(), "http://localhost:5000");
    assert_eq!(
        client.stream_endpoints().stream_url(TrackId(42)),
        "http://localhost:5000/api/tracks/42/stream"
    );
}

#[test]
fn liked_tracks_accepts_alternate_keys() {
    let a: LikedTracks =
        serde_json::from_value(json!({ "liked_tracks": [track_json(1, "A")] })).unwrap();
    let b: LikedTracks = serde_json::from_value(json!({ "tracks": [track_json(2, "B")] })).unwrap();
    let c: LikedTracks = serde_json::from_value(json!({ "liked": [track_json(3, "C")] })).unwrap();
    let none: LikedTracks = serde_json::from_value(json!({ "user_id": 1 })).unwrap();

    assert_eq!(a.into_tracks()[0].id, TrackId(1));
    assert_eq!(b.into_tracks()[0].id, TrackId(2));
    assert_eq!(c.into_tracks()[0].id, TrackId(3));
    assert!(none.into_tracks().is_empty());
}

#[tokio::test]
async fn login_stores_token_for_later_calls() {
    let server = MockServer::start().await;
    let client = signed_in(&server).await;

    let session = client.session().await;
    assert_eq!(session.token.as_deref(), Some("tok-123"));
    assert_eq!(session.user.unwrap().username, "ada");

    Mock::given(method("POST"))
        .and(path("/api/tracks/5/like"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Liked",
            "likes_count": 3,
            "is_liked_by_user": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let status = client.like(TrackId(5)).await.unwrap();
    assert!(status.is_liked_by_user);
    assert_eq!(status.likes_count, 3);
}

#[tokio::test]
async fn register_signs_in_new_account() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({
            "username": "grace",
            "email": "grace@example.com",
            "password": "Secret123"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "user": { "user_id": 8, "username": "grace", "email": "grace@example.com" },
            "token": "tok-456"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let user = client
        .register("grace", "grace@example.com", "Secret123")
        .await
        .unwrap();
    assert_eq!(user.user_id, 8);
    assert!(client.is_authenticated().await);

    client.logout().await;
    assert!(!client.is_authenticated().await);
}

#[tokio::test]
async fn login_failure_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.login("ada@example.com", "nope").await {
        Err(ApiError::Server { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid credentials");
        }
        other => panic!("expected server error, got {:?}", other.map(|u| u.username)),
    }
    assert!(!client.is_authenticated().await);
}

#[tokio::test]
async fn authenticated_calls_without_token_fail_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(matches!(
        client.like(TrackId(1)).await,
        Err(ApiError::AuthRequired)
    ));
    assert!(matches!(
        client.create_playlist("Road trip").await,
        Err(ApiError::AuthRequired)
    ));
}

#[tokio::test]
async fn tracks_sends_pagination_and_parses_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tracks"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": [track_json(1, "One"), track_json(2, "Two")],
            "total": 27,
            "pages": 2,
            "current_page": 2
        })))
        .mount(&server)
        .await;

    let page = client_for(&server).tracks(2, 25).await.unwrap();
    assert_eq!(page.tracks.len(), 2);
    assert_eq!(page.total, 27);
    assert_eq!(page.tracks[1].title, "Two");
    assert_eq!(page.tracks[0].duration.as_deref(), Some("00:03:30"));
}

#[tokio::test]
async fn popular_tracks_uses_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tracks/popular"))
        .and(query_param("limit", "10"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "tracks": [track_json(9, "Hit")] })),
        )
        .mount(&server)
        .await;

    let popular = client_for(&server).popular_tracks(10).await.unwrap();
    assert_eq!(popular.len(), 1);
    assert_eq!(popular[0].id, TrackId(9));
}

#[tokio::test]
async fn unlike_conflict_keeps_server_error_text() {
    let server = MockServer::start().await;
    let client = signed_in(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/api/tracks/5/like"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Not liked" })))
        .mount(&server)
        .await;

    let err = client.unlike(TrackId(5)).await.unwrap_err();
    assert_eq!(err.user_message(), "Not liked");
}

#[tokio::test]
async fn create_playlist_posts_trimmed_title() {
    let server = MockServer::start().await;
    let client = signed_in(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/playlists"))
        .and(body_json(json!({ "title": "Road trip" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Created",
            "playlist": { "playlist_id": 4, "user_id": 7, "title": "Road trip", "track_count": 0 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let playlist = client.create_playlist("  Road trip ").await.unwrap();
    assert_eq!(playlist.id, PlaylistId(4));
    assert!(playlist.tracks.is_empty());
}

#[tokio::test]
async fn add_to_playlist_returns_updated_tracks() {
    let server = MockServer::start().await;
    let client = signed_in(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/playlists/4/tracks"))
        .and(body_json(json!({ "track_id": 5 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Added",
            "playlist": {
                "playlist_id": 4,
                "title": "Road trip",
                "track_count": 1,
                "tracks": [track_json(5, "Five")]
            }
        })))
        .mount(&server)
        .await;

    let playlist = client.add_to_playlist(PlaylistId(4), TrackId(5)).await.unwrap();
    assert_eq!(playlist.track_count, 1);
    assert_eq!(playlist.tracks[0].id, TrackId(5));
}

#[tokio::test]
async fn delete_track_maps_status_errors() {
    let server = MockServer::start().await;
    let client = signed_in(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/api/tracks/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Deleted" })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/tracks/9"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    client.delete_track(TrackId(8)).await.unwrap();
    match client.delete_track(TrackId(9)).await {
        Err(ApiError::Server { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "forbidden");
        }
        other => panic!("expected server error, got {:?}", other),
    }
}

#[tokio::test]
async fn expired_token_without_body_is_auth_required() {
    let server = MockServer::start().await;
    let client = signed_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/auth/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert!(matches!(
        client.current_user().await,
        Err(ApiError::AuthRequired)
    ));
}

#[tokio::test]
async fn resume_session_drops_rejected_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.resume_session("stale").await.is_err());
    assert!(!client.is_authenticated().await);
}

#[tokio::test]
async fn upload_sends_multipart_and_returns_track() {
    let server = MockServer::start().await;
    let client = signed_in(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/tracks/upload"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Uploaded",
            "track": track_json(11, "Fresh")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("fresh.mp3");
    std::fs::write(&file, b"fake mp3 bytes").unwrap();

    let meta = UploadMetadata {
        title: "Fresh".into(),
        artist_name: "Unknown Artist".into(),
        album_title: None,
        duration: Some("00:00:05".into()),
    };
    let track = client.upload_track(&file, &meta).await.unwrap();
    assert_eq!(track.id, TrackId(11));
}

#[tokio::test]
async fn artists_and_plans_parse() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/artists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": [{ "artist_id": 1, "name": "Nina", "genre": null }],
            "total": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/subscription_plans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subscription_plans": [
                { "subscription_plan_id": 2, "name": "Premium", "price": 9.99, "description": "No ads" }
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let artists = client.artists().await.unwrap();
    let plans = client.subscription_plans().await.unwrap();
    assert_eq!(artists[0].name, "Nina");
    assert!(artists[0].genre.is_none());
    assert_eq!(plans[0].name, "Premium");
    assert!((plans[0].price - 9.99).abs() < f64::EPSILON);
}
