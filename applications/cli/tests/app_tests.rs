//! End-to-end tests for the CLI wiring against a mock music service

use aria_cli::{App, AppConfig};
use aria_core::LoginInfo;
use aria_playback::{Direction, OutputCommand, PlayMode, SelectOutcome};
use aria_storage::{FileStore, SessionStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ===== Test Helpers =====

fn config(server: &MockServer, data: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.api.base_url = server.uri();
    config.api.health_attempts = 2;
    config.api.health_delay_ms = 10;
    config.api.health_timeout_ms = 500;
    config.storage.data_dir = data.path().to_path_buf();
    config
}

async fn music_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlist/track/all"))
        .and(query_param("id", "pl1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "songs": [
                { "hash": "h1", "name": "First", "singerinfo": [{ "name": "A" }], "cover": "" },
                { "hash": "h2", "name": "Second", "singerinfo": [{ "name": "B" }], "cover": "" }
            ]}
        })))
        .mount(&server)
        .await;
    for hash in ["h1", "h2"] {
        Mock::given(method("GET"))
            .and(path("/song/url"))
            .and(query_param("hash", hash))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": [format!("https://cdn.test/{hash}.mp3")]
            })))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/search/lyric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;
    server
}

fn seed_session(data: &TempDir) {
    let store = Arc::new(FileStore::open(data.path()).unwrap());
    let session = SessionStore::load(store);
    session
        .set_login(LoginInfo {
            token: "old".into(),
            user_id: "7".into(),
            nickname: "Ann".into(),
            avatar: String::new(),
        })
        .unwrap();
}

// ===== Session =====

#[tokio::test]
async fn test_startup_refresh_updates_token() {
    let server = music_server().await;
    Mock::given(method("GET"))
        .and(path("/login/token"))
        .and(query_param("token", "old"))
        .and(query_param("userid", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "token": "new" } })))
        .expect(1)
        .mount(&server)
        .await;
    let data = TempDir::new().unwrap();
    seed_session(&data);

    let app = App::open(&config(&server, &data)).unwrap();
    app.startup().await;

    assert_eq!(app.session().token, "new");
    let reopened = App::open(&config(&server, &data)).unwrap();
    assert_eq!(reopened.session().token, "new");
}

#[tokio::test]
async fn test_startup_refresh_failure_is_not_fatal() {
    let server = music_server().await;
    Mock::given(method("GET"))
        .and(path("/login/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let data = TempDir::new().unwrap();
    seed_session(&data);

    let app = App::open(&config(&server, &data)).unwrap();
    app.startup().await;

    assert_eq!(app.session().token, "old");
    assert!(app.session().is_authenticated());
}

#[tokio::test]
async fn test_password_login_persists_session() {
    let server = music_server().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .and(query_param("username", "ann"))
        .and(query_param("password", "pw"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "token": "tok", "userid": 7, "nickname": "Ann" }
        })))
        .mount(&server)
        .await;
    let data = TempDir::new().unwrap();

    let app = App::open(&config(&server, &data)).unwrap();
    assert!(!app.refresh_session().await.unwrap());
    let login = app.login_password("ann", "pw").await.unwrap();
    assert_eq!(login.user_id, "7");

    let reopened = App::open(&config(&server, &data)).unwrap();
    assert_eq!(reopened.session().nickname, "Ann");
    assert!(reopened.client().is_authenticated().await);

    reopened.logout().await.unwrap();
    assert!(!reopened.session().is_authenticated());
}

#[tokio::test]
async fn test_wx_login_persists_session() {
    let server = music_server().await;
    Mock::given(method("GET"))
        .and(path("/login/wx/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "uuid": "U1", "qrcode": { "qrcodeurl": "https://wx/U1" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login/wx/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "wx_errcode": 405, "wx_code": "WXC" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login/openplat"))
        .and(query_param("code", "WXC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "token": "wt", "userid": 9, "nickname": "Wei" }
        })))
        .mount(&server)
        .await;
    let data = TempDir::new().unwrap();

    let app = App::open(&config(&server, &data)).unwrap();
    let code = app.wx_begin().await.unwrap();
    app.wx_wait(&code.uuid, Duration::from_millis(5), 3)
        .await
        .unwrap();

    let reopened = App::open(&config(&server, &data)).unwrap();
    assert_eq!(reopened.session().token, "wt");
    assert_eq!(reopened.session().nickname, "Wei");
}

// ===== Playback =====

#[tokio::test]
async fn test_playlist_plays_and_persists_queue() {
    let server = music_server().await;
    let data = TempDir::new().unwrap();

    {
        let app = App::open(&config(&server, &data)).unwrap();
        let outcome = app.load_playlist("pl1", 1, 20).await.unwrap();

        assert_eq!(outcome, SelectOutcome::Resolved);
        assert!(app
            .output()
            .commands()
            .contains(&OutputCommand::SetSource("https://cdn.test/h1.mp3".into())));
        assert_eq!(app.cycle_mode().unwrap(), PlayMode::SingleRepeat);
    }

    let app = App::open(&config(&server, &data)).unwrap();
    let (tracks, active) = app.queue();
    assert_eq!(tracks.len(), 2);
    assert_eq!(active.as_deref(), Some("h1"));
    assert!(tracks.iter().all(|t| t.url.is_none()));
    assert_eq!(app.player().play_mode(), PlayMode::SingleRepeat);
    assert_eq!(app.player().playlist().unwrap().playlist_id, "pl1");
}

#[tokio::test]
async fn test_next_advances_persisted_queue() {
    let server = music_server().await;
    let data = TempDir::new().unwrap();
    {
        let app = App::open(&config(&server, &data)).unwrap();
        app.load_playlist("pl1", 1, 20).await.unwrap();
    }

    let app = App::open(&config(&server, &data)).unwrap();
    assert_eq!(
        app.advance(Direction::Next).await.unwrap(),
        SelectOutcome::Resolved
    );
    assert_eq!(app.queue().1.as_deref(), Some("h2"));
    assert_eq!(
        app.output().current_source().as_deref(),
        Some("https://cdn.test/h2.mp3")
    );

    assert_eq!(app.play("missing").await.unwrap(), SelectOutcome::NotInQueue);
}

#[tokio::test]
async fn test_playlist_short_page_exhausts_load_more() {
    let server = music_server().await;
    let data = TempDir::new().unwrap();
    let app = App::open(&config(&server, &data)).unwrap();
    app.load_playlist("pl1", 1, 20).await.unwrap();

    let outcome = app.load_more().await.unwrap();

    // The mock returns the same two songs for every page
    assert_eq!(
        outcome,
        aria_playback::LoadMoreOutcome::Loaded {
            added: 0,
            exhausted: true
        }
    );
    assert_eq!(app.player().queue_len(), 2);
}

#[tokio::test]
async fn test_load_more_continues_requested_page() {
    let server = music_server().await;
    let data = TempDir::new().unwrap();
    let app = App::open(&config(&server, &data)).unwrap();
    app.load_playlist("pl1", 3, 5).await.unwrap();

    app.load_more().await.unwrap();

    let pages: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/playlist/track/all")
        .map(|r| r.url.query().unwrap_or_default().to_string())
        .collect();
    assert_eq!(pages.len(), 2);
    assert!(pages[0].contains("page=3") && pages[0].contains("pagesize=5"));
    assert!(pages[1].contains("page=4") && pages[1].contains("pagesize=5"));
}
