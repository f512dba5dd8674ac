//! Cover fetching against a mock HTTP server

use aria_artwork::{ArtworkError, ColorExtractor, Rgb, ThemeStore};
use aria_storage::MemoryStore;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png(rgba: [u8; 4]) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(6, 6, Rgba(rgba)))
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

#[tokio::test]
async fn extract_from_url_fetches_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cover/64.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png([12, 120, 200, 255])))
        .expect(1)
        .mount(&server)
        .await;

    let http = reqwest::Client::new();
    let extractor = ColorExtractor::new(8);
    let url = format!("{}/cover/64.png", server.uri());

    let first = extractor.extract_from_url(&http, &url).await.unwrap();
    let second = extractor.extract_from_url(&http, &url).await.unwrap();

    assert_eq!(first, Rgb(12, 120, 200));
    assert_eq!(second, first);
}

#[tokio::test]
async fn http_error_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let extractor = ColorExtractor::default();
    let result = extractor
        .extract_from_url(&reqwest::Client::new(), &format!("{}/missing", server.uri()))
        .await;

    assert!(matches!(result, Err(ArtworkError::Fetch(_))));
    assert_eq!(extractor.cached(&format!("{}/missing", server.uri())), None);
}

#[tokio::test]
async fn theme_falls_back_when_cover_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let theme = ThemeStore::load(Arc::new(MemoryStore::new()));
    theme.set_mode("album_cover").unwrap();

    let accent = theme
        .apply_cover_url(
            &ColorExtractor::default(),
            &reqwest::Client::new(),
            &format!("{}/cover.jpg", server.uri()),
        )
        .await
        .unwrap();

    assert_eq!(accent, Rgb::WHITE);
}
