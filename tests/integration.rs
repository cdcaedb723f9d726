use captionsmith::{
    ai::{CaptionGenerator, GeminiCaptionClient, GroqCaptionClient, MockCaptionClient},
    app::{App, AppServices, CaptionStyle, RenderOptions},
    history::{HistoryStore, JsonHistoryStore},
    models::{OverlayPosition, Provider},
    render::{with_background, wrap, BackgroundStyle, BitmapFont, FontHandle, TextRenderer},
    Error,
};
use image::{Rgb, RgbImage};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_photo(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_fn(200, 120, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]))
        .save(&path)
        .unwrap();
    path
}

fn bitmap_options(style: CaptionStyle) -> RenderOptions {
    RenderOptions {
        style,
        font: FontHandle::Bitmap(BitmapFont::new(1, 1)),
    }
}

#[tokio::test]
async fn test_full_workflow_with_mocks() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_photo(dir.path(), "sunset.png");
    let history_path = dir.path().join("caption_metadata.json");

    let openai = MockCaptionClient::new().with_response("Golden hour over calm water".to_string());
    let groq = MockCaptionClient::new().with_response("Sky ablaze at dusk".to_string());
    let app = App::with_services(AppServices {
        captions: CaptionGenerator::new()
            .with_service(Provider::OpenAi, Box::new(openai.clone()))
            .with_service(Provider::Groq, Box::new(groq.clone())),
        history: Box::new(JsonHistoryStore::new(history_path.clone())),
    });

    let first = app
        .caption_image(
            &photo,
            Provider::OpenAi,
            &bitmap_options(CaptionStyle::Overlay {
                position: OverlayPosition::Bottom,
            }),
            None,
        )
        .await
        .unwrap();
    let second_out = dir.path().join("banded.png");
    let second = app
        .caption_image(
            &photo,
            Provider::Groq,
            &bitmap_options(CaptionStyle::Background(BackgroundStyle::default())),
            Some(&second_out),
        )
        .await
        .unwrap();

    assert_eq!(first.output_path, dir.path().join("captioned_sunset.png"));
    assert_eq!((first.width, first.height), (200, 120));
    assert_eq!(second.output_path, second_out);
    assert!(second.height > 120);
    assert_eq!(openai.get_call_count(), 1);
    assert_eq!(groq.get_call_count(), 1);

    // The provider sees the decoded photo re-encoded as PNG.
    let sent = image::load_from_memory(&openai.last_image().unwrap()).unwrap();
    assert_eq!((sent.width(), sent.height()), (200, 120));

    let reopened = JsonHistoryStore::new(history_path);
    let entries = reopened.list().unwrap();
    let summary: Vec<(&str, &str, &str)> = entries
        .iter()
        .map(|e| (e.image_name.as_str(), e.model.as_str(), e.caption.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("sunset.png", "openai", "Golden hour over calm water"),
            ("sunset.png", "groq", "Sky ablaze at dusk"),
        ]
    );
    assert_eq!(reopened.find_by_model("groq").unwrap().len(), 1);

    app.history().clear().unwrap();
    assert!(reopened.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_gemini_caption_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash-lite:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "  Waves fold into amber light \n" }] }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let photo = write_photo(dir.path(), "coast.jpg");
    let client = GeminiCaptionClient::new(
        "test-key".to_string(),
        "gemini-2.5-flash-lite".to_string(),
    )
    .with_base_url(server.uri());
    let app = App::with_services(AppServices {
        captions: CaptionGenerator::new().with_service(Provider::Gemini, Box::new(client)),
        history: Box::new(JsonHistoryStore::new(dir.path().join("history.json"))),
    });

    let outcome = app
        .caption_image(&photo, Provider::Gemini, &RenderOptions::default(), None)
        .await
        .unwrap();

    assert_eq!(outcome.caption, "Waves fold into amber light");
    assert_eq!(outcome.output_path, dir.path().join("captioned_coast.png"));
    let entries = app.history().list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].model, "gemini");
    assert_eq!(entries[0].image_name, "coast.jpg");
}

#[tokio::test]
async fn test_provider_error_leaves_history_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let photo = write_photo(dir.path(), "street.png");
    let history_path = dir.path().join("history.json");
    let client = GroqCaptionClient::new(
        "bad-key".to_string(),
        Provider::Groq.default_model().to_string(),
    )
    .with_base_url(server.uri());
    let app = App::with_services(AppServices {
        captions: CaptionGenerator::new().with_service(Provider::Groq, Box::new(client)),
        history: Box::new(JsonHistoryStore::new(history_path.clone())),
    });

    let err = app
        .caption_image(&photo, Provider::Groq, &RenderOptions::default(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ProviderRequestFailed(_)));
    assert!(!history_path.exists());
    assert!(!dir.path().join("captioned_street.png").exists());
}

#[tokio::test]
async fn test_unconfigured_provider_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_photo(dir.path(), "street.png");
    let app = App::with_services(AppServices {
        captions: CaptionGenerator::new(),
        history: Box::new(JsonHistoryStore::new(dir.path().join("history.json"))),
    });

    let err = app
        .caption_image(&photo, Provider::OpenAi, &RenderOptions::default(), None)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "OpenAI API key is not configured");
}

#[test]
fn test_background_band_matches_wrapped_layout() {
    let font = BitmapFont::new(2, 1);
    let image = RgbImage::from_pixel(300, 100, Rgb([10, 200, 10]));
    let style = BackgroundStyle {
        background: Rgb([0, 0, 0]),
        text: Rgb([255, 255, 255]),
        margin: 30,
    };
    let caption = "Morning mist settles over a quiet mountain lake";

    let wrapped = wrap(caption, &font, 300 - 60);
    let line_height = font.measure("A").1;
    let n = wrapped.line_count() as u32;
    let text_height = n * line_height + (n - 1) * 10;

    let result = with_background(&image, caption, &font, &style);

    assert!(n > 1);
    assert_eq!(result.dimensions(), (300, 100 + text_height + 60));
    // The original image sits below the band, untouched.
    let band = text_height + 60;
    assert_eq!(*result.get_pixel(0, band), Rgb([10, 200, 10]));
    assert_eq!(*result.get_pixel(299, band + 99), Rgb([10, 200, 10]));
    assert_eq!(*result.get_pixel(0, 0), Rgb([0, 0, 0]));
}
