use std::sync::Arc;

use serde_json::json;
use textpilot_common::{ActionResponse, RequestEnvelope, ShowResult};
use textpilot_gateway::dispatch::{MessageRouter, Origin, RouterHandle};
use textpilot_gateway::relay::{SurfaceFrame, SurfaceRegistry};
use textpilot_providers::{AdapterRegistry, GeminiAdapter};
use textpilot_store::{HistoryStore, SettingsStore, keys};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Pipeline {
    settings: Arc<SettingsStore>,
    history: Arc<HistoryStore>,
    surfaces: Arc<SurfaceRegistry>,
    router: RouterHandle,
}

/// In-memory stores and a registry whose Gemini adapter points at the mock
/// server; everything else is the real pipeline.
fn pipeline(gemini_url: &str) -> Pipeline {
    let settings = Arc::new(SettingsStore::in_memory().unwrap());
    let history = Arc::new(HistoryStore::in_memory().unwrap());
    let surfaces = Arc::new(SurfaceRegistry::new());

    let registry = AdapterRegistry::new()
        .with_gemini(GeminiAdapter::new().with_base_url(gemini_url.to_string()));

    let router = MessageRouter::new(
        settings.clone(),
        history.clone(),
        Arc::new(registry),
        surfaces.clone(),
    )
    .spawn();

    Pipeline {
        settings,
        history,
        surfaces,
        router,
    }
}

fn gemini_reply(text: &str) -> serde_json::Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

#[tokio::test]
async fn writing_action_fans_out_to_relay_history_and_caller() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("Improved Text")))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline(&server.uri());
    pipeline
        .settings
        .set_string(keys::API_KEY, "test-key")
        .unwrap();

    let (surface, mut frames) = pipeline.surfaces.register();
    let origin = Origin {
        surface: Some(surface),
        site: Some("mail.example.com".to_string()),
    };
    let envelope = RequestEnvelope::WritingAction {
        action: "grammar".to_string(),
        preset: Some("email".to_string()),
        text: "original text".to_string(),
    };

    let response = pipeline.router.submit(envelope, origin).await;
    assert_eq!(response, ActionResponse::ok("Improved Text"));

    // Relay reached the originating surface with the exact payload.
    let frame = frames.recv().await.unwrap();
    assert_eq!(
        frame,
        SurfaceFrame::ShowResult(ShowResult {
            action: "grammar".to_string(),
            original: "original text".to_string(),
            result: "Improved Text".to_string(),
        })
    );

    // One history entry, built from the same texts, counters bumped with it.
    let entries = pipeline.history.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "grammar");
    assert_eq!(entries[0].input_text, "original text");
    assert_eq!(entries[0].output_text, "Improved Text");
    assert_eq!(entries[0].preset.as_deref(), Some("email"));
    assert_eq!(entries[0].site.as_deref(), Some("mail.example.com"));
    assert_eq!(entries[0].words_processed, 2);
    assert_eq!(entries[0].words_generated, 2);

    let stats = pipeline.history.stats().unwrap();
    assert_eq!(stats.total_actions, 1);
    assert_eq!(stats.total_words_processed, 2);
    assert_eq!(stats.total_words_generated, 2);
}

#[tokio::test]
async fn failure_skips_relay_and_history() {
    // No credential persisted: the adapter fails before any network call.
    let pipeline = pipeline("http://127.0.0.1:1");

    let (surface, mut frames) = pipeline.surfaces.register();
    let envelope = RequestEnvelope::WritingAction {
        action: "improve".to_string(),
        preset: None,
        text: "some text".to_string(),
    };
    let origin = Origin {
        surface: Some(surface),
        site: None,
    };

    let response = pipeline.router.submit(envelope, origin).await;
    assert_eq!(
        response,
        ActionResponse::err("Gemini API key not configured")
    );

    assert!(frames.try_recv().is_err());
    assert!(pipeline.history.list().unwrap().is_empty());
    assert_eq!(pipeline.history.stats().unwrap().total_actions, 0);
}

#[tokio::test]
async fn quick_ask_records_under_the_ask_action() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("Rust is a language.")))
        .mount(&server)
        .await;

    let pipeline = pipeline(&server.uri());
    pipeline
        .settings
        .set_string(keys::API_KEY, "test-key")
        .unwrap();

    // Popup call: no originating page surface, so nothing to relay to.
    let envelope = RequestEnvelope::QuickAsk {
        query: "What is Rust?".to_string(),
        preset: None,
    };
    let response = pipeline.router.submit(envelope, Origin::default()).await;

    assert!(response.success);
    let entries = pipeline.history.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "ask");
    assert_eq!(entries[0].input_text, "What is Rust?");
}

#[tokio::test]
async fn relay_failure_still_records_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("done")))
        .mount(&server)
        .await;

    let pipeline = pipeline(&server.uri());
    pipeline
        .settings
        .set_string(keys::API_KEY, "test-key")
        .unwrap();

    // Surface disconnected before the result came back.
    let origin = Origin {
        surface: Some("gone-surface".to_string()),
        site: None,
    };
    let envelope = RequestEnvelope::WritingAction {
        action: "summarize".to_string(),
        preset: None,
        text: "a b c".to_string(),
    };

    let response = pipeline.router.submit(envelope, origin).await;
    assert!(response.success);
    assert_eq!(pipeline.history.list().unwrap().len(), 1);
}

#[tokio::test]
async fn validate_config_touches_neither_settings_nor_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("OK")))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline(&server.uri());

    let envelope = RequestEnvelope::ValidateConfig {
        provider: "gemini".to_string(),
        model: "gemini-2.5-flash".to_string(),
        key: "probe-key".to_string(),
    };
    let response = pipeline.router.submit(envelope, Origin::default()).await;

    assert_eq!(response, ActionResponse::ok_empty());
    assert!(pipeline.history.list().unwrap().is_empty());
    assert!(pipeline.settings.all().unwrap().is_empty());
}

#[tokio::test]
async fn validate_config_reports_bad_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "error": { "message": "API key not valid" } })),
        )
        .mount(&server)
        .await;

    let pipeline = pipeline(&server.uri());

    let envelope = RequestEnvelope::ValidateConfig {
        provider: "gemini".to_string(),
        model: "gemini-2.5-flash".to_string(),
        key: "bad-key".to_string(),
    };
    let response = pipeline.router.submit(envelope, Origin::default()).await;

    assert_eq!(response, ActionResponse::err("API key not valid"));
}

#[tokio::test]
async fn persisted_model_routes_writing_actions() {
    // apiModel selects Gemini implicitly through the prefix fallback even for
    // ids the catalog has never seen.
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/unknown-model:generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline(&server.uri());
    pipeline
        .settings
        .set_string(keys::API_MODEL, "unknown-model")
        .unwrap();
    pipeline
        .settings
        .set_string(keys::API_KEY, "test-key")
        .unwrap();

    let envelope = RequestEnvelope::WritingAction {
        action: "improve".to_string(),
        preset: None,
        text: "x".to_string(),
    };
    let response = pipeline.router.submit(envelope, Origin::default()).await;
    assert!(response.success);
}
