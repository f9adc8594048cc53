// Integration tests for Sentimatch

use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use sentimatch::core::Matcher;
use sentimatch::models::{ConversationSet, OperationStep, Profile};
use sentimatch::routes::{configure_app, AppState};
use sentimatch::services::{ChatCompletion, ChatRequest, ConversationSimulator, LlmError};
use serde_json::Value;
use std::sync::Arc;

/// Language model stand-in that is never reachable
struct OfflineLlm;

#[async_trait]
impl ChatCompletion for OfflineLlm {
    async fn complete(&self, _request: ChatRequest) -> Result<String, LlmError> {
        Err(LlmError::NotConfigured)
    }
}

/// Replies with a fixed exchange for every conversation request
struct FriendlyLlm;

#[async_trait]
impl ChatCompletion for FriendlyLlm {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        if request.user.starts_with("Simulate a casual dating app conversation") {
            Ok("First: Hi! I love that you hike\nSecond: Thanks, it's great fun!\n\
                First: Awesome, we should go sometime\nSecond: Definitely, sounds wonderful"
                .to_string())
        } else {
            Err(LlmError::InvalidResponse("no answers".to_string()))
        }
    }
}

fn create_profile(id: u32, name: &str) -> Profile {
    Profile {
        id,
        name: name.to_string(),
        age: 31,
        bio: "World traveler with a passion for food".to_string(),
        interests: vec!["Travel".to_string(), "Cooking".to_string()],
        personality: "Adventurous extrovert".to_string(),
        prompt_answers: vec![],
    }
}

fn app_state(llm: Arc<dyn ChatCompletion>) -> AppState {
    AppState::new(llm, Matcher::with_defaults(), 10, 8)
}

#[::core::prelude::v1::test]
fn test_integration_end_to_end_matching() {
    let matcher = Matcher::with_defaults();
    let profiles: Vec<Profile> = ["Alex0", "Sam1", "Jordan2", "Taylor3"]
        .iter()
        .enumerate()
        .map(|(i, name)| create_profile(i as u32, name))
        .collect();

    let mut conversations = ConversationSet::new();
    conversations.insert(0, 1, vec![
        "Alex0: I love your travel photos, they look amazing!".to_string(),
        "Sam1: Thanks! Japan was wonderful, you would love it".to_string(),
    ]);
    conversations.insert(0, 2, vec![
        "Alex0: hey".to_string(),
        "Jordan2: this is boring".to_string(),
    ]);
    conversations.insert(1, 3, vec![
        "Sam1: Nice to meet you".to_string(),
        "Taylor3: Nice to meet you too, that trip sounds fun".to_string(),
    ]);
    // Pair with a profile that no longer exists
    conversations.insert(2, 9, vec!["Jordan2: hi".to_string(), "Ghost9: boo".to_string()]);

    let result = matcher.run(&profiles, &conversations);

    assert_eq!(result.all_pairs.len(), 3);
    assert!(result
        .all_pairs
        .windows(2)
        .all(|w| w[0].sentiment_score >= w[1].sentiment_score));
    assert_eq!(
        (result.all_pairs[0].user_a_id, result.all_pairs[0].user_b_id),
        (0, 1)
    );

    assert_eq!(result.results.len(), 4);
    let alex = result.results.get(0).unwrap();
    assert_eq!(alex.matches.len(), 2);
    assert_eq!(alex.matches[0].partner_name, "Sam1");
    assert!(result.results.get(3).unwrap().matches.len() == 1);

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["results"]["0"]["matches"].is_array());
    assert!(json["run_id"].is_string());
}

#[actix_web::test]
async fn test_health_endpoint() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(Arc::new(OfflineLlm))))
            .configure(configure_app),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_full_pipeline_over_http() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(Arc::new(OfflineLlm))))
            .configure(configure_app),
    )
    .await;

    // Nothing to analyze yet
    let req = test::TestRequest::post().uri("/api/analyze-sentiment").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/generate-profiles")
        .set_json(serde_json::json!({ "num_profiles": 4 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    let profiles = body["profiles"].as_array().unwrap();
    assert_eq!(profiles.len(), 4);
    assert_eq!(profiles[0]["prompt_answers"].as_array().unwrap().len(), 3);

    let req = test::TestRequest::post()
        .uri("/api/simulate-conversations")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["num_conversations"], 6);
    assert_eq!(body["sample_conversation"]["messages"].as_array().unwrap().len(), 6);

    let req = test::TestRequest::post().uri("/api/analyze-sentiment").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    let pairs = body["all_pairs"].as_array().unwrap();
    assert_eq!(pairs.len(), 6);
    for pair in pairs {
        let score = pair["sentiment_score"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&score));
    }
    let results = body["results"].as_object().unwrap();
    assert_eq!(results.len(), 4);
    for record in results.values() {
        assert!(record["matches"].as_array().unwrap().len() <= 3);
    }

    let req = test::TestRequest::get().uri("/api/results").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["in_progress"], false);
    assert_eq!(body["has_sentiment"], true);
    assert_eq!(body["step"], "analyze_sentiment");

    let req = test::TestRequest::post().uri("/api/reset").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/results").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_generate_profiles_validation() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(Arc::new(OfflineLlm))))
            .configure(configure_app),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/generate-profiles")
        .set_json(serde_json::json!({ "num_profiles": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/generate-profiles")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status_code"], 400);
    assert_eq!(body["error"], "invalid_json");

    // An empty body falls back to the configured default
    let req = test::TestRequest::post()
        .uri("/api/generate-profiles")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["profiles"].as_array().unwrap().len(), 10);
}

#[actix_web::test]
async fn test_current_only_header() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(Arc::new(OfflineLlm))))
            .configure(configure_app),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/generate-profiles")
        .insert_header(("X-Get-Current-Only", "true"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/generate-profiles")
        .set_json(serde_json::json!({ "num_profiles": 3 }))
        .to_request();
    let generated: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/generate-profiles")
        .insert_header(("X-Get-Current-Only", "true"))
        .to_request();
    let current: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(current["profiles"], generated["profiles"]);
}

#[actix_web::test]
async fn test_busy_session_returns_conflict() {
    let state = app_state(Arc::new(OfflineLlm));
    let session = state.session.clone();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_app),
    )
    .await;

    // Seed data so every route gets past its prerequisite check
    let setup = session
        .try_begin(OperationStep::SimulateConversations, "Seeding")
        .unwrap();
    setup.set_profiles(vec![create_profile(0, "Alex0"), create_profile(1, "Sam1")]);
    let mut conversations = ConversationSet::new();
    conversations.insert(0, 1, vec!["Alex0: hi".to_string(), "Sam1: hey".to_string()]);
    setup.set_conversations(conversations);
    setup.finish("seeded");

    let guard = session
        .try_begin(OperationStep::GenerateProfiles, "Generating")
        .unwrap();

    for uri in [
        "/api/generate-profiles",
        "/api/simulate-conversations",
        "/api/analyze-sentiment",
        "/api/reset",
    ] {
        let req = test::TestRequest::post().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT, "{}", uri);
    }

    let req = test::TestRequest::get().uri("/api/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["in_progress"], true);
    assert_eq!(body["step"], "generate_profiles");

    guard.finish("done");
    let req = test::TestRequest::post().uri("/api/reset").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_missing_prerequisites_leave_status_untouched() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(Arc::new(OfflineLlm))))
            .configure(configure_app),
    )
    .await;

    for uri in ["/api/analyze-sentiment", "/api/simulate-conversations"] {
        let req = test::TestRequest::post().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }

    let req = test::TestRequest::get().uri("/api/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["in_progress"], false);
    assert!(body["step"].is_null());
    assert!(body["message"].is_null());
}

#[actix_web::test]
async fn test_conversation_endpoint() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(Arc::new(FriendlyLlm))))
            .configure(configure_app),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/conversation/0/1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/generate-profiles")
        .set_json(serde_json::json!({ "num_profiles": 2 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/conversation/0/7").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // No stored conversations, so one is simulated on the fly
    let req = test::TestRequest::get().uri("/api/conversation/1/0").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["user1"]["id"], 1);
    assert_eq!(body["conversation"].as_array().unwrap().len(), 4);
    let score = body["sentiment_score"].as_f64().unwrap();
    assert!(score > 0.5);
    assert_eq!(body["speakers"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get().uri("/api/conversation/x/0").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_path");
}

#[actix_web::test]
async fn test_simulator_uses_model_reply() {
    let simulator = ConversationSimulator::new(Arc::new(FriendlyLlm), 8);
    let profiles = vec![create_profile(0, "Alex0"), create_profile(1, "Sam1")];

    let conversations = simulator.simulate_all(&profiles).await;
    let pair = conversations.get(1, 0).unwrap();

    assert_eq!(pair.messages.len(), 4);
    assert!(pair.messages[0].starts_with("First:"));
}
