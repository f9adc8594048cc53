use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, Responder};
use validator::Validate;
use crate::core::Matcher;
use crate::models::{
    AnalyzeResponse, ConversationResponse, ConversationsResponse, ErrorResponse,
    GenerateProfilesRequest, HealthResponse, MessageResponse, OperationStep, ProfilesResponse,
    SampleConversation, StatusResponse,
};
use crate::services::{
    ChatCompletion, ConversationSimulator, ProfileGenerator, SessionError, SessionStore,
};
use std::sync::Arc;

/// Header asking a generation route to return the stored data instead
pub const CURRENT_ONLY_HEADER: &str = "X-Get-Current-Only";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionStore>,
    pub matcher: Matcher,
    pub profile_generator: Arc<ProfileGenerator>,
    pub simulator: Arc<ConversationSimulator>,
    pub default_profiles: u32,
}

impl AppState {
    pub fn new(
        llm: Arc<dyn ChatCompletion>,
        matcher: Matcher,
        default_profiles: u32,
        messages_per_conversation: usize,
    ) -> Self {
        Self {
            session: Arc::new(SessionStore::new()),
            matcher,
            profile_generator: Arc::new(ProfileGenerator::new(llm.clone())),
            simulator: Arc::new(ConversationSimulator::new(llm, messages_per_conversation)),
            default_profiles,
        }
    }
}

/// Configure all pipeline routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/status", web::get().to(get_status))
        .route("/generate-profiles", web::post().to(generate_profiles))
        .route("/simulate-conversations", web::post().to(simulate_conversations))
        .route("/analyze-sentiment", web::post().to(analyze_sentiment))
        .route("/results", web::get().to(get_results))
        .route("/reset", web::post().to(reset))
        .route("/conversation/{user1_id}/{user2_id}", web::get().to(get_conversation));
}

fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: status.as_u16(),
    })
}

fn busy_response(err: SessionError) -> HttpResponse {
    tracing::info!("Rejected request: {}", err);
    error_response(StatusCode::CONFLICT, "Operation in progress", err.to_string())
}

fn no_profiles_response() -> HttpResponse {
    error_response(
        StatusCode::BAD_REQUEST,
        "No profiles",
        "Generate profiles before simulating conversations",
    )
}

fn no_conversations_response() -> HttpResponse {
    error_response(
        StatusCode::BAD_REQUEST,
        "No conversations",
        "Simulate conversations before analyzing sentiment",
    )
}

fn current_only(req: &HttpRequest) -> bool {
    req.headers()
        .get(CURRENT_ONLY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /api/status
async fn get_status(state: web::Data<AppState>) -> impl Responder {
    let snapshot = state.session.snapshot();

    HttpResponse::Ok().json(StatusResponse {
        in_progress: snapshot.progress.in_progress,
        step: snapshot.progress.step,
        message: snapshot.progress.message,
        has_profiles: snapshot.profiles.is_some(),
        has_conversations: snapshot.conversations.is_some(),
        has_sentiment: snapshot.analysis.is_some(),
    })
}

/// Generate profiles endpoint
///
/// POST /api/generate-profiles
///
/// Request body (optional, may be empty):
/// ```json
/// { "num_profiles": 10 }
/// ```
async fn generate_profiles(
    state: web::Data<AppState>,
    body: web::Bytes,
    req: HttpRequest,
) -> impl Responder {
    if current_only(&req) {
        return match state.session.profiles() {
            Some(profiles) => HttpResponse::Ok().json(ProfilesResponse {
                success: true,
                profiles: &profiles,
                message: "Current profiles".to_string(),
            }),
            None => error_response(
                StatusCode::BAD_REQUEST,
                "No profiles",
                "No profiles have been generated yet",
            ),
        };
    }

    // The body is optional, an empty one means "use the default count"
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateProfilesRequest { num_profiles: None }
    } else {
        match serde_json::from_slice::<GenerateProfilesRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "invalid_json",
                    format!("Invalid JSON: {}", e),
                )
            }
        }
    };
    if let Err(errors) = request.validate() {
        tracing::info!("Validation failed for generate_profiles request: {:?}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }
    let count = request.num_profiles.unwrap_or(state.default_profiles) as usize;

    let guard = match state
        .session
        .try_begin(OperationStep::GenerateProfiles, format!("Generating {} profiles", count))
    {
        Ok(guard) => guard,
        Err(e) => return busy_response(e),
    };

    tracing::info!("Generating {} profiles", count);
    let profiles = state.profile_generator.generate(count).await;
    let profiles = guard.set_profiles(profiles);

    let message = format!("Generated {} profiles", profiles.len());
    guard.finish(message.clone());

    HttpResponse::Ok().json(ProfilesResponse {
        success: true,
        profiles: &profiles,
        message,
    })
}

/// POST /api/simulate-conversations
async fn simulate_conversations(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if current_only(&req) {
        return match state.session.conversations() {
            Some(conversations) => HttpResponse::Ok().json(ConversationsResponse {
                success: true,
                num_conversations: conversations.len(),
                sample_conversation: conversations.first().map(|c| SampleConversation {
                    pair: (c.user_a_id, c.user_b_id),
                    messages: &c.messages,
                }),
                message: "Current conversations".to_string(),
            }),
            None => error_response(
                StatusCode::BAD_REQUEST,
                "No conversations",
                "No conversations have been simulated yet",
            ),
        };
    }

    if state.session.profiles().is_none() {
        return no_profiles_response();
    }

    let guard = match state
        .session
        .try_begin(OperationStep::SimulateConversations, "Simulating conversations")
    {
        Ok(guard) => guard,
        Err(e) => return busy_response(e),
    };

    // Reset may have run between the check and the gate
    let Some(profiles) = state.session.profiles() else {
        guard.fail("No profiles available");
        return no_profiles_response();
    };

    let pairs = profiles.len() * profiles.len().saturating_sub(1) / 2;
    guard.report(format!("Simulating {} conversations", pairs));

    let conversations = state.simulator.simulate_all(&profiles).await;
    let conversations = guard.set_conversations(conversations);

    let message = format!("Simulated {} conversations", conversations.len());
    guard.finish(message.clone());

    HttpResponse::Ok().json(ConversationsResponse {
        success: true,
        num_conversations: conversations.len(),
        sample_conversation: conversations.first().map(|c| SampleConversation {
            pair: (c.user_a_id, c.user_b_id),
            messages: &c.messages,
        }),
        message,
    })
}

/// POST /api/analyze-sentiment
///
/// Scores every stored conversation and selects the top matches per user.
async fn analyze_sentiment(state: web::Data<AppState>) -> impl Responder {
    if state.session.conversations().is_none() {
        return no_conversations_response();
    }

    let guard = match state
        .session
        .try_begin(OperationStep::AnalyzeSentiment, "Analyzing conversation sentiment")
    {
        Ok(guard) => guard,
        Err(e) => return busy_response(e),
    };

    let snapshot = state.session.snapshot();
    let (Some(profiles), Some(conversations)) = (snapshot.profiles, snapshot.conversations) else {
        guard.fail("No conversations available");
        return no_conversations_response();
    };

    // Scoring is CPU-bound, keep it off the async workers
    let matcher = state.matcher.clone();
    let analysis = match web::block(move || matcher.run(&profiles, &conversations)).await {
        Ok(analysis) => analysis,
        Err(e) => {
            tracing::error!("Sentiment analysis task failed: {}", e);
            guard.fail("Sentiment analysis failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Analysis failed",
                e.to_string(),
            );
        }
    };

    let analysis = guard.set_analysis(analysis);
    guard.finish(format!(
        "Analyzed {} conversations",
        analysis.all_pairs.len()
    ));

    HttpResponse::Ok().json(AnalyzeResponse {
        success: true,
        analysis: &analysis,
    })
}

/// GET /api/results
async fn get_results(state: web::Data<AppState>) -> impl Responder {
    match state.session.analysis() {
        Some(analysis) => HttpResponse::Ok().json(AnalyzeResponse {
            success: true,
            analysis: &analysis,
        }),
        None => error_response(
            StatusCode::BAD_REQUEST,
            "No results",
            "Sentiment analysis has not been run yet",
        ),
    }
}

/// POST /api/reset
async fn reset(state: web::Data<AppState>) -> impl Responder {
    match state.session.reset() {
        Ok(()) => HttpResponse::Ok().json(MessageResponse {
            success: true,
            message: "Application reset".to_string(),
        }),
        Err(e) => busy_response(e),
    }
}

/// GET /api/conversation/{user1_id}/{user2_id}
///
/// Uses the stored conversation for the pair when there is one, otherwise
/// simulates a fresh one without storing it.
async fn get_conversation(
    state: web::Data<AppState>,
    path: web::Path<(u32, u32)>,
) -> impl Responder {
    let (user1_id, user2_id) = path.into_inner();

    let snapshot = state.session.snapshot();
    let Some(profiles) = snapshot.profiles else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "No profiles",
            "No profiles generated yet",
        );
    };

    let (Some(user1), Some(user2)) = (
        profiles.iter().find(|p| p.id == user1_id),
        profiles.iter().find(|p| p.id == user2_id),
    ) else {
        return error_response(StatusCode::NOT_FOUND, "User not found", "User not found");
    };

    let stored = snapshot
        .conversations
        .as_ref()
        .and_then(|set| set.get(user1_id, user2_id))
        .map(|pair| pair.messages.clone());

    let conversation = match stored {
        Some(messages) => messages,
        None => {
            tracing::debug!("No stored conversation for {} and {}, simulating", user1_id, user2_id);
            state.simulator.simulate_pair(user1, user2).await
        }
    };

    let scored = state.matcher.score_conversation(&conversation);

    HttpResponse::Ok().json(ConversationResponse {
        user1,
        user2,
        conversation: &conversation,
        sentiment_score: scored.sentiment_score,
        breakdown: scored.breakdown,
        speakers: scored.speakers,
        error: scored.error,
    })
}
