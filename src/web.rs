use std::sync::RwLock;

use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::compatibility::{recommend_players, DEFAULT_RECOMMENDATION_LIMIT};
use crate::config::Config;
use crate::error::ServiceError;
use crate::form::{export_availability_to_csv, validate_submission, AvailabilitySubmission};
use crate::parser::{read_availability, read_busy_events, read_profiles};
use crate::rating::{ntrp_from_quiz, utr_to_ntrp, validate_utr};
use crate::schedule::SmartScheduler;
use crate::store::InMemoryStore;

/// Shared state: the player data behind a lock plus the loaded configuration
pub struct AppState {
    pub store: RwLock<InMemoryStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, store: InMemoryStore) -> Self {
        Self {
            store: RwLock::new(store),
            config,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartSchedulingRequest {
    user_id: String,
    opponent_ids: Option<Vec<String>>,
    from_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutualAvailabilityRequest {
    user_id: String,
    opponent_id: String,
    date: NaiveDate,
}

#[derive(Deserialize)]
pub struct ConvertUtrRequest {
    utr: f64,
}

#[derive(Deserialize)]
pub struct SkillQuizRequest {
    answers: Vec<u32>,
}

fn error_json(message: impl std::fmt::Display) -> serde_json::Value {
    serde_json::json!({"error": message.to_string()})
}

fn lock_poisoned() -> HttpResponse {
    error!("player store lock poisoned");
    HttpResponse::InternalServerError().json(error_json("Player store unavailable"))
}

/// Maps engine errors to 400 and collaborator failures to 502
fn service_error_response(err: &ServiceError) -> HttpResponse {
    match err {
        ServiceError::Scheduling(e) => HttpResponse::BadRequest().json(error_json(e)),
        ServiceError::Source { .. } => {
            warn!(error = %err, "scheduling source failed");
            HttpResponse::BadGateway().json(error_json(err))
        }
    }
}

// Smart scheduling endpoint
async fn smart_scheduling(
    req: web::Json<SmartSchedulingRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Ok(store) = state.store.read() else {
        return Ok(lock_poisoned());
    };
    let scheduler = SmartScheduler::new(
        &*store,
        &state.config.scheduling,
        state.config.weights.clone(),
    );
    let from = req.from_date.unwrap_or_else(|| Local::now().date_naive());

    // Without explicit opponents, fall back to recommended players
    let result = match &req.opponent_ids {
        Some(opponents) => scheduler.suggest(&req.user_id, opponents, from),
        None => scheduler.suggest_for_recommended(&req.user_id, from),
    };

    match result {
        Ok(suggestions) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "totalSuggestions": suggestions.len(),
            "suggestions": suggestions,
        }))),
        Err(e) => Ok(service_error_response(&e)),
    }
}

// Candidate slots for one pair on one date
async fn mutual_availability(
    req: web::Json<MutualAvailabilityRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Ok(store) = state.store.read() else {
        return Ok(lock_poisoned());
    };
    let scheduler = SmartScheduler::new(
        &*store,
        &state.config.scheduling,
        state.config.weights.clone(),
    );

    match scheduler.mutual_availability(&req.user_id, &req.opponent_id, req.date) {
        Ok(slots) => Ok(HttpResponse::Ok().json(serde_json::json!({"slots": slots}))),
        Err(e) => Ok(service_error_response(&e)),
    }
}

async fn convert_utr(req: web::Json<ConvertUtrRequest>) -> Result<HttpResponse> {
    match validate_utr(req.utr) {
        Ok(utr) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "utr": utr,
            "ntrp": utr_to_ntrp(utr),
        }))),
        Err(e) => Ok(HttpResponse::BadRequest().json(error_json(e))),
    }
}

// Skill quiz: each answer is worth 1-5 points
async fn skill_quiz(req: web::Json<SkillQuizRequest>) -> Result<HttpResponse> {
    match ntrp_from_quiz(&req.answers) {
        Ok(ntrp) => Ok(HttpResponse::Ok().json(serde_json::json!({"ntrp": ntrp}))),
        Err(e) => Ok(HttpResponse::BadRequest().json(error_json(e))),
    }
}

async fn recommendations(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let Ok(store) = state.store.read() else {
        return Ok(lock_poisoned());
    };

    let Some(profile) = store.profile(&user_id) else {
        return Ok(HttpResponse::NotFound().json(error_json(format!("Unknown player: {user_id}"))));
    };
    let recommendations =
        recommend_players(profile, &store.profiles(), DEFAULT_RECOMMENDATION_LIMIT);
    Ok(HttpResponse::Ok().json(serde_json::json!({"recommendations": recommendations})))
}

// Availability submission endpoint
async fn submit_availability(
    req: web::Json<AvailabilitySubmission>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (player_id, slot) = match validate_submission(&req) {
        Ok(valid) => valid,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e.to_string(),
            })))
        }
    };

    // Persist first so the store never holds rows the CSV lost
    if let Some(path) = &state.config.data.availability {
        let row = [(player_id.clone(), slot.clone())];
        if let Err(e) = export_availability_to_csv(&row, path) {
            error!(error = %e, path = %path.display(), "failed to append availability");
            return Ok(HttpResponse::InternalServerError().json(error_json("Failed to save submission")));
        }
    }

    let Ok(mut store) = state.store.write() else {
        return Ok(lock_poisoned());
    };
    store.add_availability(&player_id, slot.clone());
    info!(player = %player_id, day = slot.day_of_week, "availability submitted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "playerId": player_id,
        "slot": slot,
    })))
}

// Admin CSV upload endpoint, replaces one kind of data wholesale
async fn admin_upload(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Some(expected) = state.config.admin_password.as_deref() else {
        return Ok(HttpResponse::Forbidden().json(serde_json::json!({"success": false, "error": "Uploads are disabled"})));
    };

    // Check password from header
    let password = req
        .headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if password != expected {
        return Ok(HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "error": "Unauthorized"})));
    }

    let kind = path.into_inner();
    let parsed = match kind.as_str() {
        "availability" => read_availability(&body[..]).map(Upload::Availability),
        "busy" => read_busy_events(&body[..]).map(Upload::Busy),
        "profiles" => read_profiles(&body[..]).map(Upload::Profiles),
        _ => return Ok(HttpResponse::BadRequest().json(error_json(format!("Unknown upload kind: {kind}")))),
    };
    let upload = match parsed {
        Ok(upload) => upload,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": format!("Failed to process CSV: {}", e),
            })))
        }
    };

    let Ok(mut store) = state.store.write() else {
        return Ok(lock_poisoned());
    };
    let rows = upload.apply(&mut store);
    info!(kind = %kind, rows, "admin upload applied");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "rows": rows,
    })))
}

enum Upload {
    Availability(Vec<(String, crate::schedule::AvailabilitySlot)>),
    Busy(Vec<(String, crate::schedule::BusyEvent)>),
    Profiles(Vec<crate::compatibility::PlayerProfile>),
}

impl Upload {
    /// Replaces the matching store contents, returns the number of rows loaded
    fn apply(self, store: &mut InMemoryStore) -> usize {
        match self {
            Upload::Availability(rows) => {
                let n = rows.len();
                store.replace_availability(rows);
                n
            }
            Upload::Busy(rows) => {
                let n = rows.len();
                store.replace_busy_events(rows);
                n
            }
            Upload::Profiles(profiles) => {
                let n = profiles.len();
                store.replace_profiles(profiles);
                n
            }
        }
    }
}

/// Registers every API route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/smart-scheduling", web::post().to(smart_scheduling))
        .route("/api/mutual-availability", web::post().to(mutual_availability))
        .route("/api/convert-utr", web::post().to(convert_utr))
        .route("/api/skill-quiz", web::post().to(skill_quiz))
        .route("/api/availability", web::post().to(submit_availability))
        .service(web::resource("/api/recommendations/{user_id}").route(web::get().to(recommendations)))
        .service(web::resource("/api/admin/upload/{kind}").route(web::post().to(admin_upload)));
}

pub async fn start_server(config: Config, store: InMemoryStore) -> std::io::Result<()> {
    let port = config.port;
    let app_state = web::Data::new(AppState::new(config, store));

    info!(port, "starting web server");
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
