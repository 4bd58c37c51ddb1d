//! JSON API over the bracket engine, backed by the in-memory store.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST (e.g. 127.0.0.1), PORT (e.g. 8080).

use actix_web::{
    get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use esports_bracket_web::{
    assign_team_ids, engine, shuffle_teams, standings_csv, BracketConfig, GameMatch, InMemoryStore,
    MatchStore, ResultSubmission, SkippedEdge, TeamEntry, Tournament, TournamentError, TournamentId,
};
use serde::{Deserialize, Serialize};

type AppState = Data<InMemoryStore>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    #[serde(default)]
    description: Option<String>,
    teams: Vec<TeamEntry>,
    #[serde(default)]
    config: BracketConfig,
    /// Randomize the draw before generating (default). When false, teams keep the submitted order.
    #[serde(default = "default_shuffle")]
    shuffle: bool,
}

fn default_shuffle() -> bool {
    true
}

#[derive(Deserialize)]
struct UpdateTeamBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    logo_url: Option<String>,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and team id (e.g. /api/tournaments/{id}/teams/{team_id})
#[derive(Deserialize)]
struct TournamentTeamPath {
    id: TournamentId,
    team_id: String,
}

/// Path segments: tournament id and match id (e.g. /api/tournaments/{id}/matches/{match_id}/result)
#[derive(Deserialize)]
struct TournamentMatchPath {
    id: TournamentId,
    match_id: String,
}

#[derive(Serialize)]
struct TournamentView {
    tournament: Tournament,
    matches: Vec<GameMatch>,
}

#[derive(Serialize)]
struct ResultResponse {
    updated_match: GameMatch,
    playoffs_seeded: bool,
    skipped: Vec<SkippedEdge>,
}

fn error_response(e: TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::TournamentNotFound(_)
        | TournamentError::MatchNotFound(_)
        | TournamentError::TeamNotFound(_) => HttpResponse::NotFound().json(body),
        TournamentError::PersistenceConflict(_) => HttpResponse::Conflict().json(body),
        TournamentError::Storage(_) | TournamentError::Export(_) => {
            HttpResponse::InternalServerError().json(body)
        }
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn tournament_view(state: &InMemoryStore, id: TournamentId) -> Result<TournamentView, TournamentError> {
    Ok(TournamentView {
        tournament: engine::load_tournament(state, id)?,
        matches: engine::load_graph(state, id)?.into_matches(),
    })
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "esports-bracket-web",
    })
}

fn create_tournament(state: &InMemoryStore, body: CreateTournamentBody) -> Result<TournamentView, TournamentError> {
    let teams = if body.shuffle {
        shuffle_teams(&body.teams, &mut rand::thread_rng())
    } else {
        assign_team_ids(&body.teams)
    };
    let tournament = engine::create_tournament(state, body.name.trim(), teams, body.config)?;
    if let Some(description) = body.description.filter(|d| !d.trim().is_empty()) {
        state.update_tournament(tournament.id, &mut |t| {
            t.description = Some(description.clone());
            Ok(())
        })?;
    }
    tournament_view(state, tournament.id)
}

/// Create a tournament in Draft with its full bracket.
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<CreateTournamentBody>) -> HttpResponse {
    match create_tournament(state.get_ref(), body.into_inner()) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(e),
    }
}

/// List tournament ids, oldest first.
#[get("/api/tournaments")]
async fn api_list_tournaments(state: AppState) -> HttpResponse {
    match state.tournament_ids() {
        Ok(ids) => HttpResponse::Ok().json(ids),
        Err(e) => error_response(e),
    }
}

/// Get a tournament with all of its matches.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match tournament_view(state.get_ref(), path.id) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(e),
    }
}

/// Draft -> PendingApproval.
#[post("/api/tournaments/{id}/submit")]
async fn api_submit_for_approval(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match engine::submit_for_approval(state.get_ref(), path.id) {
        Ok(t) => HttpResponse::Ok().json(t),
        Err(e) => error_response(e),
    }
}

/// PendingApproval -> Approved.
#[post("/api/tournaments/{id}/approve")]
async fn api_approve(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match engine::approve(state.get_ref(), path.id) {
        Ok(t) => HttpResponse::Ok().json(t),
        Err(e) => error_response(e),
    }
}

/// PendingApproval -> Rejected.
#[post("/api/tournaments/{id}/reject")]
async fn api_reject(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match engine::reject(state.get_ref(), path.id) {
        Ok(t) => HttpResponse::Ok().json(t),
        Err(e) => error_response(e),
    }
}

/// Edit a team's name or logo.
#[put("/api/tournaments/{id}/teams/{team_id}")]
async fn api_update_team(
    state: AppState,
    path: Path<TournamentTeamPath>,
    body: Json<UpdateTeamBody>,
) -> HttpResponse {
    let body = body.into_inner();
    match engine::update_team(state.get_ref(), path.id, &path.team_id, body.name, body.logo_url) {
        Ok(t) => HttpResponse::Ok().json(t),
        Err(e) => error_response(e),
    }
}

/// Submit a score (advances teams) or, with 0-0, just a start time.
#[post("/api/tournaments/{id}/matches/{match_id}/result")]
async fn api_submit_result(
    state: AppState,
    path: Path<TournamentMatchPath>,
    body: Json<ResultSubmission>,
) -> HttpResponse {
    match engine::submit_result(state.get_ref(), path.id, &path.match_id, &body) {
        Ok(adv) => HttpResponse::Ok().json(ResultResponse {
            updated_match: adv.updated_match,
            playoffs_seeded: adv.playoffs_seeded,
            skipped: adv.skipped,
        }),
        Err(e) => error_response(e),
    }
}

/// Group tables as JSON.
#[get("/api/tournaments/{id}/standings")]
async fn api_standings(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match engine::standings(state.get_ref(), path.id) {
        Ok(standings) => HttpResponse::Ok().json(standings),
        Err(e) => error_response(e),
    }
}

/// Group tables as a CSV download.
#[get("/api/tournaments/{id}/standings.csv")]
async fn api_standings_csv(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    match engine::standings(state.get_ref(), path.id).and_then(|s| standings_csv(&s)) {
        Ok(csv) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(("Content-Disposition", "attachment; filename=\"standings.csv\""))
            .body(csv),
        Err(e) => error_response(e),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(InMemoryStore::new());

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_list_tournaments)
            .service(api_standings_csv)
            .service(api_standings)
            .service(api_get_tournament)
            .service(api_submit_for_approval)
            .service(api_approve)
            .service(api_reject)
            .service(api_update_team)
            .service(api_submit_result)
    })
    .bind(bind)?
    .run()
    .await
}
