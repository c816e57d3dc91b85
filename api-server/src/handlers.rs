use actix_web::{
    http::header::ContentType,
    web::{self, Data, Json, Path, Query},
    HttpResponse, Responder,
};
use chrono::Utc;
use labpanic_core::ScoreError;

use crate::config::AppState;
use crate::protocol;
use crate::response::score_error_response;
use crate::store::ScoreRecord;
use crate::types::{
    iso_timestamp, HealthResponse, LeaderboardEntry, LeaderboardQuery, LeaderboardResponse,
    StartSessionRequest, StartSessionResponse, SubmitScoreRequest, SubmitScoreResponse,
    VersionResponse, WeeksResponse,
};

pub(crate) fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health))
        .route("/api/version", web::get().to(version))
        .route("/api/sessions/start", web::post().to(start_session))
        .route("/api/scores", web::post().to(submit_score))
        .route("/api/leaderboard", web::get().to(leaderboard))
        .route("/api/leaderboard/weeks", web::get().to(leaderboard_weeks))
        .route("/share/{share_id}", web::get().to(share_page));
}

pub(crate) async fn health(state: Data<AppState>) -> impl Responder {
    let counts = match state.store.counts() {
        Ok(counts) => counts,
        Err(e) => {
            tracing::error!("health check failed: {e}");
            return score_error_response(&ScoreError::from(e));
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        service: "labpanic-api",
        timestamp: iso_timestamp(Utc::now()),
        sessions: counts.sessions,
        scores: counts.scores,
        environment: state.app_env.clone(),
    })
}

pub(crate) async fn version() -> impl Responder {
    HttpResponse::Ok().json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// An unreadable or absent body is treated as an empty request.
pub(crate) async fn start_session(
    state: Data<AppState>,
    body: Option<Json<StartSessionRequest>>,
) -> impl Responder {
    let request = body.map(Json::into_inner).unwrap_or_default();
    match protocol::start_session(
        state.store.as_ref(),
        request.platform.as_deref(),
        state.session_ttl,
        Utc::now(),
    ) {
        Ok(session) => HttpResponse::Ok().json(StartSessionResponse {
            session_id: session.session_id,
            start_token: session.start_token,
            started_at: iso_timestamp(session.started_at),
            expires_at: iso_timestamp(session.expires_at),
        }),
        Err(err) => score_error_response(&err),
    }
}

pub(crate) async fn submit_score(
    state: Data<AppState>,
    body: Option<Json<SubmitScoreRequest>>,
) -> impl Responder {
    let request = body.map(Json::into_inner).unwrap_or_default();
    match protocol::submit_score(state.store.as_ref(), &request, Utc::now()) {
        Ok(submitted) => {
            let record = submitted.record;
            HttpResponse::Created().json(SubmitScoreResponse {
                share_url: share_url(&state.public_base_url, &record.share_id),
                score_id: record.score_id,
                player_name: record.player_name,
                score: record.score,
                weekly_rank: submitted.weekly_rank,
                alltime_rank: submitted.alltime_rank,
                weekly_key: record.week_key,
                created_at: iso_timestamp(record.created_at),
            })
        }
        Err(err) => score_error_response(&err),
    }
}

pub(crate) async fn leaderboard(
    state: Data<AppState>,
    query: Query<LeaderboardQuery>,
) -> impl Responder {
    let now = Utc::now();
    match protocol::get_leaderboard(
        state.store.as_ref(),
        query.scope.as_deref(),
        query.limit.as_deref(),
        query.week.as_deref(),
        now,
    ) {
        Ok(board) => HttpResponse::Ok().json(LeaderboardResponse {
            scope: board.scope,
            weekly_key: board.week_key,
            updated_at: iso_timestamp(now),
            entries: board
                .entries
                .into_iter()
                .map(LeaderboardEntry::from_ranked)
                .collect(),
        }),
        Err(err) => score_error_response(&err),
    }
}

pub(crate) async fn leaderboard_weeks(state: Data<AppState>) -> impl Responder {
    match protocol::get_available_weeks(state.store.as_ref()) {
        Ok(weeks) => HttpResponse::Ok().json(WeeksResponse { weeks }),
        Err(err) => score_error_response(&err),
    }
}

pub(crate) async fn share_page(state: Data<AppState>, path: Path<String>) -> impl Responder {
    let share_id = path.into_inner();
    match protocol::get_shared_score(state.store.as_ref(), &share_id) {
        Ok(Some(record)) => HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(render_share_page(&record)),
        Ok(None) => HttpResponse::NotFound()
            .content_type(ContentType::plaintext())
            .body("Score not found"),
        Err(err) => score_error_response(&err),
    }
}

pub(crate) fn share_url(base_url: &str, share_id: &str) -> String {
    format!("{}/share/{share_id}", base_url.trim_end_matches('/'))
}

fn render_share_page(record: &ScoreRecord) -> String {
    let name = escape_html(&record.player_name);
    let score = format_thousands(record.score);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Lab Panic - {name} Score</title>
    <meta property="og:title" content="Lab Panic - {name} Score">
    <meta property="og:description" content="{name} scored {score} points in Lab Panic!">
    <meta property="og:type" content="website">
    <style>
        body {{ font-family: monospace; background: #0f0f23; color: #fff; margin: 0; padding: 20px;
               display: flex; justify-content: center; align-items: center; min-height: 100vh; text-align: center; }}
        .share-card {{ background: rgba(0, 0, 0, 0.8); padding: 2rem; border-radius: 15px;
                       border: 2px solid #00ff88; max-width: 500px; }}
        .score {{ font-size: 3rem; color: #00ff88; margin: 1rem 0; }}
        .player-name {{ font-size: 1.5rem; color: #88aaff; margin-bottom: 1rem; }}
        .play-button {{ background: #00ff88; color: #000; padding: 1rem 2rem; border-radius: 10px;
                        font-weight: 700; text-decoration: none; display: inline-block; margin-top: 1rem; }}
    </style>
</head>
<body>
    <div class="share-card">
        <h1>Lab Panic</h1>
        <div class="player-name">{name}</div>
        <div class="score">{score} points</div>
        <p>Play now and try to beat this score!</p>
        <a href="/" class="play-button">PLAY NOW</a>
    </div>
</body>
</html>
"#
    )
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// `1234567` -> `1,234,567`
pub(crate) fn format_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
