// HTTP request handlers for the market API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::SharedState;
use crate::error::MarketError;
use crate::market::Outcome;
use crate::models::*;

// ===== ERROR MAPPING =====

/// `MarketError` as an HTTP response.
pub struct ApiError(pub MarketError);

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            MarketError::InvalidAmount | MarketError::AmountOverflow { .. } => StatusCode::BAD_REQUEST,
            MarketError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            MarketError::TransferFailed(_) => StatusCode::PAYMENT_REQUIRED,
            MarketError::MarketClosed
            | MarketError::AlreadySettled
            | MarketError::NotSettled
            | MarketError::NoStake
            | MarketError::NoWinningStake
            | MarketError::AlreadyClaimed => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.0.to_string(),
            code: self.0.code().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ===== ROUTER =====

pub fn router(state: SharedState) -> Router {
    Router::new()
        // ===== HEALTH =====
        .route("/", get(health_check))
        .route("/health", get(health_check))
        // ===== READS =====
        .route("/market", get(get_market))
        .route("/odds", get(get_odds))
        .route("/stakes/:participant", get(get_stakes))
        .route("/quote/:participant", get(get_quote))
        .route("/balance/:account", get(get_balance))
        .route("/events", get(get_events))
        // ===== FUNDING =====
        .route("/deposit", post(deposit))
        .route("/approve", post(approve))
        // ===== MARKET OPERATIONS =====
        .route("/bet", post(place_bet))
        .route("/withdraw", post(withdraw_bet))
        .route("/settle", post(settle_market))
        .route("/claim", post(claim_reward))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn health_check() -> &'static str {
    "Binary Pool Market - Online"
}

// ===== READ ENDPOINTS =====

pub async fn get_market(State(state): State<SharedState>) -> Json<MarketResponse> {
    let app = state.read().await;
    Json(MarketResponse {
        snapshot: app.market.snapshot(),
        custody_balance: app.market.asset().custody_balance(),
    })
}

pub async fn get_odds(State(state): State<SharedState>) -> Json<crate::market::Odds> {
    Json(state.read().await.market.get_odds())
}

pub async fn get_stakes(
    State(state): State<SharedState>,
    Path(participant): Path<String>,
) -> Json<StakesResponse> {
    let app = state.read().await;
    Json(StakesResponse {
        stake_a: app.market.stake_of(&participant, Outcome::A),
        stake_b: app.market.stake_of(&participant, Outcome::B),
        claimed: app.market.has_claimed(&participant),
        participant,
    })
}

pub async fn get_quote(
    State(state): State<SharedState>,
    Path(participant): Path<String>,
) -> ApiResult<QuoteResponse> {
    let quote = state.read().await.market.quote_reward(&participant)?;
    Ok(Json(QuoteResponse { participant, quote }))
}

pub async fn get_balance(
    State(state): State<SharedState>,
    Path(account): Path<String>,
) -> Json<BalanceResponse> {
    let app = state.read().await;
    let asset = app.market.asset();
    Json(BalanceResponse {
        balance: asset.balance_of(&account),
        allowance: asset.allowance_of(&account),
        account,
    })
}

pub async fn get_events(State(state): State<SharedState>) -> Json<EventsResponse> {
    let events = state.read().await.events.records();
    Json(EventsResponse {
        count: events.len(),
        events,
    })
}

// ===== FUNDING ENDPOINTS =====

pub async fn deposit(
    State(state): State<SharedState>,
    Json(request): Json<DepositRequest>,
) -> ApiResult<BalanceResponse> {
    if request.amount == 0 {
        return Err(MarketError::InvalidAmount.into());
    }
    let mut app = state.write().await;
    let asset = app.market.asset_mut();
    let balance = asset
        .mint(&request.account, request.amount)
        .map_err(|e| ApiError(e.into()))?;
    tracing::info!(account = %request.account, amount = request.amount, balance, "account funded");
    Ok(Json(BalanceResponse {
        balance,
        allowance: asset.allowance_of(&request.account),
        account: request.account,
    }))
}

pub async fn approve(
    State(state): State<SharedState>,
    Json(request): Json<ApproveRequest>,
) -> Json<BalanceResponse> {
    let mut app = state.write().await;
    let asset = app.market.asset_mut();
    asset.approve(&request.account, request.amount);
    Json(BalanceResponse {
        balance: asset.balance_of(&request.account),
        allowance: request.amount,
        account: request.account,
    })
}

// ===== MARKET OPERATION ENDPOINTS =====

pub async fn place_bet(
    State(state): State<SharedState>,
    Json(request): Json<PlaceBetRequest>,
) -> ApiResult<BetResponse> {
    let mut app = state.write().await;
    app.market
        .place_bet(&request.participant, request.outcome, request.amount)?;

    Ok(Json(BetResponse {
        success: true,
        stake: app.market.stake_of(&request.participant, request.outcome),
        odds: app.market.get_odds(),
        participant: request.participant,
        outcome: request.outcome,
        amount: request.amount,
    }))
}

pub async fn withdraw_bet(
    State(state): State<SharedState>,
    Json(request): Json<WithdrawRequest>,
) -> ApiResult<WithdrawResponse> {
    let mut app = state.write().await;
    let returned = app.market.withdraw_bet(&request.participant, request.outcome)?;

    Ok(Json(WithdrawResponse {
        success: true,
        odds: app.market.get_odds(),
        participant: request.participant,
        outcome: request.outcome,
        returned,
    }))
}

pub async fn settle_market(
    State(state): State<SharedState>,
    Json(request): Json<SettleRequest>,
) -> ApiResult<SettleResponse> {
    let mut guard = state.write().await;
    let app = &mut *guard;
    app.market
        .settle_market_as(&request.caller, request.winning_outcome, app.authority.as_ref())?;

    Ok(Json(SettleResponse {
        success: true,
        winning_outcome: request.winning_outcome,
        total_pool: app.market.total_pool(),
        fee_amount: app.market.fee_amount(),
    }))
}

pub async fn claim_reward(
    State(state): State<SharedState>,
    Json(request): Json<ClaimRequest>,
) -> ApiResult<ClaimResponse> {
    let mut app = state.write().await;
    let reward = app.market.claim_reward(&request.participant)?;

    Ok(Json(ClaimResponse {
        success: true,
        reward,
        fee_transferred: app.market.fee_transferred(),
        participant: request.participant,
    }))
}
