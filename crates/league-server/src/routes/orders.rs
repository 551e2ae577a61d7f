//! Shop and registration order endpoints

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use league_orders::{Order, OrderDraft, OrderError, OrderId, OrderStats};

use super::{ok, ApiResult};
use crate::error::ApiError;
use crate::models::{Ack, OrderEmails, OrderPlaced, OrderQuery, OrderStatusBody, TrackingBody};
use crate::notify;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/stats", get(order_stats))
        .route("/:id", get(get_order).delete(delete_order))
        .route("/:id/status", put(update_status))
        .route("/:id/tracking", put(add_tracking))
}

/// All orders newest first, one type only, or one customer's by email
pub async fn list_orders(State(state): State<AppState>, Query(query): Query<OrderQuery>) -> ApiResult<Vec<Order>> {
    let orders = match &query.email {
        Some(email) => state.orders.by_email(email),
        None => state.orders.list(query.order_type),
    };
    ok(orders)
}

pub async fn order_stats(State(state): State<AppState>, Query(query): Query<OrderQuery>) -> ApiResult<OrderStats> {
    ok(state.orders.stats(query.order_type))
}

/// Place an order.
///
/// The order is committed first. A product order linked to a team then
/// credits the team's commission, and the customer and supplier are emailed;
/// neither step can undo the order.
pub async fn create_order(State(state): State<AppState>, Json(draft): Json<OrderDraft>) -> ApiResult<OrderPlaced> {
    if let Some(team_id) = draft.team_id {
        if state.teams.get(team_id).is_none() {
            return Err(ApiError::BadRequest(format!("team {} not found", team_id)));
        }
    }
    let order = state.orders.create(draft)?;

    let commission = match order.team_id {
        Some(team_id) if order.order_type.is_product() => {
            match state
                .teams
                .add_product_commission(team_id, &order.customer_name, order.total, &order.order_number)
            {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(order_id = order.id, team_id, "commission not credited: {}", e);
                    None
                }
            }
        }
        _ => None,
    };

    let notifications = if !order.order_type.is_product() {
        OrderEmails::skipped("registration orders send no shop emails")
    } else if state.config.mail.enabled {
        notify::order_placed(&state.email, &order).await
    } else {
        OrderEmails::skipped("mail disabled")
    };

    ok(OrderPlaced {
        order,
        commission,
        notifications,
    })
}

pub async fn get_order(State(state): State<AppState>, Path(id): Path<OrderId>) -> ApiResult<Order> {
    ok(state.orders.get(id).ok_or(OrderError::NotFound(id))?)
}

pub async fn delete_order(State(state): State<AppState>, Path(id): Path<OrderId>) -> ApiResult<Ack> {
    if !state.orders.delete(id) {
        return Err(OrderError::NotFound(id).into());
    }
    ok(Ack { ok: true })
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<OrderStatusBody>,
) -> ApiResult<Order> {
    ok(state.orders.update_status(id, body.status, &body.notes)?)
}

pub async fn add_tracking(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<TrackingBody>,
) -> ApiResult<Order> {
    ok(state.orders.add_tracking(id, &body.tracking_number, &body.courier)?)
}
