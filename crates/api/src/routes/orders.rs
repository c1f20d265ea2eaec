//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use domain::{NewOrder, Order, OrderId, OrderItem, OrderStatus};
use serde::{Deserialize, Serialize};
use service::OrderService;
use storage::{OrderStore, OutboxStore};

use super::page_request;
use crate::error::ApiError;

// -- Request types --

/// Body of `POST /orders`. Status and total are server-assigned, so any
/// such fields in the body are ignored.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(req: CreateOrderRequest) -> Self {
        let new_order = NewOrder::new(req.customer_id, req.items);
        match req.id {
            Some(id) => new_order.with_id(id),
            None => new_order,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub customer_id: String,
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

// -- Handlers --

/// POST /orders: create an order and its `order_created` outbox entry.
#[tracing::instrument(skip(service, payload))]
pub async fn create<S, O>(
    State(service): State<Arc<OrderService<S, O>>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError>
where
    S: OrderStore + 'static,
    O: OutboxStore<Tx = S::Tx> + 'static,
{
    let Json(req) = payload?;
    let order = service.create_order(req.into()).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/{id}
#[tracing::instrument(skip(service))]
pub async fn get<S, O>(
    State(service): State<Arc<OrderService<S, O>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError>
where
    S: OrderStore + 'static,
    O: OutboxStore<Tx = S::Tx> + 'static,
{
    let order = service.get_order(&OrderId::new(id)).await?;
    Ok(Json(order))
}

/// GET /orders?customer_id=&page_size=&page_token=
#[tracing::instrument(skip(service, query))]
pub async fn list<S, O>(
    State(service): State<Arc<OrderService<S, O>>>,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> Result<Json<ListOrdersResponse>, ApiError>
where
    S: OrderStore + 'static,
    O: OutboxStore<Tx = S::Tx> + 'static,
{
    let Query(query) = query?;
    let request = page_request(query.page_size, query.page_token);
    let page = service.list_orders(&query.customer_id, &request).await?;

    Ok(Json(ListOrdersResponse {
        orders: page.items,
        next_page_token: page.next_page_token,
    }))
}

/// PATCH /orders/{id}: set the status and record an `order_status_updated`
/// outbox entry.
#[tracing::instrument(skip(service, payload))]
pub async fn update_status<S, O>(
    State(service): State<Arc<OrderService<S, O>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Order>, ApiError>
where
    S: OrderStore + 'static,
    O: OutboxStore<Tx = S::Tx> + 'static,
{
    let Json(req) = payload?;
    let order = service
        .update_order_status(&OrderId::new(id), req.status)
        .await?;
    Ok(Json(order))
}
