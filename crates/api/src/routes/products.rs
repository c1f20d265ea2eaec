//! Product catalogue endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use domain::{NewProduct, Product, ProductUpdate};
use serde::{Deserialize, Serialize};
use service::ProductService;
use storage::ProductStore;

use super::page_request;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub category: Option<String>,
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListProductsResponse {
    pub products: Vec<Product>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// POST /products
#[tracing::instrument(skip(service, payload))]
pub async fn create<P: ProductStore + 'static>(
    State(service): State<Arc<ProductService<P>>>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(new_product) = payload?;
    let product = service.create_product(new_product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products/{id}
#[tracing::instrument(skip(service))]
pub async fn get<P: ProductStore + 'static>(
    State(service): State<Arc<ProductService<P>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(service.get_product(&id).await?))
}

/// GET /products?category=&page_size=&page_token=
#[tracing::instrument(skip(service, query))]
pub async fn list<P: ProductStore + 'static>(
    State(service): State<Arc<ProductService<P>>>,
    query: Result<Query<ListProductsQuery>, QueryRejection>,
) -> Result<Json<ListProductsResponse>, ApiError> {
    let Query(query) = query?;
    let request = page_request(query.page_size, query.page_token);
    let page = service
        .list_products(query.category.as_deref(), &request)
        .await?;

    Ok(Json(ListProductsResponse {
        products: page.items,
        next_page_token: page.next_page_token,
    }))
}

/// PUT or PATCH /products/{id}: replace the product's fields.
#[tracing::instrument(skip(service, payload))]
pub async fn update<P: ProductStore + 'static>(
    State(service): State<Arc<ProductService<P>>>,
    Path(id): Path<String>,
    payload: Result<Json<ProductUpdate>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let Json(update) = payload?;
    Ok(Json(service.update_product(&id, update).await?))
}

/// DELETE /products/{id}
#[tracing::instrument(skip(service))]
pub async fn delete<P: ProductStore + 'static>(
    State(service): State<Arc<ProductService<P>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    service.delete_product(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
