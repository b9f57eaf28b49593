use axum::http::StatusCode;
use tracing::{info, instrument, warn};

use crate::{
    auth::dto::present,
    error::{ApiError, StoreError},
    event::{HandlerEvent, HandlerResponse},
    products::{
        dto::{CreateProductRequest, CreatedProductResponse, ProductListResponse, PLACEHOLDER_IMAGE},
        repo_types::{CreatedProduct, NewProduct, ProductListing},
    },
    state::AppState,
};

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Entry point for the catalog function: `GET` lists, `POST` creates.
#[instrument(
    skip(state, event),
    fields(method = %event.http_method, origin = event.header("origin").unwrap_or("-"))
)]
pub async fn handle(state: &AppState, event: HandlerEvent) -> HandlerResponse {
    match dispatch(state, &event).await {
        Ok(resp) => resp,
        Err(e) => {
            if e.status().is_client_error() {
                warn!(error = %e, kind = e.kind(), "catalog request rejected");
            }
            e.into_handler_response()
        }
    }
}

async fn dispatch(state: &AppState, event: &HandlerEvent) -> Result<HandlerResponse, ApiError> {
    match event.method().as_str() {
        "OPTIONS" => Ok(HandlerResponse::preflight(ALLOWED_METHODS)),
        "GET" => {
            let products = list(state).await?;
            Ok(HandlerResponse::json(
                StatusCode::OK,
                &ProductListResponse { products },
            ))
        }
        "POST" => {
            let product = create(state, event.json_body()?).await?;
            Ok(HandlerResponse::json(
                StatusCode::OK,
                &CreatedProductResponse { success: true, product },
            ))
        }
        _ => Err(ApiError::MethodNotAllowed),
    }
}

pub async fn list(state: &AppState) -> Result<Vec<ProductListing>, ApiError> {
    let products = state.store.list_products().await?;
    info!(count = products.len(), "products listed");
    Ok(products)
}

pub async fn create(state: &AppState, payload: CreateProductRequest) -> Result<CreatedProduct, ApiError> {
    // Zero counts as missing for both ids and prices.
    let seller_id = payload.seller_id.filter(|id| *id != 0);
    let price = payload.price.filter(|p| *p != 0.0);

    let (Some(seller_id), Some(name), Some(category), Some(device), Some(manufacturer), Some(price)) = (
        seller_id,
        present(payload.name),
        present(payload.category),
        present(payload.device),
        present(payload.manufacturer),
        price,
    ) else {
        return Err(ApiError::Validation(
            "seller_id, name, category, device, manufacturer and price are required".into(),
        ));
    };

    let compatibility = match payload.compatibility {
        Some(input) => input.into_list().map_err(ApiError::Validation)?,
        None => Vec::new(),
    };

    let new = NewProduct {
        seller_id,
        name,
        category,
        device,
        manufacturer,
        compatibility,
        price,
        description: payload.description.unwrap_or_default(),
        image_url: payload.image_url.unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        in_stock: payload.in_stock.unwrap_or(true),
    };

    let product = match state.store.create_product(new).await {
        Ok(p) => p,
        Err(StoreError::ForeignKeyViolation) => {
            return Err(ApiError::Validation(format!("seller {seller_id} does not exist")));
        }
        Err(e) => return Err(e.into()),
    };

    info!(product_id = product.id, seller_id, "product created");
    Ok(product)
}
