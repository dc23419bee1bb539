//! HTTP handler functions for the rent insights API.

use actix_web::{HttpResponse, web};
use rent_insights_query::{RentInsightsQuery, RequestScope};
use rent_insights_server_models::{ApiData, ApiHealth, ApiRentInsights, RentInsightsParams};

use crate::{AppState, error::ApiError};

/// `GET /health`
///
/// Reports `503` with `healthy: false` when the store does not answer.
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let healthy = match state.connection() {
        Ok(conn) => web::block(move || rent_insights_database::ping(&conn))
            .await
            .is_ok_and(|ping| ping.is_ok()),
        Err(_) => false,
    };

    let body = ApiHealth {
        healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    if healthy {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

/// `GET /rent-insights`
///
/// Validates the parameters, then aggregates the rent band on the blocking
/// pool with a connection of its own.
pub async fn rent_insights(
    state: web::Data<AppState>,
    params: web::Query<RentInsightsParams>,
) -> Result<HttpResponse, ApiError> {
    let request = params.validate()?;
    let conn = state.connection()?;
    let config = state.config;

    let band = web::block(move || {
        let scope = RequestScope::new();
        RentInsightsQuery::new(&conn, &config).execute_in(&request, &scope)
    })
    .await??;

    Ok(HttpResponse::Ok().json(ApiData {
        data: ApiRentInsights::from(band),
    }))
}
