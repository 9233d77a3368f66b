// src/lib.rs

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{common::error::AppError, config::AppState, docs::ApiDoc, middleware::auth::auth_guard};

/// Router completo da API (`/api/...`) + Swagger UI. Os arquivos estáticos
/// do front ficam por conta do `main`.
pub fn router(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/login", post(handlers::auth::login));

    // Rotas protegidas (Bearer obrigatório)
    let protected_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        // Clientes
        .route("/clients"
               ,get(handlers::clients::list_clients)
               .post(handlers::clients::create_client)
        )
        .route("/clients/{id}"
               ,get(handlers::clients::get_client)
               .put(handlers::clients::update_client)
               .delete(handlers::clients::delete_client)
        )
        .route("/clients/{id}/projects", get(handlers::clients::list_client_projects))
        .route("/clients/{id}/invoices", get(handlers::clients::list_client_invoices))
        // Projetos
        .route("/projects"
               ,get(handlers::projects::list_projects)
               .post(handlers::projects::create_project)
        )
        .route("/projects/{id}"
               ,get(handlers::projects::get_project)
               .put(handlers::projects::update_project)
               .delete(handlers::projects::delete_project)
        )
        .route("/projects/{id}/invoices", get(handlers::projects::list_project_invoices))
        // Faturas
        .route("/invoices"
               ,get(handlers::invoices::list_invoices)
               .post(handlers::invoices::create_invoice)
        )
        .route("/invoices/{id}"
               ,get(handlers::invoices::get_invoice)
               .put(handlers::invoices::update_invoice)
               .delete(handlers::invoices::delete_invoice)
        )
        .route("/invoices/{id}/status", put(handlers::invoices::update_invoice_status))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Qualquer /api/... desconhecido é 404 em JSON, nunca o index.html do front
    let api_routes = public_routes
        .merge(protected_routes)
        .fallback(|| async { AppError::not_found("Route") });

    Router::new()
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
