// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Clients ---
        handlers::clients::list_clients,
        handlers::clients::get_client,
        handlers::clients::create_client,
        handlers::clients::update_client,
        handlers::clients::delete_client,
        handlers::clients::list_client_projects,
        handlers::clients::list_client_invoices,

        // --- Projects ---
        handlers::projects::list_projects,
        handlers::projects::get_project,
        handlers::projects::create_project,
        handlers::projects::update_project,
        handlers::projects::delete_project,
        handlers::projects::list_project_invoices,

        // --- Invoices ---
        handlers::invoices::list_invoices,
        handlers::invoices::get_invoice,
        handlers::invoices::create_invoice,
        handlers::invoices::update_invoice,
        handlers::invoices::update_invoice_status,
        handlers::invoices::delete_invoice,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::AuthUser,
            models::auth::LoginPayload,
            models::auth::AuthResponse,

            // --- Clients / Projects ---
            models::client::Client,
            models::client::ClientPayload,
            models::project::ProjectStatus,
            models::project::Project,
            models::project::ProjectPayload,

            // --- Invoices ---
            models::invoice::InvoiceStatus,
            models::invoice::Invoice,
            models::invoice::InvoiceItem,
            models::invoice::InvoiceSummary,
            models::invoice::InvoiceDetail,
            models::invoice::StatusChange,
            models::invoice::InvoiceHeader,
            models::invoice::LineItemInput,
            models::invoice::InvoicePayload,
            models::invoice::StatusPayload,

            handlers::MessageResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Login e usuário atual"),
        (name = "Clients", description = "Cadastro de clientes"),
        (name = "Projects", description = "Projetos por cliente"),
        (name = "Invoices", description = "Faturas, itens, totais e numeração")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
