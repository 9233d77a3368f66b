pub mod auth;
pub use auth::AuthService;
pub mod client_service;
pub use client_service::ClientService;
pub mod project_service;
pub use project_service::ProjectService;
pub mod invoice_service;
pub use invoice_service::InvoiceService;
pub mod numbering;
pub mod totals;
