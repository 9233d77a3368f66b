pub mod store;
pub use store::{ClientStore, InvoiceStore, ProjectStore};
pub mod client_repo;
pub use client_repo::ClientRepository;
pub mod project_repo;
pub use project_repo::ProjectRepository;
pub mod invoice_repo;
pub use invoice_repo::InvoiceRepository;
pub mod memory_store;
pub use memory_store::MemoryStore;
