pub mod export;
pub mod lead_service;
pub use lead_service::LeadService;
