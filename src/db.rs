pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod migrations;
pub use migrations::{MigrationError, MIGRATOR};
