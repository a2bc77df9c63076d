pub mod store;
pub use store::{CatalogStore, ConfigStore, QuotationStore, RepresentationStore, SequenceStore};

pub mod company_repo;
pub use company_repo::CatalogRepository;
pub mod representation_repo;
pub use representation_repo::RepresentationRepository;
pub mod quotation_repo;
pub use quotation_repo::{QuotationRepository, SequenceRepository};
pub mod settings_repo;
pub use settings_repo::SettingsRepository;

pub mod memory;
