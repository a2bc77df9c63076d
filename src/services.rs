pub mod company_service;
pub mod quotation_service;
pub mod rate_providers;
pub mod rate_service;
pub mod representation_service;
pub mod sequence_service;
