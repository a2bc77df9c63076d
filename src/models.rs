pub mod auth;
pub mod company;
pub mod quotation;
pub mod rates;
pub mod representation;
