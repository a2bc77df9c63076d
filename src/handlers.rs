pub mod companies;
pub mod quotations;
pub mod rates;
pub mod representations;
