pub mod audit;
pub mod auth;
pub mod catalog_service;
pub mod crm_service;
pub mod purchasing_service;
pub mod quote_service;
pub mod sale_service;
