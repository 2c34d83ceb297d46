pub mod catalog_service;
pub mod catalog_store;
pub mod export_service;
pub mod google_auth;
pub mod intake_service;
pub mod submission_service;
