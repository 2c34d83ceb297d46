pub mod application;
pub mod upload;
pub mod vacancy;
