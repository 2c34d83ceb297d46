pub mod delimited;
pub mod http;
pub mod sanitize;
pub mod signing;
pub mod time;
pub mod validation;
