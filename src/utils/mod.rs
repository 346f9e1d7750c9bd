pub mod http_helpers;
pub mod logger;

pub use http_helpers::HTTPError;
