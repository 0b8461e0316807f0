mod endpoint;
mod http;

pub use endpoint::report_url;
pub use http::HttpReporter;
