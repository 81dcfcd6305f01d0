// Bulwark core - HTTP types, middleware chain and logging shared by the
// security crates.

pub mod error;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod status;

pub use error::*;
pub use http::*;
pub use middleware::*;
pub use status::*;
