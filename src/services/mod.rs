pub mod auth;
pub mod config_check;
pub mod zermelo;

pub use auth::DeviceAuthenticator;
pub use config_check::ConfigCheck;
pub use zermelo::{HttpTransport, Transport, UpstreamResponse, ZermeloClient};
