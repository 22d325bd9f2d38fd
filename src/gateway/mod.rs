pub mod auth;
pub mod protocol;
pub mod routes;
pub mod server;

pub use auth::{resolve_gateway_auth, ResolvedGatewayAuth};
pub use server::{GatewayServer, GatewayState};
