pub mod authenticator;
pub mod handlers;
pub mod password;
pub mod principal;
pub mod service;
pub mod tokens;

pub use principal::Principal;
