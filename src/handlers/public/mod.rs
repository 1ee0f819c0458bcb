// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and the health probe. Everything here must validate its
// own input; there is no authenticated caller to trust.
pub mod auth;
pub mod health;
