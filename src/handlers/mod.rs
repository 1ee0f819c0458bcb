// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer access token)
pub mod protected;
pub mod public;
