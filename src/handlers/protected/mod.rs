// handlers/protected/mod.rs - Protected handlers (bearer access token required)
//
// Every handler here runs behind `jwt_auth_middleware` and receives the
// verified caller as `Extension<AuthUser>`. Role checks happen in the
// services against the stored authorization level.
pub mod account;
pub mod address;
pub mod calendar;
pub mod education;
pub mod mark;
