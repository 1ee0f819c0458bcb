// handlers/protected/account/mod.rs - The caller's own account
pub mod code;
pub mod password;
pub mod profile;
pub mod qr;

pub use code::get as code_get;
pub use code::send as code_send;
pub use code::verify as code_verify;
pub use password::history as password_history;
pub use password::post as password_post;
pub use profile::activate as profile_activate;
pub use profile::get as profile_get;
pub use profile::put as profile_put;
pub use qr::post as qr_generate;
