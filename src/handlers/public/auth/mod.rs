// handlers/public/auth/mod.rs - Token acquisition
pub mod login;
pub mod qr;
pub mod refresh;
pub mod register;

pub use login::post as login_post;
pub use qr::put as qr_login_put;
pub use refresh::post as refresh_post;
pub use register::post as register_post;
pub use register::post_with_email as register_with_email_post;
