pub mod address;
pub mod authorization;
pub mod code;
pub mod education;
pub mod mark;
pub mod password;
pub mod planning;
pub mod qr;
pub mod user;

pub use address::{Address, UserAddress};
pub use authorization::{Authorization, Role};
pub use code::Code;
pub use education::{Education, Subject, UserEducationLevelSubject};
pub use mark::UserMark;
pub use password::{Password, PasswordRecord};
pub use planning::{CalendarPlanning, CalendarPlanningActor};
pub use qr::QrCodeRegistry;
pub use user::{User, UserStatus};
