pub mod manager;
pub mod mapper;
pub mod models;
pub mod store;
pub mod value;

pub use manager::{DatabaseError, DatabaseManager};
pub use mapper::{build_delete, build_insert, build_update, Entity, EntitySchema, Statement};
pub use store::{PgStore, Row, Store};
pub use value::SqlValue;
