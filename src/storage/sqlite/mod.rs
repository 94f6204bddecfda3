mod connection;
mod item_store;

pub use connection::{validate_table_name, SqliteStorage};
pub use item_store::SqliteItemStore;
