pub mod traits;
pub mod sqlite;

pub use traits::{IndexQuery, ItemStore, PageCursor, QueryPage};
pub use sqlite::{SqliteItemStore, SqliteStorage};
