pub mod attributes;
pub mod clock;
pub mod entry;
pub mod item;

pub use attributes::{AttributeMap, AttributeValue};
pub use clock::{Clock, FixedClock, SystemClock};
pub use entry::RawEntry;
pub use item::{CanonicalItem, IdCursor, TTL_WINDOW_SECS};
