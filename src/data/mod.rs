//! Data module - CSV loading, grouping and range finding

mod aggregator;
mod loader;
mod range;
mod record;

pub use aggregator::{
    Aggregate, AggregateError, AggregateTable, Aggregator, GroupEntry, GroupKeys, Reduction,
    RowFilter,
};
pub use loader::{DataLoader, LoadError};
pub use range::{find_min_max, Bounds, Extent, RangeOverrides};
pub use record::{Dataset, Record};
