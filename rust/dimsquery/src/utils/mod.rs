pub mod tolerance_ranges;
pub mod tuple_range;

pub use tuple_range::{
    TupleRange,
    TupleRangeError,
    partition_range_by_key,
};
