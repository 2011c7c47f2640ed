//! SPF record processing: flattening, aggregation, normalization, and
//! wire-limit packing.

pub mod cidr;
pub mod flatten;
pub mod normalize;
pub mod split;

pub use cidr::{
    aggregate, aggregate_with_policy, records_semantically_differ, AggregationPolicy,
};
pub use flatten::{FlattenOutcome, Flattener, MAX_DNS_LOOKUPS};
pub use normalize::{extract_mechanisms, mechanism_set, normalize};
pub use split::{split_and_chain, MAX_TXT_LENGTH};
