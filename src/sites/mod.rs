//! Site metadata and habitat join.

mod aliases;
mod join;

pub use aliases::{LOCATION_ALIASES, canonical_location};
pub use join::{
    SiteInfo, SiteJoin, SiteMetadata, corpus_site_key, join_sites, metadata_site_key,
    read_site_info,
};
