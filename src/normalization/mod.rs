//! Field extraction: project loosely-typed listing, detail and review payloads
//! onto the fixed export schema. Nothing in here fails; absent data becomes
//! `""`, `0` or `null`.

pub mod detail;
pub mod json;
pub mod listing;
pub mod review;
pub mod row;

pub use detail::{parse_detail_fields, DetailFields};
pub use listing::{normalize_quantity_sold, ListingItem, ListingPage};
pub use review::{parse_review_fields, ReviewFields};
pub use row::OutputRow;
