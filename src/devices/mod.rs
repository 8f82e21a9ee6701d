pub mod sl50;

pub use sl50::{FeedSource, SL50};
