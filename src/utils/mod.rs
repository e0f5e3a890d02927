pub mod ranking;

pub use ranking::{select_top_k, top_entries};
