pub mod filter;

pub use filter::matches_request;
