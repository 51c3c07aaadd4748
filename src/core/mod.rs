pub mod config;
pub mod corpus;
pub mod error;
pub mod response;
pub mod segment;
pub mod similarity_metric;
pub mod store;
