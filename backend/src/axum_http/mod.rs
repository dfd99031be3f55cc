pub mod error_responses;
