pub mod billing_store;
