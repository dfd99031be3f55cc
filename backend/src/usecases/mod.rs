pub mod billing_rollover;
pub mod enforcement_gate;
pub mod errors;
pub mod plan_change;
pub mod plan_overview;
pub mod trial_lifecycle;

#[cfg(test)]
mod test_fixtures;
