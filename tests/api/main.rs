#[path = "../common/mod.rs"]
mod common;

mod cascading_failures;
