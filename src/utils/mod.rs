#[macro_use]
pub mod math;
