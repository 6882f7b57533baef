pub mod basic;
pub mod tank;

pub use basic::BasicSubsystem;
pub use tank::TankDrivetrain;
