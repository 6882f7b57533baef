pub mod arcade;
pub mod move_to;
pub mod ramp;
pub mod tank_drive;
pub mod turn_to;

pub use arcade::ArcadeWithHeading;
pub use move_to::MoveToSetpoint;
pub use ramp::RampSpeed;
pub use tank_drive::TankMoveTo;
pub use turn_to::TurnToAngle;
