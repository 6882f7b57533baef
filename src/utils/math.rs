use core::ops::{Add, Div, Neg, Sub};

use num_traits::{Float, FromPrimitive};

#[macro_export]
macro_rules! signed_mod {
    ($dividend:expr, $divisor:expr) => {
        (($dividend % $divisor) + $divisor) % $divisor
    };
}
pub use signed_mod;

/// Steps `current` towards `target`, moving at most `max_delta` per call.
///
/// A `max_delta` of zero steps by zero: the value stays at `current`.
pub fn delta_clamp<T: Neg<Output = T> + Copy + Float + Sub<Output = T>>(
    target: T,
    current: T,
    max_delta: T,
) -> T {
    current + num_traits::clamp(target - current, -max_delta.abs(), max_delta.abs())
}

/// Mixes throttle and steer into left/right outputs, scaling both down
/// when their combined magnitude would exceed full scale.
pub fn arcade_desaturate<
    T: Copy + Sub<Output = T> + Add<Output = T> + Float + PartialOrd<T> + Div<Output = T> + FromPrimitive,
>(
    lateral: T,
    angular: T,
) -> (T, T) {
    let left: T = lateral - angular;
    let right: T = lateral + angular;
    let sum = {
        let raw_sum = lateral.abs() + angular.abs();
        let one = T::from_u8(1).unwrap();
        if raw_sum < one {
            one
        } else {
            raw_sum
        }
    };
    (left / sum, right / sum)
}

/// Reduces an angle in degrees to the shortest rotation from `current`.
///
/// The raw angle is first reduced modulo 360; if the reduced value is
/// more than 180 degrees away from `current`, the equivalent negative
/// rotation is used instead. Recomputed on every poll so a moving
/// feedback reading keeps selecting the short path.
pub fn wrap_to_shortest_path(raw: f64, current: f64) -> f64 {
    let mut target = raw % 360.0;
    if (target - current).abs() > 180.0 {
        target -= 360.0;
    }
    target
}
