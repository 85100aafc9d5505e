pub mod ultrasonic;

use crate::events::Sample;

/// Anything that can produce one distance reading on demand.
pub trait DistanceSensor {
    fn measure(&mut self) -> Sample;
}
