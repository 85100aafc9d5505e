// Presence Reporter — HC-SR04 Ultrasonic Driver
//
// Bit-banged trigger/echo over two GPIOs.  The echo wait shares a single
// timeout budget between "waiting for a previous pulse to end", "waiting for
// the rising edge" and "measuring the high pulse", so one call never blocks
// longer than ECHO_TIMEOUT_US.

/// Echo timing state while waiting for the pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoPhase {
    /// The line may still be high from an earlier pulse; wait it out.
    WaitingForLow,
    WaitingForRise,
    High { rose_at_us: u64 },
}

/// Track the echo line over successive polls.  Returns `Some(width)` once the
/// pulse has ended, `Some(0)` when the budget ran out, `None` to keep polling.
pub fn poll_echo(
    phase: &mut EchoPhase,
    level_high: bool,
    now_us: u64,
    started_us: u64,
    timeout_us: u32,
) -> Option<u32> {
    if now_us.saturating_sub(started_us) > timeout_us as u64 {
        return Some(0);
    }
    match *phase {
        EchoPhase::WaitingForLow if !level_high => {
            *phase = EchoPhase::WaitingForRise;
            None
        }
        EchoPhase::WaitingForLow => None,
        EchoPhase::WaitingForRise if level_high => {
            *phase = EchoPhase::High { rose_at_us: now_us };
            None
        }
        EchoPhase::WaitingForRise => None,
        EchoPhase::High { rose_at_us } if !level_high => {
            Some(now_us.saturating_sub(rose_at_us) as u32)
        }
        EchoPhase::High { .. } => None,
    }
}

#[cfg(target_os = "espidf")]
pub use self::esp::HcSr04;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_hal::delay::Ets;
    use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver};

    use super::{poll_echo, EchoPhase};
    use crate::config::*;
    use crate::drivers::DistanceSensor;
    use crate::events::Sample;

    fn now_us() -> u64 {
        unsafe { esp_idf_sys::esp_timer_get_time() as u64 }
    }

    pub struct HcSr04<'d> {
        trig: PinDriver<'d, AnyOutputPin, Output>,
        echo: PinDriver<'d, AnyInputPin, Input>,
    }

    impl<'d> HcSr04<'d> {
        pub fn new(
            mut trig: PinDriver<'d, AnyOutputPin, Output>,
            echo: PinDriver<'d, AnyInputPin, Input>,
        ) -> anyhow::Result<Self> {
            trig.set_low()?;
            log::info!("HC-SR04 on TRIG=GPIO{} ECHO=GPIO{}", trig.pin(), echo.pin());
            Ok(Self { trig, echo })
        }

        fn trigger(&mut self) -> anyhow::Result<()> {
            self.trig.set_low()?;
            Ets::delay_us(TRIG_SETTLE_US);
            self.trig.set_high()?;
            Ets::delay_us(TRIG_PULSE_US);
            self.trig.set_low()?;
            Ok(())
        }

        /// Width of the echo pulse in µs, 0 on timeout.
        fn echo_width_us(&self) -> u32 {
            let started = now_us();
            let mut phase = EchoPhase::WaitingForLow;
            loop {
                if let Some(width) =
                    poll_echo(&mut phase, self.echo.is_high(), now_us(), started, ECHO_TIMEOUT_US)
                {
                    return width;
                }
            }
        }
    }

    impl DistanceSensor for HcSr04<'_> {
        fn measure(&mut self) -> Sample {
            if let Err(e) = self.trigger() {
                log::warn!("HC-SR04 trigger failed: {}", e);
                return Sample::timeout();
            }
            let width = self.echo_width_us();
            log::debug!("Echo pulse {} us", width);

            let sample = Sample::from_echo_us(width);
            if sample.valid {
                log::info!("Distance: {:.2} cm", sample.distance_cm);
            } else {
                log::warn!("No echo within {} us, treating as no object", ECHO_TIMEOUT_US);
            }
            sample
        }
    }
}
