// Presence Reporter — Low-Power Scheduling & Retained State
//
// Deep sleep on the ESP32-C3 wipes RAM and restarts `main`.  The presence
// state is parked in RTC slow memory so a detection can span several wake
// cycles; it is only trusted after a timer wake.

use std::thread;
use std::time::Duration;

use crate::presence::PresenceState;

pub trait LowPowerScheduler {
    /// Suspend for `duration`.  Deep-sleep implementations never return.
    fn sleep_for(&mut self, duration: Duration);
}

/// Bench mode: block the thread and come back to the caller.
#[derive(Debug, Default)]
pub struct StayAwake;

impl LowPowerScheduler for StayAwake {
    fn sleep_for(&mut self, duration: Duration) {
        log::info!("Staying awake, next cycle in {} ms", duration.as_millis());
        thread::sleep(duration);
    }
}

/// Run the wake's setup and work.  If it fails, nothing else would arm the
/// wake timer, so log it and hand over to `scheduler` to retry next wake.
pub fn run_or_retry<S, F>(scheduler: &mut S, retry_after: Duration, work: F)
where
    S: LowPowerScheduler + ?Sized,
    F: FnOnce() -> anyhow::Result<()>,
{
    if let Err(e) = work() {
        log::error!("Wake failed: {:#}, retrying in {} s", e, retry_after.as_secs());
        scheduler.sleep_for(retry_after);
    }
}

// ---------------------------------------------------------------------------
// Wake cause
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    /// Woken by our own deep-sleep timer; RTC memory is intact.
    TimerWake,
    /// Power-on or reset.
    ColdBoot,
    Other,
}

// ---------------------------------------------------------------------------
// Retained presence record
// ---------------------------------------------------------------------------
const RETAINED_MAGIC: u32 = 0x5052_4553; // "PRES"

const TAG_IDLE: u32 = 0;
const TAG_DETECTING: u32 = 1;
const TAG_SUSTAINED: u32 = 2;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetainedPresence {
    magic: u32,
    tag: u32,
    since_ms: u64,
    pub wake_count: u32,
}

impl RetainedPresence {
    pub const EMPTY: Self = Self {
        magic: 0,
        tag: TAG_IDLE,
        since_ms: 0,
        wake_count: 0,
    };

    pub fn encode(state: PresenceState, wake_count: u32) -> Self {
        let (tag, since_ms) = match state {
            PresenceState::Idle => (TAG_IDLE, 0),
            PresenceState::Detecting { since_ms } => (TAG_DETECTING, since_ms),
            PresenceState::Sustained { since_ms } => (TAG_SUSTAINED, since_ms),
        };
        Self {
            magic: RETAINED_MAGIC,
            tag,
            since_ms,
            wake_count,
        }
    }

    /// Anything unrecognised decodes as `Idle`.
    pub fn decode(&self) -> PresenceState {
        if self.magic != RETAINED_MAGIC {
            return PresenceState::Idle;
        }
        match self.tag {
            TAG_DETECTING => PresenceState::Detecting {
                since_ms: self.since_ms,
            },
            TAG_SUSTAINED => PresenceState::Sustained {
                since_ms: self.since_ms,
            },
            _ => PresenceState::Idle,
        }
    }

    /// The state to resume with after waking for `cause`.
    pub fn resume(&self, cause: WakeCause) -> PresenceState {
        match cause {
            WakeCause::TimerWake => self.decode(),
            WakeCause::ColdBoot | WakeCause::Other => PresenceState::Idle,
        }
    }

    pub fn is_initialised(&self) -> bool {
        self.magic == RETAINED_MAGIC
    }
}

#[cfg(target_os = "espidf")]
pub use self::esp::{load_retained, store_retained, wake_cause, DeepSleep};

#[cfg(target_os = "espidf")]
mod esp {
    use core::ptr::{addr_of, addr_of_mut};
    use std::time::Duration;

    use super::{LowPowerScheduler, RetainedPresence, WakeCause};

    // Lives in RTC slow memory: initialised on power-on, untouched by deep sleep.
    #[link_section = ".rtc.data"]
    static mut RETAINED: RetainedPresence = RetainedPresence::EMPTY;

    pub fn load_retained() -> RetainedPresence {
        // SAFETY: single-threaded firmware; nothing else touches RETAINED.
        unsafe { addr_of!(RETAINED).read_volatile() }
    }

    pub fn store_retained(value: RetainedPresence) {
        // SAFETY: see `load_retained`.
        unsafe { addr_of_mut!(RETAINED).write_volatile(value) }
    }

    pub fn wake_cause() -> WakeCause {
        let cause = unsafe { esp_idf_sys::esp_sleep_get_wakeup_cause() };
        #[allow(non_upper_case_globals)]
        match cause {
            esp_idf_sys::esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER => WakeCause::TimerWake,
            esp_idf_sys::esp_sleep_source_t_ESP_SLEEP_WAKEUP_UNDEFINED => WakeCause::ColdBoot,
            _ => WakeCause::Other,
        }
    }

    /// Timer-woken deep sleep.  Execution restarts at `main`.
    #[derive(Debug, Default)]
    pub struct DeepSleep;

    impl DeepSleep {
        fn enter(duration: Duration) -> ! {
            log::info!("Entering deep sleep for {} s…", duration.as_secs());
            unsafe {
                esp_idf_sys::esp_sleep_enable_timer_wakeup(duration.as_micros() as u64);
                esp_idf_sys::esp_deep_sleep_start();
            }
        }
    }

    impl LowPowerScheduler for DeepSleep {
        fn sleep_for(&mut self, duration: Duration) {
            Self::enter(duration)
        }
    }
}
