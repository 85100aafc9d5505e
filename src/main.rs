// Presence Reporter — Firmware Entry Point
//
// Every wake (deep sleep restarts `main`):
//   1. Work out why we woke and pull the presence state out of RTC memory.
//   2. Load settings/credentials (NVS overrides on top of built-in defaults).
//   3. Run one wake cycle: measure, debounce, maybe upload.
//   4. Park the new presence state in RTC memory.
//   5. Deep sleep for the configured duration (or, in stay-awake mode, wait
//      one sample interval and loop).
//
// If any setup step fails the wake still ends in a timed deep sleep, so the
// next wake tries again from scratch.

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use std::time::Duration;

    use presence_reporter::config::DEEP_SLEEP_DURATION_S;
    use presence_reporter::power::{self, DeepSleep};

    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    power::run_or_retry(
        &mut DeepSleep,
        Duration::from_secs(DEEP_SLEEP_DURATION_S),
        run,
    );
    Ok(())
}

/// Set up the collaborators and cycle forever.  Only returns on a setup error.
#[cfg(target_os = "espidf")]
fn run() -> anyhow::Result<()> {
    use esp_idf_hal::gpio::{InputPin, OutputPin, PinDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::EspWifi;

    use presence_reporter::drivers::ultrasonic::HcSr04;
    use presence_reporter::power::{self, DeepSleep, LowPowerScheduler, RetainedPresence, StayAwake};
    use presence_reporter::settings;
    use presence_reporter::uplink::wifi::WifiUplink;
    use presence_reporter::wait::SystemClock;
    use presence_reporter::WakeCycle;

    // ---- Wake bookkeeping -------------------------------------------------
    let cause = power::wake_cause();
    let retained = power::load_retained();
    let mut wake_count = retained.wake_count.wrapping_add(1);
    let mut state = retained.resume(cause);
    log::info!(
        "Woke up ({:?}, wake #{}, retained {}), presence {:?}. Checking sensor…",
        cause,
        wake_count,
        if retained.is_initialised() { "valid" } else { "empty" },
        state
    );

    // ---- Peripherals & configuration --------------------------------------
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let (settings, credentials) = settings::load(&nvs);
    log::info!("{:?}", settings);
    if !credentials.is_complete() {
        log::warn!("WiFi/store credentials missing, uploads will fail");
    }

    // ---- Collaborators ----------------------------------------------------
    // Wiring: TRIG = GPIO3, ECHO = GPIO2 (see config::PIN_TRIG / PIN_ECHO).
    let trig = PinDriver::output(peripherals.pins.gpio3.downgrade_output())?;
    let echo = PinDriver::input(peripherals.pins.gpio2.downgrade_input())?;
    let sensor = HcSr04::new(trig, echo)?;

    let wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs))?;
    let uplink = WifiUplink::new(wifi, credentials);

    let mut cycle = WakeCycle::new(&settings, sensor, uplink, SystemClock);
    let mut scheduler: Box<dyn LowPowerScheduler> = if settings.stay_awake {
        Box::new(StayAwake)
    } else {
        Box::new(DeepSleep)
    };

    // With deep sleep this runs exactly once per boot.
    loop {
        let report = cycle.run_cycle(state);
        state = report.state;
        power::store_retained(RetainedPresence::encode(state, wake_count));

        scheduler.sleep_for(settings.cycle_pause());
        wake_count = wake_count.wrapping_add(1);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!(
        "presence-reporter is ESP-IDF firmware; build for riscv32imc-esp-espidf \
         (host builds only carry the library and its tests)"
    );
}
