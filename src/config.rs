// Presence Reporter — Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V)
//
// Compile-time defaults.  Everything under "Logic" can be overridden at
// runtime through NVS (see `settings`).

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C3 pinout)
// Documentation only: the pins are taken as typed peripherals in `main`
// (`pins.gpio3` / `pins.gpio2`); change both together.  The driver logs the
// pins it was actually given.
// ---------------------------------------------------------------------------
pub const PIN_TRIG: i32 = 3; // D1 — HC-SR04 trigger (OUTPUT)
pub const PIN_ECHO: i32 = 2; // D0 — HC-SR04 echo (INPUT)

// ---------------------------------------------------------------------------
// Ultrasonic Ranging (HC-SR04)
// ---------------------------------------------------------------------------
pub const TRIG_SETTLE_US: u32 = 2;
pub const TRIG_PULSE_US: u32 = 10;
pub const ECHO_TIMEOUT_US: u32 = 30_000; // ~5 m round trip
pub const SPEED_OF_SOUND_CM_PER_US: f32 = 0.0343;

// ---------------------------------------------------------------------------
// Logic
// ---------------------------------------------------------------------------
pub const MOVEMENT_THRESHOLD_CM: f32 = 50.0; // closer than this = "object detected"
pub const MEASURE_INTERVAL_MS: u64 = 5000; // cadence when staying awake
pub const DEEP_SLEEP_DURATION_S: u64 = 5; // one wake cycle
pub const SUSTAINED_THRESHOLD_MS: u64 = 15_000;
pub const CONTINUOUS_DETECTION_MS: u64 = 0; // 0 = no confirmation window
pub const CONFIRM_POLL_INTERVAL_MS: u64 = 500;

// ---------------------------------------------------------------------------
// Network / Remote Store
// ---------------------------------------------------------------------------
pub const WIFI_CONNECT_TIMEOUT_MS: u64 = 5000;
pub const WIFI_POLL_INTERVAL_MS: u64 = 500;
pub const HTTP_TIMEOUT_MS: u64 = 10_000;
pub const UPLOAD_PATH: &str = "/sensor/distance";

// ---------------------------------------------------------------------------
// Credentials (injected at build time, never committed)
// ---------------------------------------------------------------------------
pub const WIFI_SSID: &str = match option_env!("WIFI_SSID") {
    Some(v) => v,
    None => "",
};
pub const WIFI_PASSWORD: &str = match option_env!("WIFI_PASSWORD") {
    Some(v) => v,
    None => "",
};
pub const STORE_URL: &str = match option_env!("STORE_URL") {
    Some(v) => v,
    None => "",
};
pub const STORE_AUTH_TOKEN: &str = match option_env!("STORE_AUTH_TOKEN") {
    Some(v) => v,
    None => "",
};

// ---------------------------------------------------------------------------
// NVS
// ---------------------------------------------------------------------------
pub const NVS_NAMESPACE: &str = "presence";
