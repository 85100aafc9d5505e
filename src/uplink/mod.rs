// Presence Reporter — Network Uplink
//
// The wake cycle only sees this trait: join the network, write one value,
// tear the radio down again.  No retries happen at this layer.

pub mod firebase;
#[cfg(target_os = "espidf")]
pub mod wifi;

pub trait Uplink {
    /// Bounded association attempt.
    fn connect(&mut self) -> anyhow::Result<()>;

    /// Single write of `value` at `path` in the remote store.
    fn upload_value(&mut self, path: &str, value: f32) -> anyhow::Result<()>;

    /// Best-effort teardown; always called before sleeping.
    fn disconnect(&mut self);
}
