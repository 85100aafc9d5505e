// Host-side fakes for the hardware collaborators.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use anyhow::bail;

use crate::drivers::DistanceSensor;
use crate::events::Sample;
use crate::uplink::Uplink;
use crate::wait::Clock;

/// Manually driven clock; `sleep` advances it.  Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    now: Rc<Cell<u64>>,
}

impl FakeClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration.as_millis() as u64);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Replays distances in order, then keeps repeating the last one.
#[derive(Debug, Clone)]
pub struct ScriptedSensor {
    script: Rc<RefCell<VecDeque<f32>>>,
    last: Rc<Cell<f32>>,
    reads: Rc<Cell<usize>>,
}

impl ScriptedSensor {
    pub fn new(distances: &[f32]) -> Self {
        Self {
            script: Rc::new(RefCell::new(distances.iter().copied().collect())),
            last: Rc::new(Cell::new(0.0)),
            reads: Rc::new(Cell::new(0)),
        }
    }

    pub fn push(&self, distance_cm: f32) {
        self.script.borrow_mut().push_back(distance_cm);
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl DistanceSensor for ScriptedSensor {
    fn measure(&mut self) -> Sample {
        if let Some(next) = self.script.borrow_mut().pop_front() {
            self.last.set(next);
        }
        self.reads.set(self.reads.get() + 1);
        Sample::from_cm(self.last.get())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UplinkCall {
    Connect,
    Upload(String, f32),
    Disconnect,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingUplink {
    calls: Rc<RefCell<Vec<UplinkCall>>>,
    fail_connect: bool,
    fail_upload: bool,
}

impl RecordingUplink {
    pub fn failing_connect() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    pub fn failing_upload() -> Self {
        Self {
            fail_upload: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<UplinkCall> {
        self.calls.borrow().clone()
    }

    pub fn uploads(&self) -> Vec<f32> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                UplinkCall::Upload(_, v) => Some(*v),
                _ => None,
            })
            .collect()
    }
}

impl Uplink for RecordingUplink {
    fn connect(&mut self) -> anyhow::Result<()> {
        self.calls.borrow_mut().push(UplinkCall::Connect);
        if self.fail_connect {
            bail!("association timed out");
        }
        Ok(())
    }

    fn upload_value(&mut self, path: &str, value: f32) -> anyhow::Result<()> {
        self.calls
            .borrow_mut()
            .push(UplinkCall::Upload(path.to_owned(), value));
        if self.fail_upload {
            bail!("HTTP 500");
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        self.calls.borrow_mut().push(UplinkCall::Disconnect);
    }
}
