// Time Provider Port (for testability)

use chrono::{DateTime, Utc};

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Returns a scripted sequence of timestamps, repeating the last one
    pub struct ScriptedTimeProvider {
        times: Mutex<Vec<DateTime<Utc>>>,
    }

    impl ScriptedTimeProvider {
        pub fn new(mut times: Vec<DateTime<Utc>>) -> Self {
            times.reverse();
            Self {
                times: Mutex::new(times),
            }
        }
    }

    impl TimeProvider for ScriptedTimeProvider {
        fn now(&self) -> DateTime<Utc> {
            let mut times = self.times.lock().unwrap();
            if times.len() > 1 {
                times.pop().unwrap()
            } else {
                *times.last().expect("ScriptedTimeProvider exhausted")
            }
        }
    }
}
