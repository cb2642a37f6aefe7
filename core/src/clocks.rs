// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Sources of the current time.

use time::OffsetDateTime;

/// Provider of the current time, injected wherever timestamps are generated.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now_utc(&self) -> OffsetDateTime;
}

/// Clock backed by the system's real time.
#[derive(Clone, Default)]
pub struct SystemClock {}

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Test utilities.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// A clock frozen at a given instant that only moves when told to.
    pub struct SettableClock {
        /// The instant returned by `now_utc`.
        now: Mutex<OffsetDateTime>,
    }

    impl SettableClock {
        /// Creates a new clock frozen at `now`.
        pub fn new(now: OffsetDateTime) -> Self {
            Self { now: Mutex::new(now) }
        }

        /// Moves the clock to `now`, which may be in the past.
        pub fn set(&self, now: OffsetDateTime) {
            *self.now.lock().unwrap() = now;
        }

        /// Moves the clock forward by `delta`.
        pub fn advance(&self, delta: Duration) {
            *self.now.lock().unwrap() += delta;
        }
    }

    impl Clock for SettableClock {
        fn now_utc(&self) -> OffsetDateTime {
            *self.now.lock().unwrap()
        }
    }

}
