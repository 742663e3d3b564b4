//! Core model of the simulated analog clock.
//!
//! - **Counters** ([`counter`]): fixed-modulus cyclic counter
//! - **Clock** ([`clock`]): hour/minute/second counters, tick cascade, hand angles, alarm
//! - **Time** ([`time`]): injected wall-clock source
//!
//! The core is synchronous and holds no external resources.
//!
//! # Example
//!
//! ```
//! use clock_core::{ClockState, FixedWallClock, WallClock, WallTime};
//!
//! let wall = FixedWallClock(WallTime::new(14, 30, 0).unwrap());
//!
//! let mut clock = ClockState::new();
//! clock.set_current_time(wall.now());
//! clock.set_alarm(14, 30).unwrap();
//! clock.tick();
//!
//! let snapshot = clock.snapshot(wall.now());
//! assert_eq!(snapshot.current_hour, 2);
//! assert_eq!(snapshot.current_second, 1);
//! assert!(snapshot.alarm_active);
//! ```

pub mod clock;
pub mod counter;
pub mod time;

// Re-export main types for convenience
pub use clock::{AlarmTime, ClockState, HandAngles};
pub use counter::CyclicCounter;
pub use time::{FixedWallClock, SystemWallClock, WallClock, WallTime};
