//! The once-per-interval tick loop.
//!
//! The loop owns the [`ClockState`] exclusively. Each step drains pending
//! commands, advances the clock one second, and hands a whole snapshot to
//! every publisher, so readers never observe a half-applied cascade.

use crate::gateway::{MailboxDir, SnapshotPublisher};
use crate::signals::SignalHandler;
use clock_common::config::StartMode;
use clock_common::mailbox::CommandMailbox;
use clock_common::snapshot::{ClockSnapshot, Command};
use clock_core::{ClockState, WallClock, WallTime};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Ticks between periodic status logs.
const STATUS_INTERVAL: u64 = 3600;

/// Drives a [`ClockState`] from a timer and publishes its snapshots.
pub struct TickLoop<W: WallClock> {
    clock: ClockState,
    wall: W,
    mailbox: Arc<CommandMailbox>,
    mailbox_dir: Option<MailboxDir>,
    publishers: Vec<Box<dyn SnapshotPublisher>>,
    tick_count: u64,
    alarm_ringing: bool,
}

impl<W: WallClock> TickLoop<W> {
    /// Create a loop reading commands from `mailbox`.
    pub fn new(start_mode: StartMode, wall: W, mailbox: Arc<CommandMailbox>) -> Self {
        let mut clock = ClockState::new();
        if start_mode == StartMode::WallClock {
            let now = wall.now();
            clock.set_current_time(now);
            info!(%now, "Clock synchronized with wall clock");
        }

        Self {
            clock,
            wall,
            mailbox,
            mailbox_dir: None,
            publishers: Vec::new(),
            tick_count: 0,
            alarm_ringing: false,
        }
    }

    /// Add a snapshot publisher.
    #[must_use]
    pub fn with_publisher(mut self, publisher: impl SnapshotPublisher + 'static) -> Self {
        info!(publisher = publisher.name(), "Publisher registered");
        self.publishers.push(Box::new(publisher));
        self
    }

    /// Also poll a directory of command files before each tick.
    #[must_use]
    pub fn with_mailbox_dir(mut self, dir: MailboxDir) -> Self {
        self.mailbox_dir = Some(dir);
        self
    }

    /// Current clock state.
    pub fn clock(&self) -> &ClockState {
        &self.clock
    }

    /// Ticks completed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Publish the current state without ticking.
    pub fn publish_initial(&mut self) -> ClockSnapshot {
        let snapshot = self.clock.snapshot(self.wall.now());
        info!(
            hour_angle = snapshot.hour_angle,
            minute_angle = snapshot.minute_angle,
            second_angle = snapshot.second_angle,
            "Initial hand angles"
        );
        self.publish(&snapshot);
        snapshot
    }

    /// Run one iteration: apply pending commands, tick, publish.
    pub fn step(&mut self) -> ClockSnapshot {
        if let Some(dir) = &self.mailbox_dir {
            for command in dir.poll() {
                self.mailbox.post(command);
            }
        }

        let now = self.wall.now();
        for command in self.mailbox.take_pending() {
            self.apply(&command, now);
        }

        self.clock.tick();
        self.tick_count += 1;

        let snapshot = self.clock.snapshot(now);
        if snapshot.alarm_active && !self.alarm_ringing {
            info!(%now, "Alarm ringing");
        }
        self.alarm_ringing = snapshot.alarm_active;

        self.publish(&snapshot);
        for publisher in &self.publishers {
            publisher.record_tick();
        }
        snapshot
    }

    fn apply(&mut self, command: &Command, now: WallTime) {
        let kind = command.kind();
        let applied = match self.clock.apply_command(command, now) {
            Ok(()) => {
                match command {
                    Command::SetAlarm { hour, minute } => {
                        info!(hour, minute, "Alarm configured");
                    }
                    Command::SetTime { .. } => {
                        let (hour, minute, second) = self.clock.time();
                        info!(hour, minute, second, "Time adjusted");
                    }
                    Command::Resync => info!(%now, "Time resynchronized"),
                    Command::ClearAlarm => info!("Alarm cleared"),
                }
                true
            }
            Err(e) => {
                warn!(%command, error = %e, "Command rejected");
                false
            }
        };
        for publisher in &self.publishers {
            publisher.record_command(kind, applied);
        }
    }

    fn publish(&mut self, snapshot: &ClockSnapshot) {
        for publisher in &mut self.publishers {
            if let Err(e) = publisher.publish(snapshot) {
                warn!(publisher = publisher.name(), error = %e, "Failed to publish snapshot");
            }
        }
    }

    /// Tick every `interval` until shutdown or `max_ticks` (0 = unlimited).
    ///
    /// SIGHUP queues a resync for the next tick.
    pub async fn run(&mut self, interval: Duration, signals: &SignalHandler, max_ticks: u64) {
        self.publish_initial();

        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        timer.tick().await;

        info!(?interval, "Entering tick loop");
        loop {
            if signals.shutdown_requested() {
                break;
            }

            tokio::select! {
                _ = timer.tick() => {}
                () = signals.wait_for_shutdown() => {
                    debug!("Shutdown requested while waiting for tick");
                    break;
                }
            }

            if signals.take_resync_request() {
                self.mailbox.post(Command::Resync);
            }

            self.step();

            if max_ticks > 0 && self.tick_count >= max_ticks {
                info!(ticks = self.tick_count, "Maximum tick count reached");
                signals.request_shutdown();
                break;
            }

            if self.tick_count % STATUS_INTERVAL == 0 {
                let (hour, minute, second) = self.clock.time();
                info!(
                    ticks = self.tick_count,
                    hour,
                    minute,
                    second,
                    alarm_armed = self.clock.is_alarm_active(),
                    "Periodic status"
                );
            }
        }

        info!(ticks = self.tick_count, "Tick loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clock_common::error::ClockResult;
    use clock_common::snapshot::CommandKind;
    use clock_core::FixedWallClock;
    use std::sync::Mutex;

    #[derive(Default, Clone)]
    struct Recorder {
        snapshots: Arc<Mutex<Vec<ClockSnapshot>>>,
        ticks: Arc<Mutex<u64>>,
        commands: Arc<Mutex<Vec<(CommandKind, bool)>>>,
    }

    impl SnapshotPublisher for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn publish(&mut self, snapshot: &ClockSnapshot) -> ClockResult<()> {
            self.snapshots.lock().unwrap().push(*snapshot);
            Ok(())
        }

        fn record_tick(&self) {
            *self.ticks.lock().unwrap() += 1;
        }

        fn record_command(&self, kind: CommandKind, applied: bool) {
            self.commands.lock().unwrap().push((kind, applied));
        }
    }

    fn wall(h: u32, m: u32, s: u32) -> FixedWallClock {
        FixedWallClock(WallTime::new(h, m, s).unwrap())
    }

    fn tick_loop(mode: StartMode) -> (TickLoop<FixedWallClock>, Arc<CommandMailbox>, Recorder) {
        let mailbox = Arc::new(CommandMailbox::new());
        let recorder = Recorder::default();
        let tl = TickLoop::new(mode, wall(15, 4, 5), Arc::clone(&mailbox))
            .with_publisher(recorder.clone());
        (tl, mailbox, recorder)
    }

    #[test]
    fn test_start_modes() {
        let (tl, _, _) = tick_loop(StartMode::WallClock);
        assert_eq!(tl.clock().time(), (3, 4, 5));

        let (tl, _, _) = tick_loop(StartMode::Midnight);
        assert_eq!(tl.clock().time(), (0, 0, 0));
    }

    #[test]
    fn test_step_ticks_and_publishes() {
        let (mut tl, _, recorder) = tick_loop(StartMode::Midnight);
        let initial = tl.publish_initial();
        assert_eq!(initial.current_second, 0);

        let snapshot = tl.step();
        assert_eq!(snapshot.current_second, 1);
        assert!((snapshot.second_angle - 6.0).abs() < 1e-9);
        assert_eq!(tl.tick_count(), 1);

        assert_eq!(*recorder.snapshots.lock().unwrap(), vec![initial, snapshot]);
        assert_eq!(*recorder.ticks.lock().unwrap(), 1);
    }

    #[test]
    fn test_commands_applied_before_tick() {
        let (mut tl, mailbox, recorder) = tick_loop(StartMode::Midnight);
        mailbox.post(Command::SetTime {
            hour: 23,
            minute: 59,
            second: 59,
        });

        let snapshot = tl.step();
        // 23 -> 11 on the dial, then the tick wraps everything
        assert_eq!(
            (
                snapshot.current_hour,
                snapshot.current_minute,
                snapshot.current_second
            ),
            (0, 0, 0)
        );
        assert_eq!(
            *recorder.commands.lock().unwrap(),
            vec![(CommandKind::SetTime, true)]
        );
        assert!(mailbox.take_pending().is_empty());
    }

    #[test]
    fn test_rejected_command_is_not_fatal() {
        let (mut tl, mailbox, recorder) = tick_loop(StartMode::Midnight);
        // Bypasses endpoint validation on purpose
        mailbox.post(Command::SetAlarm {
            hour: 30,
            minute: 0,
        });

        let snapshot = tl.step();
        assert_eq!(snapshot.current_second, 1);
        assert!(tl.clock().alarm().is_none());
        assert_eq!(
            *recorder.commands.lock().unwrap(),
            vec![(CommandKind::SetAlarm, false)]
        );
    }

    #[test]
    fn test_alarm_reported_against_wall_clock() {
        let (mut tl, mailbox, _) = tick_loop(StartMode::Midnight);
        mailbox.post(Command::SetAlarm {
            hour: 15,
            minute: 4,
        });
        assert!(tl.step().alarm_active);

        mailbox.post(Command::ClearAlarm);
        assert!(!tl.step().alarm_active);
    }

    #[test]
    fn test_resync_command() {
        let (mut tl, mailbox, _) = tick_loop(StartMode::Midnight);
        tl.step();
        mailbox.post(Command::Resync);
        let snapshot = tl.step();
        // Resynced to 15:04:05, then ticked
        assert_eq!(
            (
                snapshot.current_hour,
                snapshot.current_minute,
                snapshot.current_second
            ),
            (3, 4, 6)
        );
    }

    #[test]
    fn test_mailbox_dir_feeds_loop() {
        let dir = tempfile::tempdir().unwrap();
        let files = MailboxDir::new(dir.path());
        std::fs::write(
            files.path_for(CommandKind::SetAlarm),
            r#"{"hour": 7, "minute": 30}"#,
        )
        .unwrap();

        let (tl, _, _) = tick_loop(StartMode::Midnight);
        let mut tl = tl.with_mailbox_dir(files.clone());
        tl.step();

        assert_eq!(
            tl.clock().alarm(),
            Some(clock_core::AlarmTime {
                hour: 7,
                minute: 30
            })
        );
        assert!(!files.path_for(CommandKind::SetAlarm).exists());
    }

    #[tokio::test]
    async fn test_run_stops_at_max_ticks() {
        let (mut tl, _, recorder) = tick_loop(StartMode::Midnight);
        let signals = SignalHandler::detached();

        tokio::time::timeout(
            Duration::from_secs(5),
            tl.run(Duration::from_millis(5), &signals, 3),
        )
        .await
        .expect("loop should stop");

        assert_eq!(tl.tick_count(), 3);
        assert!(signals.shutdown_requested());
        // Initial snapshot plus one per tick
        assert_eq!(recorder.snapshots.lock().unwrap().len(), 4);
        assert_eq!(tl.clock().time(), (0, 0, 3));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (mut tl, _, _) = tick_loop(StartMode::Midnight);
        let signals = SignalHandler::detached();
        let trigger = signals.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.request_shutdown();
        });

        tokio::time::timeout(
            Duration::from_secs(5),
            tl.run(Duration::from_secs(3600), &signals, 0),
        )
        .await
        .expect("shutdown should interrupt the wait");
        assert_eq!(tl.tick_count(), 0);
    }
}
