//! Flood protection for the mail handler.
//!
//! [`FloodController`] counts the messages a handler sends per local calendar
//! day. Once the configured flood level is reached it lets one final notice
//! through and suppresses everything else until the day rolls over.

use chrono::{DateTime, Local};

/// What the handler should do with a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Send the record as a normal message.
    Send,
    /// Drop the record silently.
    Suppress,
    /// Send the one-off notice that flood protection has engaged.
    SendFinalNotice,
}

/// Counters for the current window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FloodState {
    /// Messages sent since `window_start`, the final notice included.
    pub sent_count: u64,
    /// Timestamp of the first decision in the current window.
    pub window_start: DateTime<Local>,
    /// Whether the final notice has gone out in this window.
    pub final_notice_sent: bool,
}

impl FloodState {
    fn starting_at(timestamp: DateTime<Local>) -> Self {
        Self {
            sent_count: 0,
            window_start: timestamp,
            final_notice_sent: false,
        }
    }
}

/// Per-handler flood state machine.
///
/// Not synchronised; the handler keeps it behind a mutex so that deciding and
/// updating the counters happen atomically.
#[derive(Debug)]
pub struct FloodController {
    flood_level: Option<u32>,
    state: Option<FloodState>,
}

impl FloodController {
    /// Allow `flood_level` messages per day; `None` means unlimited.
    pub fn new(flood_level: Option<u32>) -> Self {
        Self {
            flood_level,
            state: None,
        }
    }

    pub fn flood_level(&self) -> Option<u32> {
        self.flood_level
    }

    /// Counters for the current window, if any decision has been made.
    pub fn state(&self) -> Option<&FloodState> {
        self.state.as_ref()
    }

    /// Decide what to do with a record created at `timestamp`.
    pub fn decide(&mut self, timestamp: DateTime<Local>) -> Verdict {
        let same_window = self
            .state
            .as_ref()
            .is_some_and(|state| state.window_start.date_naive() == timestamp.date_naive());
        if !same_window {
            self.state = Some(FloodState::starting_at(timestamp));
        }
        let state = self
            .state
            .get_or_insert_with(|| FloodState::starting_at(timestamp));

        let Some(limit) = self.flood_level.map(u64::from) else {
            state.sent_count = state.sent_count.saturating_add(1);
            return Verdict::Send;
        };

        if state.sent_count < limit {
            state.sent_count += 1;
            Verdict::Send
        } else if state.sent_count == limit && !state.final_notice_sent {
            state.final_notice_sent = true;
            state.sent_count += 1;
            Verdict::SendFinalNotice
        } else {
            Verdict::Suppress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn at(day: u32, hour: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2007, 3, day, hour, 0, 0)
            .earliest()
            .expect("valid local time")
    }

    fn run(controller: &mut FloodController, count: usize, when: DateTime<Local>) -> Vec<Verdict> {
        (0..count).map(|_| controller.decide(when)).collect()
    }

    #[test]
    fn unlimited_always_sends() {
        let mut controller = FloodController::new(None);
        let verdicts = run(&mut controller, 50, at(15, 9));
        assert!(verdicts.iter().all(|v| *v == Verdict::Send));
        assert_eq!(controller.state().map(|s| s.sent_count), Some(50));
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(10)]
    fn limit_then_final_notice_then_silence(#[case] limit: u32) {
        let mut controller = FloodController::new(Some(limit));
        let verdicts = run(&mut controller, limit as usize + 3, at(15, 9));

        let limit = limit as usize;
        assert!(verdicts[..limit].iter().all(|v| *v == Verdict::Send));
        assert_eq!(verdicts[limit], Verdict::SendFinalNotice);
        assert!(verdicts[limit + 1..].iter().all(|v| *v == Verdict::Suppress));
    }

    #[test]
    fn zero_flood_level_sends_only_the_notice() {
        let mut controller = FloodController::new(Some(0));
        assert_eq!(
            run(&mut controller, 3, at(15, 9)),
            vec![Verdict::SendFinalNotice, Verdict::Suppress, Verdict::Suppress]
        );
    }

    #[test]
    fn midnight_resets_the_window() {
        let mut controller = FloodController::new(Some(1));
        assert_eq!(controller.decide(at(15, 23)), Verdict::Send);
        assert_eq!(controller.decide(at(15, 23)), Verdict::SendFinalNotice);
        assert_eq!(controller.decide(at(15, 23)), Verdict::Suppress);

        let next_day = at(15, 23) + Duration::hours(2);
        assert_eq!(controller.decide(next_day), Verdict::Send);
        let state = controller.state().expect("state initialised");
        assert_eq!(state.sent_count, 1);
        assert!(!state.final_notice_sent);
        assert_eq!(state.window_start, next_day);
    }

    #[test]
    fn window_is_a_calendar_day_not_24_hours() {
        let mut controller = FloodController::new(Some(1));
        controller.decide(at(15, 0));
        controller.decide(at(15, 0));
        // 23 hours later is still the same day.
        assert_eq!(controller.decide(at(15, 23)), Verdict::Suppress);
    }
}
