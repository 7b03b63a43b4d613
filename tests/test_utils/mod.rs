//! Fixtures shared by the integration tests.
#![allow(dead_code, reason = "each test crate uses a different subset")]

use std::sync::Arc;
use std::time::SystemTime;

use chrono::{Local, TimeZone};
use femtomail::test_utils::{CollectingReporter, RecordingTransport};
use femtomail::{FemtoLevel, FemtoLogRecord, MailHandlerBuilder};
use rstest::fixture;

/// Builder with sender, recipient and in-memory delivery already set.
pub fn builder_with(transport: &RecordingTransport, reporter: &CollectingReporter) -> MailHandlerBuilder {
    MailHandlerBuilder::new()
        .with_from("from@example.com")
        .with_to("to@example.com")
        .with_transport(Arc::new(transport.clone()))
        .with_reporter(Arc::new(reporter.clone()))
}

/// A recording transport paired with a collecting reporter.
#[fixture]
pub fn doubles() -> (RecordingTransport, CollectingReporter) {
    (RecordingTransport::new(), CollectingReporter::new())
}

/// Local wall-clock time on 2007-01-`day`.
pub fn local_time(day: u32, hour: u32, minute: u32) -> SystemTime {
    let local = Local
        .with_ymd_and_hms(2007, 1, day, hour, minute, 0)
        .earliest()
        .expect("valid local time");
    SystemTime::from(local)
}

/// A CRITICAL record from the `root` logger created at `when`.
pub fn critical_at(message: &str, when: SystemTime) -> FemtoLogRecord {
    FemtoLogRecord::new("root", FemtoLevel::Critical, message).with_timestamp(when)
}
