//! Tests for the mail handler façade.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{Duration, Local, TimeZone};
use rstest::{fixture, rstest};

use super::*;
use crate::formatter::{SharedFormatter, TemplateFormatter};
use crate::handler::{FemtoHandlerTrait, HandlerError};
use crate::level::FemtoLevel;
use crate::log_record::FemtoLogRecord;
use crate::template::Template;
use crate::test_utils::{CollectingReporter, RecordingTransport};

fn message_config() -> MessageConfig {
    MessageConfig {
        from: "from@example.com".into(),
        to: vec!["to@example.com".into()],
        subject: Template::parse(DEFAULT_SUBJECT),
        template: Template::parse(DEFAULT_TEMPLATE),
        charset: Charset::utf8(),
        content_subtype: "plain".into(),
        headers: Vec::new(),
        formatter: SharedFormatter::new(TemplateFormatter::message_only()),
    }
}

fn handler_config(flood_level: Option<u32>) -> MailHandlerConfig {
    MailHandlerConfig {
        message: message_config(),
        flood_level,
        level: FemtoLevel::Trace,
        send_empty_entries: false,
    }
}

struct Harness {
    handler: FemtoMailHandler,
    transport: RecordingTransport,
    reporter: CollectingReporter,
}

fn harness(config: MailHandlerConfig) -> Harness {
    let transport = RecordingTransport::new();
    let reporter = CollectingReporter::new();
    let handler = FemtoMailHandler::with_config(config, Arc::new(transport.clone()))
        .with_reporter(Arc::new(reporter.clone()));
    Harness {
        handler,
        transport,
        reporter,
    }
}

#[fixture]
fn default_harness() -> Harness {
    harness(handler_config(Some(DEFAULT_FLOOD_LEVEL)))
}

fn at(day: u32, hour: u32, minute: u32) -> SystemTime {
    let local = Local
        .with_ymd_and_hms(2007, 1, day, hour, minute, 0)
        .earliest()
        .expect("valid local time");
    SystemTime::from(local)
}

fn record_at(message: &str, when: SystemTime) -> FemtoLogRecord {
    FemtoLogRecord::new("root", FemtoLevel::Critical, message).with_timestamp(when)
}

fn critical(message: &str) -> FemtoLogRecord {
    FemtoLogRecord::new("root", FemtoLevel::Critical, message)
}

#[rstest]
fn unlimited_sends_every_record() {
    let h = harness(handler_config(None));
    for i in 0..25 {
        h.handler.emit(&critical(&format!("message {i}")));
    }
    assert_eq!(h.transport.count(), 25);
}

#[rstest]
fn default_flood_level_sends_eleven_of_twelve(default_harness: Harness) {
    let h = default_harness;
    for i in 0..12 {
        h.handler.emit(&critical(&format!("message {i}")));
    }
    let sent = h.transport.sent();
    assert_eq!(sent.len(), 11);
    assert_eq!(sent[9].header("Subject").as_deref(), Some("message 9"));
    assert_eq!(
        sent[10].header("Subject").as_deref(),
        Some(FLOOD_SUBJECT)
    );
    assert!(sent[10].body().contains("More than 10 entries"));
    assert_eq!(sent[10].header("X-Log-Level").as_deref(), Some("CRITICAL"));
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(4)]
fn limit_plus_two_gives_limit_plus_one(#[case] limit: u32) {
    let h = harness(handler_config(Some(limit)));
    for _ in 0..limit + 2 {
        h.handler.emit(&critical("boom"));
    }
    assert_eq!(h.transport.count(), limit as usize + 1);
}

#[test]
fn nothing_sent_after_final_notice_on_same_day() {
    let h = harness(handler_config(Some(2)));
    for _ in 0..3 {
        h.handler.emit(&record_at("early", at(15, 9, 0)));
    }
    assert_eq!(h.transport.count(), 3);
    for minute in 0..30 {
        h.handler.emit(&record_at("late", at(15, 22, minute)));
    }
    assert_eq!(h.transport.count(), 3);
    let state = h.handler.flood_state().expect("state initialised");
    assert!(state.final_notice_sent);
    assert_eq!(state.sent_count, 3);
}

#[test]
fn flood_level_one_resets_after_midnight() {
    let h = harness(handler_config(Some(1)));
    let evening = at(15, 23, 0);

    h.handler.emit(&record_at("first", evening));
    assert_eq!(h.transport.count(), 1);
    h.handler.emit(&record_at("second", evening));
    assert_eq!(h.transport.count(), 2);
    h.handler.emit(&record_at("third", evening));
    assert_eq!(h.transport.count(), 2);

    let after_midnight = SystemTime::from(
        chrono::DateTime::<Local>::from(evening) + Duration::hours(2),
    );
    h.handler.emit(&record_at("next day", after_midnight));
    let sent = h.transport.sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[2].header("Subject").as_deref(), Some("next day"));
}

#[test]
fn custom_headers_are_appended_after_generated_ones() {
    let mut config = handler_config(None);
    config.message.headers = vec![
        ("From".into(), "someone@example.com".into()),
        ("to".into(), "other@example.com".into()),
    ];
    let h = harness(config);
    h.handler.emit(&critical("hello"));

    let sent = h.transport.sent();
    let text = sent[0].text();
    let lines: Vec<&str> = text.split("\r\n").collect();
    let from_lines: Vec<&&str> = lines.iter().filter(|l| l.starts_with("From:")).collect();
    assert_eq!(
        from_lines,
        vec![&"From: from@example.com", &"From: someone@example.com"]
    );
    assert!(lines.contains(&"To: to@example.com"));
    assert!(lines.contains(&"to: other@example.com"));
    let generated = lines.iter().position(|l| l.starts_with("Message-ID:"));
    let custom = lines.iter().position(|l| *l == "From: someone@example.com");
    assert!(generated < custom);
}

#[test]
fn asctime_subject_uses_record_time() {
    let mut config = handler_config(None);
    config.message.subject = Template::parse("{asctime}");
    let h = harness(config);
    let when = SystemTime::from(
        Local
            .with_ymd_and_hms(2007, 1, 1, 10, 0, 0)
            .earliest()
            .expect("valid local time"),
    );
    h.handler.emit(&record_at("timed", when));
    assert_eq!(
        h.transport.sent()[0].header("Subject").as_deref(),
        Some("2007-01-01 10:00:00,000")
    );
}

struct Unprintable;

impl fmt::Display for Unprintable {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Err(fmt::Error)
    }
}

#[test]
fn non_string_messages_send_one_mail() {
    let h = harness(handler_config(None));
    h.handler
        .emit(&FemtoLogRecord::from_display("root", FemtoLevel::Error, 42_u64));
    h.handler
        .emit(&FemtoLogRecord::from_display("root", FemtoLevel::Error, Unprintable));

    let sent = h.transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].header("Subject").as_deref(), Some("42"));
    let subject = sent[1].header("Subject").unwrap_or_default();
    assert!(subject.starts_with("<unprintable "), "{subject}");
    assert!(h.reporter.is_empty());
}

#[test]
fn utf8_subject_and_body_are_encoded() {
    let h = harness(handler_config(None));
    h.handler.emit(&critical("accentu\u{e9}"));

    let mail = &h.transport.sent()[0];
    assert_eq!(
        mail.header("Subject").as_deref(),
        Some("=?utf-8?b?YWNjZW50dcOp?=")
    );
    assert_eq!(
        mail.header("Content-Type").as_deref(),
        Some("text/plain; charset=\"utf-8\"")
    );
    assert_eq!(
        mail.header("Content-Transfer-Encoding").as_deref(),
        Some("base64")
    );
    assert_eq!(mail.body().trim_end(), "YWNjZW50dcOp");
}

#[test]
fn latin1_body_is_quoted_printable_with_utf8_subject() {
    let mut config = handler_config(None);
    config.message.charset = Charset::for_label("iso-8859-1").expect("known charset");
    let h = harness(config);
    h.handler.emit(&critical("accentu\u{e9}"));

    let mail = &h.transport.sent()[0];
    assert_eq!(
        mail.header("Content-Type").as_deref(),
        Some("text/plain; charset=\"iso-8859-1\"")
    );
    assert_eq!(
        mail.header("Content-Transfer-Encoding").as_deref(),
        Some("quoted-printable")
    );
    assert_eq!(mail.body(), "accentu=E9");
    assert_eq!(
        mail.header("Subject").as_deref(),
        Some("=?utf-8?b?YWNjZW50dcOp?=")
    );
}

#[test]
fn content_subtype_is_used_under_text() {
    let mut config = handler_config(None);
    config.message.content_subtype = "bar".into();
    let h = harness(config);
    h.handler.emit(&critical("x"));
    let content_type = h.transport.sent()[0]
        .header("Content-Type")
        .unwrap_or_default();
    assert!(content_type.starts_with("text/bar;"), "{content_type}");
}

#[test]
fn template_wraps_body_but_not_subject() {
    let mut config = handler_config(None);
    config.message.template = Template::parse("<before>{message}<after>");
    let h = harness(config);
    h.handler.emit(&critical("test"));

    let mail = &h.transport.sent()[0];
    assert_eq!(mail.header("Subject").as_deref(), Some("test"));
    assert_eq!(mail.body(), "<before>test<after>");
}

#[test]
fn subject_is_first_line_of_multiline_message() {
    let h = harness(handler_config(None));
    h.handler.emit(&critical("first line\nsecond line"));
    let mail = &h.transport.sent()[0];
    assert_eq!(mail.header("Subject").as_deref(), Some("first line"));
    assert_eq!(mail.body(), "first line\r\nsecond line");
}

#[test]
fn transport_failure_is_reported_not_raised() {
    let h = harness(handler_config(None));
    h.transport.set_failing(true);
    h.handler.emit(&critical("lost"));
    assert_eq!(
        h.handler.handle(critical("also lost")).ok(),
        Some(()),
        "handle must not surface delivery failures"
    );

    let reports = h.reporter.reports();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].0, "FemtoMailHandler");
    assert!(reports[0].1.contains("mail delivery failed"), "{:?}", reports[0]);

    h.transport.set_failing(false);
    h.handler.emit(&critical("delivered"));
    assert_eq!(h.transport.count(), 1);
}

#[test]
fn failed_sends_still_count_towards_flood_level() {
    let h = harness(handler_config(Some(1)));
    h.transport.set_failing(true);
    h.handler.emit(&critical("one"));
    h.transport.set_failing(false);
    h.handler.emit(&critical("two"));
    h.handler.emit(&critical("three"));

    let sent = h.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].header("Subject").as_deref(), Some(FLOOD_SUBJECT));
}

#[test]
fn records_below_level_are_ignored_and_not_counted() {
    let mut config = handler_config(Some(1));
    config.level = FemtoLevel::Error;
    let h = harness(config);
    for _ in 0..5 {
        h.handler
            .emit(&FemtoLogRecord::new("root", FemtoLevel::Info, "chatter"));
    }
    assert_eq!(h.transport.count(), 0);
    assert!(h.handler.flood_state().is_none());
    h.handler.emit(&critical("real problem"));
    assert_eq!(h.transport.count(), 1);
}

#[rstest]
#[case(false, 0)]
#[case(true, 1)]
fn blank_messages_follow_send_empty_entries(#[case] send_empty: bool, #[case] expected: usize) {
    let mut config = handler_config(None);
    config.send_empty_entries = send_empty;
    let h = harness(config);
    h.handler.emit(&critical("  \n "));
    assert_eq!(h.transport.count(), expected);
}

#[test]
fn envelope_matches_configuration() {
    let mut config = handler_config(None);
    config.message.to = vec!["a@example.com".into(), "b@example.com".into()];
    let h = harness(config);
    h.handler.emit(&critical("hello"));

    let mail = &h.transport.sent()[0];
    assert_eq!(mail.from, "from@example.com");
    assert_eq!(mail.to, vec!["a@example.com", "b@example.com"]);
    assert_eq!(
        mail.header("To").as_deref(),
        Some("a@example.com, b@example.com")
    );
    assert_eq!(mail.header("MIME-Version").as_deref(), Some("1.0"));
    assert!(mail.header("Date").is_some());
}

#[test]
fn closed_handler_rejects_records() {
    let h = harness(handler_config(None));
    h.handler.close();
    assert!(matches!(
        h.handler.handle(critical("late")),
        Err(HandlerError::Closed)
    ));
    assert_eq!(h.transport.count(), 0);
}

#[test]
fn header_values_keep_case_and_order() {
    let mut config = message_config();
    config.headers = vec![("X-Tag".into(), "one".into()), ("X-Tag".into(), "two\r\nthree".into())];
    let builder = MessageBuilder::new(config);
    let message = builder.build(&critical("hi"), MessageKind::Normal);
    let values: Vec<&str> = message.header_values("X-Tag").collect();
    assert_eq!(values, vec!["one", "two  three"]);
    assert_eq!(message.header_values("x-tag").count(), 0);
    assert_eq!(message.subject(), "hi");
}

#[rstest]
#[case::beyond_calendar(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1 << 60))]
#[case::five_digit_year(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(600_000_000_000))]
#[case::before_epoch(SystemTime::UNIX_EPOCH - std::time::Duration::from_millis(1_500))]
fn unusual_timestamps_still_send(#[case] when: SystemTime) {
    let mut config = handler_config(Some(1));
    config.message.subject = Template::parse("{asctime} {line}");
    let h = harness(config);

    h.handler.emit(&record_at("odd clock", when));

    let sent = h.transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].header("Date").is_some());
    assert!(
        sent[0]
            .header("Subject")
            .is_some_and(|subject| subject.ends_with(" odd clock"))
    );
    assert!(h.handler.flood_state().is_some());
    assert!(h.reporter.is_empty());
}

#[test]
fn empty_subject_is_not_encoded() {
    let mut config = handler_config(None);
    config.message.subject = Template::parse("");
    let h = harness(config);
    h.handler.emit(&critical("accentu\u{e9}"));

    let mail = &h.transport.sent()[0];
    assert_eq!(mail.header("Subject").as_deref(), Some(""));
    assert!(!mail.text().contains("=?utf-8?b??="));
}
