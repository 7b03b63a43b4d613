//! Handlers configured from INI files on disk.

mod test_utils;

use std::io::Write as _;
use std::sync::Arc;

use femtomail::test_utils::{CollectingReporter, RecordingTransport};
use femtomail::{
    ConfigurationError, FemtoLevel, FemtoLogRecord, HandlerBuilderTrait, load_ini_file,
    mail_handler_from_ini_file, summarising_handler_from_ini_file,
};
use rstest::rstest;
use tempfile::NamedTempFile;

use test_utils::{critical_at, doubles, local_time};

fn ini_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

const MAIL_SECTION: &str = "\
[mail]
from = app@example.com
to = ops@example.com, dev@example.com
subject = [{levelname}] {line}
flood_level = 2
mailhost = smtp.example.com:587
tls = starttls
timeout = 5
header.X-Environment = production
";

#[rstest]
fn mail_section_configures_the_handler(doubles: (RecordingTransport, CollectingReporter)) {
    let (transport, reporter) = doubles;
    let file = ini_file(MAIL_SECTION.as_bytes());
    let handler = mail_handler_from_ini_file(file.path(), "mail")
        .expect("section parses")
        .with_transport(Arc::new(transport.clone()))
        .with_reporter(Arc::new(reporter.clone()))
        .build_inner()
        .expect("handler builds");

    for _ in 0..5 {
        handler.emit(&critical_at("queue stalled", local_time(8, 6, 0)));
    }

    let sent = transport.sent();
    assert_eq!(sent.len(), 3, "two mails plus the final notice");
    assert_eq!(sent[0].from, "app@example.com");
    assert_eq!(sent[0].to, vec!["ops@example.com", "dev@example.com"]);
    assert_eq!(
        sent[0].header("Subject").as_deref(),
        Some("[CRITICAL] queue stalled")
    );
    assert_eq!(
        sent[0].header("X-Environment").as_deref(),
        Some("production")
    );
    assert_eq!(
        sent[2].header("Subject").as_deref(),
        Some("Too Many Log Entries")
    );
    assert!(reporter.is_empty());
}

#[test]
fn smtp_settings_build_without_connecting() {
    let file = ini_file(MAIL_SECTION.as_bytes());
    let builder = mail_handler_from_ini_file(file.path(), "mail").expect("section parses");
    assert!(builder.build().is_ok());
}

#[rstest]
fn summary_section_applies_level(doubles: (RecordingTransport, CollectingReporter)) {
    let (transport, reporter) = doubles;
    let file = ini_file(
        b"[digest]\nfrom = app@example.com\nto = ops@example.com\nlevel = warn\nsubject = digest\n",
    );
    let handler = summarising_handler_from_ini_file(file.path(), "digest")
        .expect("section parses")
        .with_transport(Arc::new(transport.clone()))
        .with_reporter(Arc::new(reporter.clone()))
        .build_inner()
        .expect("handler builds");

    handler.emit(&FemtoLogRecord::new("app", FemtoLevel::Info, "skipped"));
    handler.emit(&FemtoLogRecord::new("app", FemtoLevel::Error, "kept"));
    assert_eq!(handler.pending(), 1);
    assert!(handler.send_summary());
    assert_eq!(transport.sent()[0].header("Subject").as_deref(), Some("digest"));
}

#[test]
fn summary_section_rejects_flood_level() {
    let file = ini_file(
        b"[digest]\nfrom = app@example.com\nto = ops@example.com\nflood_level = 3\n",
    );
    // Unknown keys are only warned about, so the builder still comes back.
    let builder = summarising_handler_from_ini_file(file.path(), "digest").expect("parses");
    assert!(builder.build().is_ok());
}

#[test]
fn latin1_file_is_decoded() {
    let file = ini_file(b"[mail]\nsubject = caf\xe9 en panne\n");
    let ini = load_ini_file(file.path(), Some("iso-8859-1")).expect("decodes");
    assert_eq!(
        ini.section(Some("mail")).and_then(|s| s.get("subject")),
        Some("caf\u{e9} en panne")
    );
    assert!(load_ini_file(file.path(), None).is_err());
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let err = mail_handler_from_ini_file(dir.path().join("absent.ini"), "mail")
        .expect_err("file does not exist");
    assert!(matches!(err, ConfigurationError::Io(_)));
}

#[test]
fn empty_file_is_rejected() {
    let file = ini_file(b"");
    let err = mail_handler_from_ini_file(file.path(), "mail").expect_err("file is empty");
    assert!(err.to_string().contains("empty"), "{err}");
}

#[rstest]
#[case("[other]\nfrom = a@example.com\n", "no section [mail]")]
#[case("[mail]\nflood_level = many\n", "flood_level")]
#[case("[mail]\ntimeout = 0\n", "timeout")]
#[case("[mail]\nmailhost = smtp.example.com:port\n", "mailhost")]
fn invalid_files_name_the_problem(#[case] contents: &str, #[case] fragment: &str) {
    let file = ini_file(contents.as_bytes());
    let err = mail_handler_from_ini_file(file.path(), "mail").expect_err("invalid config");
    assert!(err.to_string().contains(fragment), "{err}");
}
