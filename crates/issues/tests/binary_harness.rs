#![allow(unused)]
//! Binary log reading harness.
//!
//! # What this covers
//!
//! - A checked-in `.binlog` of the full solution build, read end to end,
//!   with unrelated record kinds skipped by length.
//! - A bare gzip-wrapped header, as written for a build without events.
//! - Divergences from the XML reader: absent positions never drop an event,
//!   an unmappable project only clears the project.
//! - gzip-wrapped logs and automatic format detection.

mod common;
use common::*;

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use msbuild_issues::{
    BinaryLogWriter, BuildEvent, BinaryLogError, DropReason, Error, LogFormat, ReadOptions,
    Severity,
};

#[test]
fn full_log_yields_expected_issues_in_order() {
    let issues = reader().read(LogFormat::Binary, FULL_BINARY_LOG).unwrap();

    let summaries: Vec<_> = issues.iter().map(summary).collect();
    assert_eq!(
        summaries,
        vec![
            (Some("src/ClassLibrary1/Class1.cs"), Some(10), Some(17), Some("CS0219"), "Warning"),
            (Some("src/ClassLibrary1/Class1.cs"), Some(1), Some(1), Some("SA1652"), "Warning"),
            (Some("src/ClassLibrary1/Properties/AssemblyInfo.cs"), Some(7), Some(34), Some("CS1002"), "Error"),
            (Some("src/ClassLibrary1/Class1.cs"), None, Some(5), Some("CS1591"), "Warning"),
            (None, None, None, Some("CA2210"), "Warning"),
        ]
    );
}

#[test]
fn full_log_stats() {
    let report = reader()
        .read_report(LogFormat::Binary, FULL_BINARY_LOG)
        .unwrap();
    assert_eq!(report.stats.elements_inspected, 6);
    assert_eq!(report.stats.issues_emitted, 5);
    assert_eq!(report.stats.dropped.get(&DropReason::FileOutsideRepository), Some(&1));
}

#[test]
fn full_log_formats_message_arguments() {
    let issues = reader().read(LogFormat::Binary, FULL_BINARY_LOG).unwrap();
    assert_eq!(
        issues[0].message(),
        "The variable 'foo' is assigned but its value is never used"
    );
    assert_eq!((issues[0].end_line(), issues[0].end_column()), (Some(10), Some(20)));
    assert_eq!(issues[0].project_name(), "ClassLibrary1");
}

#[test]
fn compressed_log_without_records_has_no_issues() {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&9i32.to_le_bytes()).unwrap();
    encoder.write_all(&[0]).unwrap();
    let content = encoder.finish().unwrap();

    let reader = reader();
    assert!(reader.read(LogFormat::Binary, &content).unwrap().is_empty());

    let report = reader.read_auto(&content).unwrap();
    assert_eq!(report.stats.format, LogFormat::Binary);
    assert!(report.issues.is_empty());
}

#[test]
fn writer_output_reads_like_logger_output() {
    let project = r"c:\Source\Cake.Issues.MsBuild\src\ClassLibrary1\ClassLibrary1.csproj";
    let mut writer = BinaryLogWriter::new();
    writer.write_event(
        &BuildEvent::warning("Missing XML comment")
            .with_code("CS1591")
            .in_project(project)
            .at("Class1.cs", 0, 5),
    );
    let issues = reader()
        .read(LogFormat::Binary, &writer.finish_compressed().unwrap())
        .unwrap();

    let expected = reader().read(LogFormat::Binary, FULL_BINARY_LOG).unwrap();
    assert_eq!(summary(&issues[0]), summary(&expected[3]));
}

#[test]
fn missing_line_is_kept_unlike_xml() {
    let xml = r#"<build><warning file="src\A.cs" column="3">msg</warning></build>"#;
    assert!(read_xml(xml).is_empty());

    let mut writer = BinaryLogWriter::new();
    writer.write_event(&BuildEvent::warning("msg").at(r"c:\Source\Cake.Issues.MsBuild\src\A.cs", 0, 3));
    let issues = reader().read(LogFormat::Binary, &writer.finish()).unwrap();

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].line(), None);
    assert_eq!(issues[0].column(), Some(3));
}

#[test]
fn project_outside_repository_differs_from_xml() {
    let xml = r#"<build><project file="c:\Other\Other.csproj"><warning line="1" column="1">msg</warning></project></build>"#;
    assert!(read_xml(xml).is_empty());

    let mut writer = BinaryLogWriter::new();
    writer.write_event(&BuildEvent::warning("msg").in_project(r"c:\Other\Other.csproj"));
    let issues = reader().read(LogFormat::Binary, &writer.finish()).unwrap();

    assert_eq!(issues.len(), 1);
    assert!(issues[0].project_path().is_none());
    assert_eq!(issues[0].project_name(), "");
}

#[test]
fn compressed_log_reads_like_plain_log() {
    let mut writer = BinaryLogWriter::new();
    writer.write_event(&BuildEvent::error("boom").with_code("CS1002"));
    let content = writer.finish_compressed().unwrap();

    let issues = reader().read(LogFormat::Binary, &content).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity(), Severity::Error);
}

#[test]
fn auto_detection_picks_each_format() {
    let reader = reader();

    let binary = reader.read_auto(FULL_BINARY_LOG).unwrap();
    assert_eq!(binary.stats.format, LogFormat::Binary);

    let xml = reader.read_auto(FULL_XML_LOG.as_bytes()).unwrap();
    assert_eq!(xml.stats.format, LogFormat::Xml);

    let snap = reader.metrics().snapshot();
    assert_eq!((snap.xml_logs, snap.binary_logs), (1, 1));
    assert_eq!(snap.issues_emitted, 10);
}

#[test]
fn xml_read_as_binary_is_an_error() {
    let err = reader()
        .read(LogFormat::Binary, FULL_XML_LOG.as_bytes())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Binary(BinaryLogError::NewerThanReader { .. })
    ));
}
