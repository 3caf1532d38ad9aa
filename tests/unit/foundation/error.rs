use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MontageError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(MontageError::media("x").to_string().contains("media error:"));
    assert!(
        MontageError::encode("x")
            .to_string()
            .contains("encode error:")
    );
    assert!(
        MontageError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MontageError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn export_error_kinds_match_variants() {
    assert_eq!(ExportError::media("x").kind(), ExportErrorKind::Media);
    assert_eq!(
        ExportError::Render("x".into()).kind(),
        ExportErrorKind::Render
    );
    assert_eq!(ExportError::output_dir("x").kind(), ExportErrorKind::OutputDir);
    assert_eq!(
        ExportError::video_writer("x").kind(),
        ExportErrorKind::VideoWriter
    );
    assert_eq!(
        ExportError::append("x").kind(),
        ExportErrorKind::AppendToBuffer
    );
    assert_eq!(ExportError::Cancelled.kind(), ExportErrorKind::Cancelled);
}

#[test]
fn export_error_carries_detail() {
    let err = ExportError::append("pipe closed");
    assert_eq!(err.to_string(), "append to buffer error: pipe closed");
}
