use std::fs;

use evcat_ai::audit::AuditLog;

#[test]
fn writes_zero_padded_artifacts_and_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let audit = AuditLog::new(dir.path().join("logs").join("run"));
    assert!(!audit.dir().exists());

    let prompt = audit.record_prompt(7, "Instruções\n\nfls. 7").unwrap();
    let reply = audit.record_reply(7, "| a |\n|---|\n| b |").unwrap();

    assert_eq!(prompt.file_name().unwrap(), "chunk_007_prompt.txt");
    assert_eq!(reply.file_name().unwrap(), "chunk_007_reply.txt");
    assert_eq!(fs::read_to_string(&prompt).unwrap(), "Instruções\n\nfls. 7");
    assert!(audit.dir().is_dir());
    assert_eq!(audit.reply_path(123).file_name().unwrap(), "chunk_123_reply.txt");
}

#[test]
fn unwritable_directory_reports_audit_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("logs");
    fs::write(&blocker, "not a directory").unwrap();

    let err = AuditLog::new(blocker).record_prompt(0, "x").unwrap_err();
    assert_eq!(err.code, "AUDIT_WRITE_FAILED");
}
