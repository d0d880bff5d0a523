use evcat_core::ingest::{clean_text, load_document, segment};

fn sentence_text(total_chars: usize) -> String {
    let sentence = "O réu reconheceu a dívida perante o juízo da comarca. ";
    let mut out = String::new();
    while out.chars().count() < total_chars {
        out.push_str(sentence);
    }
    out.chars().take(total_chars).collect::<String>().trim().to_string()
}

#[test]
fn large_document_splits_into_bounded_chunks() {
    let text = sentence_text(250_000);
    let chunks: Vec<_> = segment(&text, 80_000).collect();

    assert!(chunks.len() >= 3, "got {} chunks", chunks.len());
    for (i, c) in chunks.iter().enumerate() {
        assert_eq!(c.ordinal, i);
        assert!(!c.text.is_empty());
        assert!(c.char_count <= 80_000);
        assert_eq!(c.char_count, c.text.chars().count());
    }
    // Every chunk but the last ends on a sentence boundary.
    for c in &chunks[..chunks.len() - 1] {
        assert!(c.text.ends_with('.'), "chunk {} cut mid-sentence", c.ordinal);
    }

    let rejoined = chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(rejoined, text);
}

#[test]
fn text_without_terminators_is_cut_at_the_budget() {
    let text = "x".repeat(250);
    let chunks: Vec<_> = segment(&text, 100).collect();
    let lens: Vec<usize> = chunks.iter().map(|c| c.char_count).collect();
    assert_eq!(lens, vec![100, 100, 50]);
    assert_eq!(
        chunks.iter().map(|c| c.text.as_str()).collect::<String>(),
        text
    );
}

#[test]
fn segmentation_is_restartable_and_deterministic() {
    let text = sentence_text(5_000);
    let first: Vec<_> = segment(&text, 700).collect();
    let second: Vec<_> = segment(&text, 700).collect();
    assert_eq!(first, second);

    let segments = segment(&text, 700);
    assert_eq!(segments.clone().count(), first.len());
    assert_eq!(segments.map(|c| c.text_sha256).collect::<Vec<_>>().len(), first.len());
}

#[test]
fn transcript_fixture_cleans_to_one_line() {
    let raw = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../fixtures/transcripts/processo_curto.txt"
    ));
    let cleaned = clean_text(raw);
    assert!(!cleaned.contains('\n'));
    assert!(!cleaned.to_lowercase().contains("página"));
    assert!(!cleaned.contains("___"));
    assert!(cleaned.starts_with("PODER JUDICIÁRIO"));
    assert!(cleaned.ends_with("Despacho: cite-se o réu."));
}

#[test]
fn load_document_reports_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_document(&dir.path().join("ausente.txt")).unwrap_err();
    assert_eq!(err.code, "INGEST_INPUT_NOT_FOUND");
    assert!(!err.retryable);

    let err = load_document(dir.path()).unwrap_err();
    assert_eq!(err.code, "INGEST_INPUT_INVALID");
}

#[test]
fn load_document_keeps_raw_and_cleaned_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("processo.txt");
    std::fs::write(&path, "Página 1\nContrato assinado.\n\n___\nRecibo emitido.\n").unwrap();

    let doc = load_document(&path).unwrap();
    assert_eq!(doc.path, path);
    assert!(doc.raw.starts_with("Página 1"));
    assert_eq!(doc.cleaned, "Contrato assinado. Recibo emitido.");
}
