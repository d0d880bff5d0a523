use evcat_core::domain::{CanonicalRecord, EvidenceRow};
use evcat_core::extract::{extract, extract_reply, ReplyFormat};
use evcat_core::filter::retain_evidence;
use pretty_assertions::assert_eq;

fn field<'a>(rec: &'a CanonicalRecord, key: &str) -> &'a str {
    rec.get(key).map(String::as_str).unwrap_or("<absent>")
}

#[test]
fn aligned_table_reply_yields_one_record_per_row() {
    let reply = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../fixtures/replies/aligned_table.md"
    ));
    let ex = extract_reply(reply);
    assert_eq!(ex.format, ReplyFormat::MarkdownTable);
    assert_eq!(ex.records.len(), 3);

    let types: Vec<&str> = ex
        .records
        .iter()
        .map(|r| field(r, "Tipo de Evidência"))
        .collect();
    assert_eq!(
        types,
        vec!["Contrato", "Comprovante de pagamento", "Notificação extrajudicial"]
    );
    assert_eq!(field(&ex.records[1], "Referência"), "p. 15");
}

#[test]
fn misaligned_table_rows_are_padded_and_truncated() {
    let reply = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../fixtures/replies/misaligned_table.md"
    ));
    let records = extract(reply);
    assert_eq!(records.len(), 2);

    // Synonym headers land on canonical columns.
    let short = EvidenceRow::project(&records[0]);
    assert_eq!(short.cells(), ["Laudo pericial", "fls. 40", "", "", ""]);

    let long = EvidenceRow::project(&records[1]);
    assert_eq!(
        long.cells(),
        ["Nota fiscal", "fls. 44", "NF 1234", "Compra do equipamento", "p. 44"]
    );
    assert_eq!(records[1].len(), 5);

    let kept = retain_evidence(&records[0]).unwrap();
    assert_eq!(kept.len(), 2);
}

#[test]
fn json_reply_normalizes_keys_and_values() {
    let reply = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../fixtures/replies/json_array.json"
    ));
    let ex = extract_reply(reply);
    assert_eq!(ex.format, ReplyFormat::JsonArray);
    assert_eq!(ex.records.len(), 2);
    assert_eq!(ex.warnings.len(), 1);

    let first = EvidenceRow::project(&ex.records[0]);
    assert_eq!(
        first.cells(),
        ["Contrato", "fls. 12", "Contrato de locação", "Locação comercial", "p. 12"]
    );

    let second = &ex.records[1];
    assert_eq!(field(second, "Conteúdo"), "Recibo de aluguel de março");
    assert_eq!(field(second, "Referência"), "30");
    assert_eq!(field(second, "Resumo"), "");
    assert!(!retain_evidence(second).unwrap().contains_key("Resumo"));
}

#[test]
fn prose_reply_yields_nothing() {
    let reply = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../fixtures/replies/prose.txt"
    ));
    let ex = extract_reply(reply);
    assert_eq!(ex.format, ReplyFormat::Unrecognized);
    assert!(ex.records.is_empty());
    assert!(ex.warnings.is_empty());
}

#[test]
fn table_wrapped_in_code_fence_still_parses() {
    let reply = "```markdown\n| Tipo | Trecho |\n|---|---|\n| Contrato | fls. 1 |\n```";
    let records = extract(reply);
    assert_eq!(records.len(), 1);
    assert_eq!(field(&records[0], "Trecho"), "fls. 1");
}
