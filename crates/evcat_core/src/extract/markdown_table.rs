use crate::domain::RawRecord;

/// Separator rows are made only of pipes, dashes, colons and whitespace (`|---|:--:|`).
fn is_separator_row(line: &str) -> bool {
    !line.is_empty()
        && line
            .chars()
            .all(|c| c == '|' || c == '-' || c == ':' || c.is_whitespace())
}

fn header_cells(line: &str) -> Vec<String> {
    line.split('|')
        .map(|c| c.trim().trim_matches(':').trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn data_cells(line: &str, width: usize) -> Vec<String> {
    let mut cells: Vec<String> = line
        .split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    // Misaligned rows are repaired, never rejected.
    if cells.len() < width {
        tracing::debug!(cells = cells.len(), width, "padding short table row");
        cells.resize(width, String::new());
    } else if cells.len() > width {
        tracing::debug!(cells = cells.len(), width, "truncating long table row");
        cells.truncate(width);
    }
    cells
}

/// Recover rows from a Markdown pipe table, tolerating misaligned columns and stray pipes.
///
/// A separator row promotes the line above it to header. Every later line starting with
/// `|` becomes a data row under the most recent header, so replies with several table
/// fragments yield all their rows in source order. A line that repeats the current header
/// is skipped. No header, no rows.
pub fn parse_markdown_table(text: &str) -> Vec<RawRecord> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut header: Vec<String> = Vec::new();
    let mut rows = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if is_separator_row(line) {
            if i > 0 {
                header = header_cells(lines[i - 1]);
            }
            continue;
        }

        if header.is_empty() || !line.starts_with('|') {
            continue;
        }

        // A repeated header line from a following fragment is not data.
        if header_cells(line) == header {
            continue;
        }

        let cells = data_cells(line, header.len());
        rows.push(header.iter().cloned().zip(cells).collect());
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(rec: &RawRecord) -> Vec<&str> {
        rec.iter().map(|(_, v)| v.as_str()).collect()
    }

    #[test]
    fn parses_aligned_table() {
        let text = "\
| Tipo de Evidência | Trecho | Conteúdo | Resumo | Referência |
|---|---|---|---|---|
| Contrato | \"conforme contrato\" | Cloud Services | Firmado em 2015 | fls. 10 |
| Pagamento | \"TED de R$ 5.000\" | Comprovante | Pago em 2016 | fls. 22 |
";
        let rows = parse_markdown_table(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], ("Tipo de Evidência".to_string(), "Contrato".to_string()));
        assert_eq!(
            values(&rows[1]),
            vec!["Pagamento", "\"TED de R$ 5.000\"", "Comprovante", "Pago em 2016", "fls. 22"]
        );
    }

    #[test]
    fn header_cells_lose_alignment_colons() {
        let text = "| :Tipo: | Trecho: |\n|:---:|---:|\n| a | b |";
        let rows = parse_markdown_table(text);
        assert_eq!(
            rows[0],
            vec![
                ("Tipo".to_string(), "a".to_string()),
                ("Trecho".to_string(), "b".to_string())
            ]
        );
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_truncated() {
        let text = "\
| A | B | C | D | E |
|---|---|---|---|---|
| 1 | 2 |
| 1 | 2 | 3 | 4 | 5 | 6 | 7 |
";
        let rows = parse_markdown_table(text);
        assert_eq!(values(&rows[0]), vec!["1", "2", "", "", ""]);
        assert_eq!(values(&rows[1]), vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn rows_from_every_fragment_are_collected() {
        let text = "\
Segue a análise:
| A | B |
|---|---|
| 1 | 2 |
Mais evidências abaixo.
| C | D |
|---|---|
| 3 | 4 |
";
        let rows = parse_markdown_table(text);
        // "| C | D |" is read as data under A/B before its separator promotes it.
        assert_eq!(rows.len(), 3);
        assert_eq!(values(&rows[1]), vec!["C", "D"]);
        assert_eq!(rows[2][0], ("C".to_string(), "3".to_string()));
    }

    #[test]
    fn trailing_separator_keeps_last_row() {
        let text = "| Tipo | Trecho |\n|---|---|\n| Contrato | fls. 1 |\n| Recibo | fls. 2 |\n|---|---|\n";
        let rows = parse_markdown_table(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(values(&rows[1]), vec!["Recibo", "fls. 2"]);
    }

    #[test]
    fn repeated_header_is_not_data() {
        let text = "\
| A | B |
|---|---|
| 1 | 2 |
| A | B |
|---|---|
| 3 | 4 |
";
        let rows = parse_markdown_table(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(values(&rows[1]), vec!["3", "4"]);
    }

    #[test]
    fn no_header_means_no_rows() {
        assert!(parse_markdown_table("| a | b |\n| c | d |").is_empty());
        assert!(parse_markdown_table("Nenhuma evidência encontrada.").is_empty());
        assert!(parse_markdown_table("|---|---|\n| a | b |").is_empty());
    }

    #[test]
    fn header_without_data_rows_is_empty() {
        assert!(parse_markdown_table("| A | B |\n|---|---|").is_empty());
    }
}
