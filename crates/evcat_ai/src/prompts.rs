use evcat_core::config::PipelineConfig;

/// Instruction block sent ahead of every chunk. Asks for one Markdown table row per
/// documentary evidence, under the five column headers the store persists.
pub const DEFAULT_PREAMBLE: &str = r#"Instruções de Análise:

Divisão do Documento:
Analise o documento em blocos. Forneça os seguintes detalhes para cada bloco, seu objetivo principal é identificar as evidências <tipo_evidencias>:
- Tipo de Evidência: Classifique todas as evidências localizadas cujo conteúdo refere-se aos tipos de evidências <tipo_evidencias>.
- Trecho: Como a paginação do arquivo pode conter inconsistências, traga trechos exatamente iguais aos caracteres/palavras do processo lido, de forma que facilite a identificação da página.
- Conteúdo: Descreva o conteúdo brevemente com base no contexto fornecido.
- Resumo: Ofereça um resumo objetivo do que a evidência aborda e sua relevância para o caso.
- Referência: Identifique no arquivo o trecho <pagina>.

<tipo_evidencias>
NOTAS FISCAIS - Notas fiscais de produto e serviço
CONTRATOS (PRÓPRIOS OU DE TERCEIROS) - Contratos entre as partes do processo ou terceiros
PAGAMENTOS (TED, PIX, boletos etc.) - Qualquer comprovante de pagamento
MULTAS CONTRATUAIS - Cláusulas relacionadas a multas contratuais
APONTAMENTOS (OSs) - Apontamentos de produtividade, resumidos ou analíticos
BASE DE CÁLCULO (HORAS INTERNAS COLABORADORES) - Relação de horas gastas/aplicadas
OSCILAÇÕES DE DESPESAS/GASTOS - Relatos sobre gastos e/ou despesas incorridas
PERDAS DIRETAS OU INDIRETAS - Relatos sobre perdas incorridas
REEMBOLSO E DESPESAS DE VIAGENS - Relatos sobre reembolsos e despesas de viagem
</tipo_evidencias>

<pagina>
Identifique o trecho [fls.]; a numeração na sequência corresponde à numeração da página.
</pagina>

Formato de Resposta (OBRIGATÓRIO):
- Responda exclusivamente em formato de tabela Markdown, conforme o exemplo.
- Nunca utilize JSON ou outro formato, mesmo que o texto seja extenso.
- Não inclua explicações ou texto fora da tabela.

| Tipo de Evidência | Trecho | Conteúdo | Resumo | Referência |
|-------------------|--------|----------|--------|------------|
| Contrato | "conforme previu contrato na página 4, artigo 1°" | Contrato de Cloud Services com Oracle | Contrato firmado em 22/01/2015 | Pág. 10 |

Cada linha deve representar uma evidência encontrada no bloco. Mesmo que haja apenas uma evidência, mantenha o formato de tabela.

Validação de Evidências:
- Valide se os documentos citados são provas diretas ou contextuais.
- Toda linha precisa OBRIGATORIAMENTE preencher: Tipo de Evidência, Trecho, Conteúdo, Resumo, Referência.
- O "Trecho" é obrigatório e deve estar contido no documento de entrada; nunca invente, infira ou autocomplete.
- Ignore narrativas jurídicas, exposições de fatos, fundamentos legais, jurisprudência e pedidos. Analise SOMENTE trechos de natureza documental (comprovantes, notas, tabelas, extratos, recibos, contratos, notificações, OS, relatórios, anexos etc.).
- Só classifique como evidência documentos, anexos, provas objetivas ou elementos mensuráveis."#;

/// `preamble` + blank line + chunk text, exactly as sent to the generator.
pub fn build_prompt(preamble: &str, chunk_text: &str) -> String {
    format!("{preamble}\n\n{chunk_text}")
}

pub fn resolve_preamble(config: &PipelineConfig) -> &str {
    config.preamble.as_deref().unwrap_or(DEFAULT_PREAMBLE)
}
