//! # Relatório de Avaliação
//!
//! Tabela de largura fixa com uma linha por categoria:
//!
//! ```text
//! Token | # Ground Truth | # predictions | % precision | % recall
//! ---------------------------------------------------------------
//! (t    |               1|              1|      100.000|  100.000
//! )     |               2|              1|       50.000|  100.000
//! ```
//!
//! O mesmo [`Report`] é serializável, para quem precisa de saída estruturada (JSON).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::matcher::CategoryScore;
use crate::span::SpanInventory;

const HEADER: &str = "Token | # Ground Truth | # predictions | % precision | % recall";

/// Linha da tabela para uma categoria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Rótulo exibido (`))` aparece como `)`).
    pub label: String,
    pub gt_total: usize,
    pub pred_total: usize,
    pub matched: usize,
    /// Acertos sobre o total do ground truth (ver [`crate::matcher`]).
    pub precision: f64,
    /// Acertos sobre o total previsto.
    pub recall: f64,
}

impl From<&CategoryScore> for ReportRow {
    fn from(score: &CategoryScore) -> Self {
        ReportRow {
            label: score.category.display_label(),
            gt_total: score.gt_total,
            pred_total: score.pred_total,
            matched: score.matched,
            precision: score.precision(),
            recall: score.recall(),
        }
    }
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:6}|{:16}|{:15}|{:13.3}|{:9.3}",
            self.label, self.gt_total, self.pred_total, self.precision, self.recall
        )
    }
}

/// Estatísticas de um fluxo extraído.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSummary {
    /// Quantidade de registros no inventário.
    pub spans: usize,
    /// Palavras + caracteres consumidos.
    pub content_units: usize,
}

impl From<&SpanInventory> for StreamSummary {
    fn from(inventory: &SpanInventory) -> Self {
        StreamSummary {
            spans: inventory.len(),
            content_units: inventory.content_units(),
        }
    }
}

/// Relatório completo de uma execução.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Nome do documento avaliado (ex: caminho do arquivo), se conhecido.
    pub source: Option<String>,
    pub ground_truth: StreamSummary,
    pub prediction: StreamSummary,
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn new(
        source: Option<String>,
        ground_truth: &SpanInventory,
        prediction: &SpanInventory,
        scores: &[CategoryScore],
    ) -> Self {
        Report {
            source,
            ground_truth: ground_truth.into(),
            prediction: prediction.into(),
            rows: scores.iter().map(ReportRow::from).collect(),
        }
    }

    /// Procura a linha pelo rótulo exibido (ex: `"(s"`, `")"`, `"T2"`).
    pub fn row(&self, label: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Apenas a tabela, sem o cabeçalho de estatísticas.
    pub fn table(&self) -> String {
        let mut out = String::new();
        out.push_str(HEADER);
        out.push('\n');
        out.push_str(&"-".repeat(HEADER.len()));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.to_string());
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#Ground Truth spans: {}", self.ground_truth.spans)?;
        writeln!(f, "#Words and characters (ground truth): {}", self.ground_truth.content_units)?;
        writeln!(f, "#Words and characters (prediction): {}", self.prediction.content_units)?;
        if let Some(source) = &self.source {
            writeln!(f, "File: {}", source)?;
        }
        f.write_str(&self.table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;

    fn score(category: Category, gt: usize, pred: usize, matched: usize) -> CategoryScore {
        CategoryScore { category, gt_total: gt, pred_total: pred, matched }
    }

    #[test]
    fn test_row_format() {
        let row = ReportRow::from(&score(Category::Closing, 2, 1, 1));
        assert_eq!(
            row.to_string(),
            ")     |               2|              1|       50.000|  100.000"
        );
    }

    #[test]
    fn test_row_format_zero_division() {
        let row = ReportRow::from(&score(Category::Depth(6), 0, 0, 0));
        assert_eq!(
            row.to_string(),
            "T6    |               0|              0|        0.000|    0.000"
        );
    }

    #[test]
    fn test_table_layout() {
        let report = Report {
            source: Some("kafka.txt".to_string()),
            ground_truth: StreamSummary { spans: 3, content_units: 2 },
            prediction: StreamSummary { spans: 3, content_units: 2 },
            rows: vec![ReportRow::from(&score(Category::Text, 1, 1, 1))],
        };
        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "#Ground Truth spans: 3");
        assert_eq!(lines[3], "File: kafka.txt");
        assert_eq!(lines[4], HEADER);
        assert_eq!(lines[5].len(), HEADER.len());
        assert!(lines[5].chars().all(|c| c == '-'));
        assert_eq!(lines[6], "(t    |               1|              1|      100.000|  100.000");
    }

    #[test]
    fn test_row_lookup() {
        let report = Report {
            source: None,
            ground_truth: StreamSummary::default(),
            prediction: StreamSummary::default(),
            rows: vec![ReportRow::from(&score(Category::Closing, 4, 2, 2))],
        };
        assert_eq!(report.row(")").map(|r| r.matched), Some(2));
        assert!(report.row("T1").is_none());
    }
}
