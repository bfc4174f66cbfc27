//! # Pipeline de Avaliação: Orquestrador com Eventos Observáveis
//!
//! Coordena leitura, normalização opcional, extração de spans e matching, e emite
//! eventos em cada passo via um canal Rust (`mpsc`), permitindo que o servidor
//! WebSocket transmita o progresso em tempo real para o cliente.
//!
//! Uma execução é totalmente síncrona: os dois fluxos são lidos por completo, depois
//! extraídos, e só então as categorias são avaliadas. Vários documentos podem ser
//! avaliados em paralelo com [`EvalPipeline::evaluate_batch`], cada um isolado.

use std::sync::mpsc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::{EvalError, StreamSide};
use crate::matcher::{match_category, CategoryScore};
use crate::normalize::{count_placeholders, merge_trees, resolve_placeholders};
use crate::report::{Report, ReportRow};
use crate::span::{extract_spans, SpanInventory, SpanRecord};
use crate::tokenizer::{read_prediction_stream, read_stream, Token};

/// Eventos emitidos pelo pipeline durante o processamento.
///
/// Cada variante carrega os dados necessários para renderizar uma etapa na UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EvalEvent {
    /// **Passo 1**: placeholders `(XX` substituídos pelas folhas da referência.
    PlaceholdersResolved { resolved: usize },
    /// **Passo 2**: um fluxo foi lido e seu inventário extraído.
    StreamParsed {
        side: StreamSide,
        total_tokens: usize,
        spans: Vec<SpanRecord>,
        content_units: usize,
    },
    /// **Passo 3**: uma categoria foi avaliada (uma vez por categoria, na ordem do relatório).
    CategoryScored { score: CategoryScore, row: ReportRow },
    /// **Conclusão**: relatório completo.
    Done { report: Report, processing_ms: u64 },
    /// **Falha**: fluxo malformado; nenhum relatório parcial é emitido.
    Error {
        side: Option<StreamSide>,
        message: String,
    },
}

/// Um documento a avaliar em lote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalJob {
    pub name: String,
    pub ground_truth: String,
    pub prediction: String,
    /// Entrada da gramática, quando a predição ainda tem placeholders.
    #[serde(default)]
    pub reference: Option<String>,
}

/// Resultado de um documento do lote.
#[derive(Debug)]
pub struct BatchOutcome {
    pub name: String,
    pub result: Result<Report, EvalError>,
}

/// O pipeline de avaliação.
///
/// # Modos de Uso
/// - **Sync**: [`EvalPipeline::evaluate`] para scripts e chamadas diretas.
/// - **Streaming**: [`EvalPipeline::evaluate_streaming`] para UIs reativas (via WebSocket).
#[derive(Debug, Clone, Default)]
pub struct EvalPipeline {
    reference: Option<String>,
    source: Option<String>,
}

impl EvalPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ativa a normalização: a predição bruta terá seus `(XX` resolvidos contra esta referência.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Nome do documento, exibido no relatório.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Avalia de forma síncrona e retorna o relatório.
    pub fn evaluate(&self, ground_truth: &str, prediction: &str) -> Result<Report, EvalError> {
        self.run(ground_truth, prediction, &mut |_| {})
    }

    /// Executa a avaliação enviando eventos de progresso pelo canal `tx`.
    ///
    /// # Fluxo de Eventos
    /// 1. `PlaceholdersResolved` (se houver referência).
    /// 2. `StreamParsed` para o ground truth, depois para a predição.
    /// 3. `CategoryScored` (Loop): uma linha por categoria.
    /// 4. `Done` ou `Error`.
    pub fn evaluate_streaming(&self, ground_truth: &str, prediction: &str, tx: mpsc::Sender<EvalEvent>) {
        let result = self.run(ground_truth, prediction, &mut |event| {
            let _ = tx.send(event);
        });
        if let Err(err) = result {
            let side = match &err {
                EvalError::Stream { side, .. } => Some(*side),
                EvalError::Normalize(_) => Some(StreamSide::Prediction),
            };
            let _ = tx.send(EvalEvent::Error {
                side,
                message: err.to_string(),
            });
        }
    }

    /// Avalia vários documentos em paralelo. A ordem de saída é a mesma da entrada.
    pub fn evaluate_batch(jobs: &[EvalJob]) -> Vec<BatchOutcome> {
        jobs.par_iter()
            .map(|job| {
                let mut pipeline = EvalPipeline::new().with_source(job.name.clone());
                if let Some(reference) = &job.reference {
                    pipeline = pipeline.with_reference(reference.clone());
                }
                BatchOutcome {
                    name: job.name.clone(),
                    result: pipeline.evaluate(&job.ground_truth, &job.prediction),
                }
            })
            .collect()
    }

    fn run(
        &self,
        ground_truth: &str,
        prediction: &str,
        emit: &mut dyn FnMut(EvalEvent),
    ) -> Result<Report, EvalError> {
        let start = std::time::Instant::now();

        // === Passo 1: leitura completa dos dois fluxos ===
        let gt_tokens = read_stream(ground_truth);
        let pred_tokens = match &self.reference {
            Some(reference) => {
                let tokens = resolve_placeholders(reference, prediction)?;
                emit(EvalEvent::PlaceholdersResolved {
                    resolved: count_placeholders(&merge_trees(prediction)),
                });
                tokens
            }
            None => read_prediction_stream(prediction),
        };

        // === Passo 2: extração ===
        let gt = parse_side(StreamSide::GroundTruth, &gt_tokens, emit)?;
        let pred = parse_side(StreamSide::Prediction, &pred_tokens, emit)?;

        // === Passo 3: matching por categoria ===
        let mut scores = Vec::with_capacity(Category::REPORT_ORDER.len());
        for category in Category::REPORT_ORDER {
            let score = match_category(&gt, &pred, category);
            emit(EvalEvent::CategoryScored {
                score,
                row: ReportRow::from(&score),
            });
            scores.push(score);
        }

        let report = Report::new(self.source.clone(), &gt, &pred, &scores);
        emit(EvalEvent::Done {
            report: report.clone(),
            processing_ms: start.elapsed().as_millis() as u64,
        });
        Ok(report)
    }
}

fn parse_side(
    side: StreamSide,
    tokens: &[Token],
    emit: &mut dyn FnMut(EvalEvent),
) -> Result<SpanInventory, EvalError> {
    let inventory = extract_spans(tokens).map_err(|e| EvalError::stream(side, e))?;
    emit(EvalEvent::StreamParsed {
        side,
        total_tokens: tokens.len(),
        spans: inventory.records().to_vec(),
        content_units: inventory.content_units(),
    });
    Ok(inventory)
}
