//! # segeval-core: Avaliação de Segmentações em Notação de Colchetes
//!
//! Este crate compara uma segmentação prevista por um modelo com uma segmentação
//! anotada manualmente (ground truth). As duas são árvores escritas como fluxos de
//! tokens separados por espaço, por exemplo:
//!
//! ```text
//! (t (s (seg (w Er) (w kam)) (c .)))
//! ```
//!
//! ## Arquitetura do Sistema
//!
//! O dado flui por estágios independentes:
//!
//! 1.  **Leitura** ([`tokenizer`]): o texto vira uma sequência de [`Token`]s (aberturas, conteúdo, fechamentos).
//! 2.  **Normalização** ([`normalize`], opcional): a saída bruta do modelo é limpa (eco, uma árvore por linha, placeholders `(XX`).
//! 3.  **Extração** ([`span`]): a árvore é validada e vira um inventário de spans posicionados.
//! 4.  **Matching** ([`matcher`]): para cada [`Category`], conta quantos spans previstos coincidem com o ground truth.
//! 5.  **Relatório** ([`report`]): tabela com contagens, precisão e cobertura por categoria.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use segeval_core::EvalPipeline;
//!
//! let gt = "(t (s (w Er) (w kam) (c .)))";
//! let pred = "(t (s (w Er) (w kam)) (c .))";
//!
//! let report = EvalPipeline::new().evaluate(gt, pred).unwrap();
//! let s = report.row("(s").unwrap();
//! assert_eq!((s.gt_total, s.pred_total, s.matched), (1, 1, 1));
//! println!("{}", report);
//! ```
//!
//! ## Módulos Auxiliares
//!
//! - [`encoder`]: gera a entrada da gramática a partir de texto bruto.
//! - [`sentences`]: separa um fluxo nos seus grupos de nível superior.
//! - [`tei`]: exporta uma segmentação como documento TEI-XML.
//! - [`corpus`]: documentos de demonstração.

pub mod category;
pub mod corpus;
pub mod encoder;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod sentences;
pub mod span;
pub mod tei;
pub mod tokenizer;

pub use category::Category;
pub use error::{EvalError, NormalizeError, StreamError, StreamSide};
pub use matcher::{match_all, match_category, CategoryScore};
pub use pipeline::{BatchOutcome, EvalEvent, EvalJob, EvalPipeline};
pub use report::{Report, ReportRow};
pub use span::{extract_spans, SpanInventory, SpanRecord};
pub use tokenizer::{read_prediction_stream, read_stream, Token, TokenKind};
