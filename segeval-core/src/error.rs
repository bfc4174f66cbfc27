//! # Erros da Avaliação
//!
//! Taxonomia dos erros que interrompem uma execução. Categorias vazias e
//! spans sem correspondência **não** são erros: viram zero no relatório.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Qual dos dois fluxos de entrada falhou.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamSide {
    /// Anotação manual (referência).
    GroundTruth,
    /// Saída do modelo de indução gramatical.
    Prediction,
}

impl StreamSide {
    pub fn name(&self) -> &'static str {
        match self {
            StreamSide::GroundTruth => "ground truth",
            StreamSide::Prediction => "prediction",
        }
    }
}

impl std::fmt::Display for StreamSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Erro estrutural em um fluxo de colchetes. É fatal: o extrator não tenta reparar.
///
/// Todas as variantes carregam o índice do token (posição na sequência plana)
/// onde o problema foi detectado.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// Um `)` sem nenhuma tag aberta para fechar.
    #[error("unbalanced closing bracket at token {index}")]
    Unbalanced { index: usize },

    /// `(w`, `(c` ou `(XX` sem o token de conteúdo logo em seguida.
    #[error("opener `{tag}` at token {index} has no content token")]
    MissingContent { tag: String, index: usize },

    /// Uma palavra/pontuação ainda aberta quando outro token começou.
    #[error("leaf `{tag}` is still open at token {index}")]
    LeafNotClosed { tag: String, index: usize },

    /// Texto literal fora de qualquer folha `(w`/`(c`/`(XX`.
    #[error("stray content `{text}` at token {index}")]
    StrayContent { text: String, index: usize },

    /// O fluxo terminou com tags ainda abertas.
    #[error("{open} bracket(s) left open at end of stream (token {index})")]
    Unclosed { open: usize, index: usize },
}

impl StreamError {
    /// Índice aproximado do token que causou o erro.
    pub fn index(&self) -> usize {
        match self {
            StreamError::Unbalanced { index }
            | StreamError::MissingContent { index, .. }
            | StreamError::LeafNotClosed { index, .. }
            | StreamError::StrayContent { index, .. }
            | StreamError::Unclosed { index, .. } => *index,
        }
    }
}

/// Falha de uma execução de avaliação, identificando o fluxo culpado.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("{side} stream is malformed: {source}")]
    Stream {
        side: StreamSide,
        #[source]
        source: StreamError,
    },

    #[error("prediction normalization failed: {0}")]
    Normalize(#[from] NormalizeError),
}

impl EvalError {
    pub fn stream(side: StreamSide, source: StreamError) -> Self {
        EvalError::Stream { side, source }
    }
}

/// Erros da resolução de placeholders `(XX` contra o fluxo de referência.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// A predição tem mais placeholders do que folhas na referência.
    #[error("reference stream has no leaf left for placeholder #{placeholder}")]
    ReferenceExhausted { placeholder: usize },

    /// Placeholder ou folha de referência sem conteúdo.
    #[error("token {index} has no content token after its opener")]
    MissingContent { index: usize },
}
