//! # Extração de Spans
//!
//! Percorre a sequência plana de tokens uma única vez e produz o inventário de
//! spans: cada abertura estrutural (`(t`, `(s`, `(seg`) e cada marcador de
//! fechamento múltiplo vira um registro `(tag, posição, peso)`.
//!
//! ## Contador de Posição
//! A posição é medida em **unidades de conteúdo**, não em bytes ou linhas:
//! - `(w palavra)` avança 1, qualquer que seja o tamanho da palavra.
//! - `(c ...)` avança o número de caracteres do conteúdo (sem os `)`), exceto
//!   símbolos reservados (`»`, `«`, `€`), que contam como uma única unidade.
//! - `(XX ...)` avança 1; a categoria real é resolvida antes, em [`crate::normalize`].
//!
//! Tags estruturais e fechamentos nunca avançam a posição.
//!
//! ## Pilha Explícita
//! Cada abertura é empilhada e cada `)` desempilha uma tag. Assim o extrator
//! valida (sem reparar) a estrutura: fechamentos sobrando, folhas sem conteúdo
//! e tags abertas no fim do fluxo viram [`StreamError`].

use serde::{Deserialize, Serialize};

use crate::error::StreamError;
use crate::tokenizer::{OpenTag, Token, TokenKind};

/// Símbolos que contam como uma única unidade dentro de `(c`.
pub const RESERVED_SYMBOLS: &[char] = &['»', '«', '€'];

/// A tag que originou um span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SpanTag {
    /// Abertura estrutural (`(t`, `(s`, `(seg`).
    Open(OpenTag),
    /// Marcador de fechamento com `n >= 2` caracteres `)`.
    Close(usize),
}

impl SpanTag {
    /// Forma literal (ex: `"(s"`, `")))"`).
    pub fn literal(&self) -> String {
        match self {
            SpanTag::Open(tag) => tag.literal().to_string(),
            SpanTag::Close(n) => ")".repeat(*n),
        }
    }

    /// Tamanho da sequência de `)`, se for um fechamento.
    pub fn closing_run(&self) -> Option<usize> {
        match self {
            SpanTag::Close(n) => Some(*n),
            SpanTag::Open(_) => None,
        }
    }
}

/// Um registro do inventário.
///
/// # Exemplo
/// Em `(t (s (w Hi) (c !)))`, o fechamento `)))` vira
/// `SpanRecord { tag: Close(3), position: 2, weight: 2 }`:
/// o primeiro `)` fecha a pontuação e não entra no peso.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanRecord {
    pub tag: SpanTag,
    /// Valor do contador de posição quando o token foi encontrado.
    pub position: usize,
    /// Crédito parcial: 1 para aberturas, `n - 1` para fechamentos.
    pub weight: usize,
}

/// Inventário ordenado de spans de um fluxo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanInventory {
    records: Vec<SpanRecord>,
    /// Total de unidades de conteúdo (palavras + caracteres) consumidas.
    content_units: usize,
}

impl SpanInventory {
    pub fn records(&self) -> &[SpanRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Valor final do contador de posição.
    pub fn content_units(&self) -> usize {
        self.content_units
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpanRecord> {
        self.records.iter()
    }
}

/// Extrai o inventário de spans de uma sequência de tokens.
///
/// Falha no primeiro problema estrutural; nenhum inventário parcial é devolvido.
pub fn extract_spans(tokens: &[Token]) -> Result<SpanInventory, StreamError> {
    let mut stack: Vec<OpenTag> = Vec::new();
    let mut records = Vec::new();
    let mut position = 0;
    let mut iter = tokens.iter().peekable();

    while let Some(token) = iter.next() {
        match &token.kind {
            TokenKind::Open(tag) => {
                ensure_leaf_closed(&stack, token.index)?;
                if tag.is_leaf() {
                    let content = match iter.peek() {
                        Some(Token { kind: TokenKind::Content(text), .. }) => text,
                        _ => {
                            return Err(StreamError::MissingContent {
                                tag: tag.literal().to_string(),
                                index: token.index,
                            })
                        }
                    };
                    position += content_units(*tag, content);
                    iter.next();
                } else {
                    records.push(SpanRecord {
                        tag: SpanTag::Open(*tag),
                        position,
                        weight: 1,
                    });
                }
                stack.push(*tag);
            }
            TokenKind::Close(n) => {
                for _ in 0..*n {
                    if stack.pop().is_none() {
                        return Err(StreamError::Unbalanced { index: token.index });
                    }
                }
                // Um ")" isolado fecha apenas a folha anterior
                if *n >= 2 {
                    records.push(SpanRecord {
                        tag: SpanTag::Close(*n),
                        position,
                        weight: n - 1,
                    });
                }
            }
            TokenKind::Content(text) => {
                ensure_leaf_closed(&stack, token.index)?;
                return Err(StreamError::StrayContent {
                    text: text.clone(),
                    index: token.index,
                });
            }
        }
    }

    if !stack.is_empty() {
        return Err(StreamError::Unclosed {
            open: stack.len(),
            index: tokens.len(),
        });
    }

    Ok(SpanInventory {
        records,
        content_units: position,
    })
}

/// Quantas unidades de posição o conteúdo de uma folha consome.
pub fn content_units(tag: OpenTag, content: &str) -> usize {
    match tag {
        OpenTag::Char => {
            if content.contains(RESERVED_SYMBOLS) {
                1
            } else {
                content.chars().filter(|&c| c != ')').count()
            }
        }
        _ => 1,
    }
}

fn ensure_leaf_closed(stack: &[OpenTag], index: usize) -> Result<(), StreamError> {
    match stack.last() {
        Some(top) if top.is_leaf() => Err(StreamError::LeafNotClosed {
            tag: top.literal().to_string(),
            index,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::read_stream;

    fn spans(text: &str) -> SpanInventory {
        extract_spans(&read_stream(text)).expect("fluxo válido")
    }

    #[test]
    fn test_extract_basic_example() {
        let inv = spans("(t (s (w Hi) (c !)))");
        assert_eq!(
            inv.records(),
            &[
                SpanRecord { tag: SpanTag::Open(OpenTag::Text), position: 0, weight: 1 },
                SpanRecord { tag: SpanTag::Open(OpenTag::Sentence), position: 0, weight: 1 },
                SpanRecord { tag: SpanTag::Close(3), position: 2, weight: 2 },
            ]
        );
        assert_eq!(inv.content_units(), 2);
    }

    #[test]
    fn test_word_counts_one_unit() {
        let inv = spans("(t (s (w Donaudampfschiff) (w fährt)))");
        assert_eq!(inv.content_units(), 2);
    }

    #[test]
    fn test_char_counts_characters() {
        let inv = spans("(t (c ...) (c »))");
        // "..." = 3 unidades, "»" = 1 (símbolo reservado)
        assert_eq!(inv.content_units(), 4);
        assert_eq!(content_units(OpenTag::Char, "€"), 1);
        assert_eq!(content_units(OpenTag::Char, "?!"), 2);
    }

    #[test]
    fn test_placeholder_counts_one_unit() {
        let inv = spans("(t (s (XX Hallo) (XX ...)))");
        assert_eq!(inv.content_units(), 2);
        assert_eq!(inv.records()[2].position, 2);
    }

    #[test]
    fn test_segments_and_nested_closing() {
        let inv = spans("(t (s (seg (w a) (w b)) (seg (w c))))");
        let tags: Vec<(String, usize, usize)> = inv
            .iter()
            .map(|r| (r.tag.literal(), r.position, r.weight))
            .collect();
        assert_eq!(
            tags,
            vec![
                ("(t".to_string(), 0, 1),
                ("(s".to_string(), 0, 1),
                ("(seg".to_string(), 0, 1),
                ("))".to_string(), 2, 1),
                ("(seg".to_string(), 2, 1),
                ("))))".to_string(), 3, 3),
            ]
        );
    }

    #[test]
    fn test_positions_are_monotonic() {
        let inv = spans("(t (s (seg (w Er) (w kam)) (c ,) (seg (w sah) (c .))) (s (w Gut) (c !)))");
        let positions: Vec<usize> = inv.iter().map(|r| r.position).collect();
        assert!(positions.windows(2).all(|w| w[0] <= w[1]), "posições: {:?}", positions);
    }

    #[test]
    fn test_unbalanced_closing() {
        let err = extract_spans(&read_stream("(t (w a))))")).unwrap_err();
        assert!(matches!(err, StreamError::Unbalanced { .. }));
    }

    #[test]
    fn test_missing_content() {
        let err = extract_spans(&read_stream("(t (s (w (w a))))")).unwrap_err();
        assert_eq!(err, StreamError::MissingContent { tag: "(w".to_string(), index: 2 });
    }

    #[test]
    fn test_leaf_not_closed() {
        let err = extract_spans(&read_stream("(t (w a (w b)))")).unwrap_err();
        assert!(matches!(err, StreamError::LeafNotClosed { .. }));
    }

    #[test]
    fn test_stray_content() {
        let err = extract_spans(&read_stream("(t solto (w a))")).unwrap_err();
        assert!(matches!(err, StreamError::StrayContent { index: 1, .. }));
    }

    #[test]
    fn test_unclosed_at_end() {
        let err = extract_spans(&read_stream("(t (s (w a)")).unwrap_err();
        assert_eq!(err, StreamError::Unclosed { open: 2, index: 5 });
    }
}
