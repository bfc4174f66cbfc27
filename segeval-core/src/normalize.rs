//! # Normalização da Predição
//!
//! A saída do modelo tem dois defeitos que precisam ser corrigidos antes da avaliação:
//!
//! 1. **Uma árvore por linha**: cada linha traz seu próprio `(t ... )`, precedido
//!    por um eco da entrada. [`merge_trees`] descarta o eco e junta todas as
//!    linhas sob um único `(t` externo.
//! 2. **Placeholders `(XX`**: o modelo escreve `(XX palavra)` no lugar de `(w`/`(c`,
//!    às vezes com o conteúdo errado. [`resolve_placeholders`] substitui o k-ésimo
//!    placeholder pela k-ésima folha do fluxo de entrada da gramática (referência),
//!    preservando a sequência de `)` prevista pelo modelo.
//!
//! Esta etapa é separada do matcher: a avaliação consome apenas o fluxo já limpo.

use crate::error::NormalizeError;
use crate::tokenizer::{read_stream, reindex, render, tree_pieces, OpenTag, Token, TokenKind};

/// Junta as árvores de todas as linhas sob um único `(t`.
///
/// Em cada linha, tudo antes do primeiro `(t` é descartado, e o `(t` inicial e o
/// último `)` da linha são removidos. Linhas sem `(t` são ignoradas.
pub fn merge_trees(text: &str) -> Vec<Token> {
    let mut merged = vec![Token {
        kind: TokenKind::Open(OpenTag::Text),
        index: 0,
    }];

    for line in text.lines() {
        let Some(pieces) = tree_pieces(line) else {
            continue;
        };
        let mut body = read_stream(&pieces.join(" "));
        // Remove o "(t" de abertura da linha
        body.remove(0);
        drop_last_closing(&mut body);
        merged.extend(body);
    }

    match merged.last_mut() {
        Some(Token { kind: TokenKind::Close(n), .. }) => *n += 1,
        _ => merged.push(Token {
            kind: TokenKind::Close(1),
            index: 0,
        }),
    }

    reindex(merged)
}

fn drop_last_closing(body: &mut Vec<Token>) {
    if let Some(last) = body.last_mut() {
        if let TokenKind::Close(n) = &mut last.kind {
            if *n > 1 {
                *n -= 1;
            } else {
                body.pop();
            }
        }
    }
}

/// Substitui os placeholders `(XX` pelas folhas correspondentes da referência.
///
/// Os dois textos passam antes por [`merge_trees`]. O resultado é a predição
/// corrigida, pronta para [`crate::span::extract_spans`].
pub fn resolve_placeholders(reference: &str, prediction: &str) -> Result<Vec<Token>, NormalizeError> {
    let leaves = reference_leaves(&merge_trees(reference))?;
    let predicted = merge_trees(prediction);

    let mut resolved = Vec::with_capacity(predicted.len());
    let mut placeholder = 0;
    let mut iter = predicted.into_iter().peekable();

    while let Some(token) = iter.next() {
        if token.kind != TokenKind::Open(OpenTag::Placeholder) {
            resolved.push(token);
            continue;
        }
        // O conteúdo previsto é descartado; o fechamento que o segue é mantido
        match iter.next() {
            Some(Token { kind: TokenKind::Content(_), .. }) => {}
            _ => return Err(NormalizeError::MissingContent { index: token.index }),
        }
        let (tag, content) = leaves
            .get(placeholder)
            .ok_or(NormalizeError::ReferenceExhausted { placeholder })?;
        resolved.push(Token { kind: TokenKind::Open(*tag), index: 0 });
        resolved.push(Token { kind: TokenKind::Content(content.clone()), index: 0 });
        placeholder += 1;
    }

    Ok(reindex(resolved))
}

/// Versão textual de [`resolve_placeholders`], no formato do arquivo de predição.
pub fn normalize_prediction(reference: &str, prediction: &str) -> Result<String, NormalizeError> {
    resolve_placeholders(reference, prediction).map(|tokens| render(&tokens))
}

/// Quantos placeholders `(XX` restam em um fluxo.
pub fn count_placeholders(tokens: &[Token]) -> usize {
    tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Open(OpenTag::Placeholder))
        .count()
}

/// Folhas `(w`/`(c` da referência, na ordem em que aparecem.
fn reference_leaves(tokens: &[Token]) -> Result<Vec<(OpenTag, String)>, NormalizeError> {
    let mut leaves = Vec::new();
    let mut iter = tokens.iter().peekable();
    while let Some(token) = iter.next() {
        if let TokenKind::Open(tag @ (OpenTag::Word | OpenTag::Char)) = token.kind {
            match iter.peek() {
                Some(Token { kind: TokenKind::Content(text), .. }) => {
                    leaves.push((tag, text.clone()));
                    iter.next();
                }
                _ => return Err(NormalizeError::MissingContent { index: token.index }),
            }
        }
    }
    Ok(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_trees() {
        let text = "Er kam . (t (s (XX Er) (XX kam) (XX .)))\nGut ! (t (s (XX Gut) (XX !)))";
        let merged = render(&merge_trees(text));
        assert_eq!(merged, "(t (s (XX Er) (XX kam) (XX .)) (s (XX Gut) (XX !)))");
    }

    #[test]
    fn test_merge_single_closing_line() {
        let merged = render(&merge_trees("(t (w a) )"));
        assert_eq!(merged, "(t (w a))");
    }

    #[test]
    fn test_resolve_placeholders() {
        let reference = "(t (w Er) (w kam) (c .))";
        let prediction = "Er kam . (t (s (XX Er) (seg (XX kamm) (XX ,))))";
        let normalized = normalize_prediction(reference, prediction).unwrap();
        assert_eq!(normalized, "(t (s (w Er) (seg (w kam) (c .))))");
    }

    #[test]
    fn test_resolved_stream_has_no_placeholders() {
        let reference = "(t (w Hi) (c !))";
        let prediction = "(t (s (XX Hi) (XX !)))";
        let tokens = resolve_placeholders(reference, prediction).unwrap();
        assert_eq!(count_placeholders(&tokens), 0);
        assert_eq!(tokens.iter().map(|t| t.index).collect::<Vec<_>>(), (0..tokens.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_reference_exhausted() {
        let err = normalize_prediction("(t (w Hi))", "(t (s (XX Hi) (XX !)))").unwrap_err();
        assert_eq!(err, NormalizeError::ReferenceExhausted { placeholder: 1 });
    }

    #[test]
    fn test_placeholder_without_content() {
        let err = normalize_prediction("(t (w Hi))", "(t (s (XX (XX Hi)))").unwrap_err();
        assert!(matches!(err, NormalizeError::MissingContent { .. }));
    }
}
