//! # Leitor de Fluxos em Notação de Colchetes
//!
//! Divide o texto anotado (uma ou mais linhas) em uma sequência plana de tokens.
//! As linhas são concatenadas com um espaço e os tokens são separados por espaços
//! em branco; a ordem original nunca é alterada.
//!
//! ## Alfabeto
//!
//! | Token      | Significado                                           |
//! |------------|-------------------------------------------------------|
//! | `(t`       | Texto inteiro                                         |
//! | `(s`       | Sentença                                              |
//! | `(seg`     | Segmento                                              |
//! | `(w`       | Palavra (folha)                                       |
//! | `(c`       | Caractere/pontuação (folha)                           |
//! | `(XX`      | Folha de categoria desconhecida (saída do modelo)     |
//! | `)))`      | Marcador de fechamento (um ou mais `)`)               |
//! | outro      | Conteúdo literal                                      |
//!
//! O conteúdo de uma folha pode vir colado ao seu fechamento (`(w Hi)))`):
//! o leitor separa a sequência final de `)` em um token de fechamento próprio.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use segeval_core::tokenizer::{read_stream, TokenKind};
//!
//! let tokens = read_stream("(t (s (w Hi) (c !)))");
//! assert_eq!(tokens.len(), 8);
//! assert_eq!(tokens[7].kind, TokenKind::Close(3));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Separa um pedaço em conteúdo + sequência final de `)`.
static TRAILING_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<body>.*?)(?P<close>\)*)$").expect("valid regex"));

/// Tags de abertura reconhecidas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenTag {
    /// `(t`: o texto completo.
    Text,
    /// `(s`: uma sentença.
    Sentence,
    /// `(seg`: um segmento dentro da sentença.
    Segment,
    /// `(w`: uma palavra. Conta uma unidade de posição.
    Word,
    /// `(c`: pontuação ou caractere avulso. Conta um caractere por unidade.
    Char,
    /// `(XX`: placeholder do modelo no lugar de `(w`/`(c`.
    Placeholder,
}

impl OpenTag {
    /// Forma literal da tag no fluxo (ex: `"(seg"`).
    pub fn literal(&self) -> &'static str {
        match self {
            OpenTag::Text => "(t",
            OpenTag::Sentence => "(s",
            OpenTag::Segment => "(seg",
            OpenTag::Word => "(w",
            OpenTag::Char => "(c",
            OpenTag::Placeholder => "(XX",
        }
    }

    /// Tenta reconhecer uma tag a partir do literal exato.
    pub fn from_literal(s: &str) -> Option<Self> {
        match s {
            "(t" => Some(OpenTag::Text),
            "(s" => Some(OpenTag::Sentence),
            "(seg" => Some(OpenTag::Segment),
            "(w" => Some(OpenTag::Word),
            "(c" => Some(OpenTag::Char),
            "(XX" => Some(OpenTag::Placeholder),
            _ => None,
        }
    }

    /// Folhas carregam conteúdo; tags estruturais não.
    pub fn is_leaf(&self) -> bool {
        matches!(self, OpenTag::Word | OpenTag::Char | OpenTag::Placeholder)
    }
}

/// Tipo de um token do fluxo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TokenKind {
    Open(OpenTag),
    /// Marcador de fechamento com `n` caracteres `)`.
    Close(usize),
    Content(String),
}

/// Um token do fluxo plano.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            TokenKind::Open(tag) => f.write_str(tag.literal()),
            TokenKind::Close(n) => f.write_str(&")".repeat(*n)),
            TokenKind::Content(text) => f.write_str(text),
        }
    }
}

/// Lê um fluxo completo (ground truth ou predição já normalizada).
pub fn read_stream(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for piece in text.split_whitespace() {
        push_piece(&mut tokens, piece);
    }
    reindex(tokens)
}

/// Lê a saída bruta do modelo.
///
/// Cada linha da predição repete a entrada antes da árvore; tudo que vem antes do
/// primeiro `(t` da linha é descartado. Linhas sem `(t` são ignoradas.
pub fn read_prediction_stream(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for line in text.lines() {
        if let Some(pieces) = tree_pieces(line) {
            for piece in pieces {
                push_piece(&mut tokens, piece);
            }
        }
    }
    reindex(tokens)
}

/// Pedaços de uma linha a partir do primeiro `(t` isolado.
pub fn tree_pieces(line: &str) -> Option<Vec<&str>> {
    let pieces: Vec<&str> = line.split_whitespace().collect();
    let start = pieces.iter().position(|p| *p == OpenTag::Text.literal())?;
    Some(pieces[start..].to_vec())
}

/// Separa o conteúdo de uma folha da sequência de `)` colada ao final.
///
/// Retorna `(conteúdo, número de ')')`. `"Hi)))"` → `("Hi", 3)`.
pub fn split_closing(piece: &str) -> (&str, usize) {
    match TRAILING_CLOSE.captures(piece) {
        Some(caps) => {
            let body = caps.name("body").map_or("", |m| m.as_str());
            let close = caps.name("close").map_or(0, |m| m.as_str().len());
            (body, close)
        }
        None => (piece, 0),
    }
}

/// Renderiza tokens de volta para a notação de colchetes.
///
/// Conteúdo e o fechamento que o segue são colados (`Hi)))`), como no formato de entrada.
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut previous_was_content = false;
    for token in tokens {
        let glue = previous_was_content && matches!(token.kind, TokenKind::Close(_));
        if !out.is_empty() && !glue {
            out.push(' ');
        }
        out.push_str(&token.to_string());
        previous_was_content = matches!(token.kind, TokenKind::Content(_));
    }
    out
}

fn push_piece(tokens: &mut Vec<Token>, piece: &str) {
    if let Some(tag) = OpenTag::from_literal(piece) {
        push_token(tokens, TokenKind::Open(tag));
        return;
    }
    let (body, close) = split_closing(piece);
    if !body.is_empty() {
        push_token(tokens, TokenKind::Content(body.to_string()));
    }
    if close > 0 {
        push_token(tokens, TokenKind::Close(close));
    }
}

fn push_token(tokens: &mut Vec<Token>, kind: TokenKind) {
    tokens.push(Token { kind, index: 0 });
}

// Re-indexa os tokens
pub(crate) fn reindex(mut tokens: Vec<Token>) -> Vec<Token> {
    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_stream_basic() {
        let tokens = read_stream("(t (s (w Hi) (c !)))");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Open(OpenTag::Text),
                TokenKind::Open(OpenTag::Sentence),
                TokenKind::Open(OpenTag::Word),
                TokenKind::Content("Hi".to_string()),
                TokenKind::Close(1),
                TokenKind::Open(OpenTag::Char),
                TokenKind::Content("!".to_string()),
                TokenKind::Close(3),
            ]
        );
        assert_eq!(tokens[7].index, 7);
    }

    #[test]
    fn test_lines_are_joined() {
        let one = read_stream("(t (s (w a)\n(w b)))");
        let two = read_stream("(t (s (w a) (w b)))");
        assert_eq!(one, two);
    }

    #[test]
    fn test_standalone_closing_marker() {
        let tokens = read_stream("(seg (w a) ))");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Close(2));
    }

    #[test]
    fn test_split_closing() {
        assert_eq!(split_closing("Hi)))"), ("Hi", 3));
        assert_eq!(split_closing("»"), ("»", 0));
        assert_eq!(split_closing("))"), ("", 2));
    }

    #[test]
    fn test_prediction_prefix_is_dropped() {
        let text = "Hi ! (t (s (XX Hi) (XX !)))\nsem arvore aqui\n(t (s (XX Ok)))";
        let tokens = read_prediction_stream(text);
        assert_eq!(tokens[0].kind, TokenKind::Open(OpenTag::Text));
        let texts = tokens.iter().filter(|t| t.kind == TokenKind::Open(OpenTag::Text)).count();
        // Duas árvores, a linha sem "(t" foi ignorada
        assert_eq!(texts, 2);
        assert!(!tokens.iter().any(|t| t.kind == TokenKind::Content("sem".to_string())));
    }

    #[test]
    fn test_render_roundtrip() {
        let text = "(t (s (w Hi) (c !)))";
        assert_eq!(render(&read_stream(text)), text);
    }
}
