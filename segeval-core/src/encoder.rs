//! # Codificador de Texto para a Entrada da Gramática
//!
//! Converte texto bruto no fluxo de folhas que o modelo recebe como entrada:
//! cada palavra separada por espaço é quebrada em sequências máximas do alfabeto
//! fixo (`(w ...)`) e em caracteres avulsos (`(c ...)`).
//!
//! ```rust
//! use segeval_core::encoder::encode_text;
//!
//! assert_eq!(encode_text("Grüß Gott!"), "(t (w Grüß) (w Gott) (c !))");
//! ```
//!
//! Parênteses no texto viram colchetes (`(` → `[`, `)` → `]`), para não se
//! confundirem com a notação.

/// Letras além de `A-Z`, `a-z` e `0-9` que fazem parte de palavras.
const WORD_EXTRA: &[char] = &['Ä', 'Ö', 'Ü', 'ä', 'ö', 'ü', 'ß'];

/// Caractere pertence ao alfabeto de palavras?
pub fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || WORD_EXTRA.contains(&ch)
}

/// Codifica o texto inteiro em uma árvore `(t ...)` de uma linha.
pub fn encode_text(text: &str) -> String {
    let mut out = String::from("(t");
    for word in text.split_whitespace() {
        encode_word(&mut out, word);
    }
    out.push(')');
    out
}

fn encode_word(out: &mut String, word: &str) {
    let mut run = String::new();
    for ch in word.chars() {
        if is_word_char(ch) {
            run.push(ch);
            continue;
        }
        flush_word(out, &mut run);
        out.push_str(" (c ");
        out.push(escape_bracket(ch));
        out.push(')');
    }
    flush_word(out, &mut run);
}

fn flush_word(out: &mut String, run: &mut String) {
    if !run.is_empty() {
        out.push_str(" (w ");
        out.push_str(run);
        out.push(')');
        run.clear();
    }
}

fn escape_bracket(ch: char) -> char {
    match ch {
        '(' => '[',
        ')' => ']',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::extract_spans;
    use crate::tokenizer::read_stream;

    #[test]
    fn test_encode_words_and_punctuation() {
        assert_eq!(
            encode_text("»Ja«, sagte er."),
            "(t (c ») (w Ja) (c «) (c ,) (w sagte) (w er) (c .))"
        );
    }

    #[test]
    fn test_encode_brackets() {
        assert_eq!(encode_text("(so)"), "(t (c [) (w so) (c ]))");
    }

    #[test]
    fn test_encode_non_alphabet_letters_become_chars() {
        // Alfabeto fixo: "é" não é letra de palavra
        assert_eq!(encode_text("Café"), "(t (w Caf) (c é))");
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode_text("   "), "(t)");
    }

    #[test]
    fn test_encoded_stream_is_well_formed() {
        let encoded = encode_text("Der kleine Herr Friedemann, 1897.");
        let inventory = extract_spans(&read_stream(&encoded)).unwrap();
        // 4 palavras + vírgula + número + ponto
        assert_eq!(inventory.content_units(), 7);
    }
}
