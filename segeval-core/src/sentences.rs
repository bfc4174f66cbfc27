//! # Separador de Sentenças
//!
//! Quebra um fluxo de colchetes nos seus grupos de nível superior, um por linha.
//! É usado para preparar conjuntos de teste: cada grupo balanceado `( ... )` vira
//! uma unidade; grupos de pontuação solta (`(c ...)`) são descartados.

/// Separa os grupos balanceados de nível superior.
///
/// O texto pode ter quebras de linha; elas são tratadas como espaço.
pub fn split_sentences(stream: &str) -> Vec<String> {
    let joined = stream.lines().collect::<Vec<_>>().join(" ");
    let mut sentences = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in joined.char_indices() {
        match ch {
            '(' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let group = &joined[start..=i];
                    if !group.starts_with("(c") {
                        sentences.push(group.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_top_level_groups() {
        let stream = "(s (w Er) (w kam) (c .)) (s (w Gut) (c !))";
        assert_eq!(
            split_sentences(stream),
            vec!["(s (w Er) (w kam) (c .))", "(s (w Gut) (c !))"]
        );
    }

    #[test]
    fn test_loose_punctuation_is_dropped() {
        let stream = "(s (w Ja)) (c ») (s (w Nein))";
        assert_eq!(split_sentences(stream), vec!["(s (w Ja))", "(s (w Nein))"]);
    }

    #[test]
    fn test_multiline_input() {
        let stream = "(s (w Er)\n(w kam))\n(s (w Gut))";
        assert_eq!(split_sentences(stream), vec!["(s (w Er) (w kam))", "(s (w Gut))"]);
    }

    #[test]
    fn test_unbalanced_tail_is_ignored() {
        assert_eq!(split_sentences("(s (w a)) (s (w b)"), vec!["(s (w a))"]);
    }
}
