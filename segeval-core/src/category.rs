//! # Categorias de Avaliação
//!
//! | Rótulo | Seleciona                                                  |
//! |--------|------------------------------------------------------------|
//! | `(t`   | aberturas de texto                                         |
//! | `(s`   | aberturas de sentença                                      |
//! | `(seg` | aberturas de segmento                                      |
//! | `))`   | qualquer fechamento múltiplo (peso = nº de `)` − 1)         |
//! | `Tn`   | fechamentos que encerram exatamente `n` níveis (`n + 1` `)`) |
//!
//! Os buckets `T1..T6` são exclusivos: um fechamento pertence a no máximo um
//! deles, e fechamentos com mais de 7 `)` não pertencem a nenhum.

use serde::{Deserialize, Serialize};

use crate::span::{SpanRecord, SpanTag};
use crate::tokenizer::OpenTag;

/// Maior bucket de profundidade avaliado.
pub const MAX_DEPTH: u8 = 6;

/// Categoria de span avaliada pelo matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Text,
    Sentence,
    Segment,
    /// Todos os fechamentos múltiplos, com crédito parcial por peso.
    Closing,
    /// Bucket `Tn`: fechamentos de exatamente `n` níveis estruturais.
    Depth(u8),
}

impl Category {
    /// Ordem fixa das linhas do relatório.
    pub const REPORT_ORDER: [Category; 10] = [
        Category::Text,
        Category::Sentence,
        Category::Segment,
        Category::Closing,
        Category::Depth(1),
        Category::Depth(2),
        Category::Depth(3),
        Category::Depth(4),
        Category::Depth(5),
        Category::Depth(6),
    ];

    /// Rótulo usado na seleção (ex: `"(seg"`, `"))"`, `"T3"`).
    pub fn label(&self) -> String {
        match self {
            Category::Text => "(t".to_string(),
            Category::Sentence => "(s".to_string(),
            Category::Segment => "(seg".to_string(),
            Category::Closing => "))".to_string(),
            Category::Depth(n) => format!("T{}", n),
        }
    }

    /// Rótulo exibido no relatório: `))` aparece como `)`.
    pub fn display_label(&self) -> String {
        match self {
            Category::Closing => ")".to_string(),
            other => other.label(),
        }
    }

    /// Buckets contam ocorrências; as demais categorias somam pesos.
    pub fn is_depth_bucket(&self) -> bool {
        matches!(self, Category::Depth(_))
    }

    /// Regra de seleção de um registro.
    pub fn selects(&self, record: &SpanRecord) -> bool {
        match (self, record.tag) {
            (Category::Text, SpanTag::Open(tag)) => tag == OpenTag::Text,
            (Category::Sentence, SpanTag::Open(tag)) => tag == OpenTag::Sentence,
            (Category::Segment, SpanTag::Open(tag)) => tag == OpenTag::Segment,
            (Category::Closing, SpanTag::Close(run)) => run >= 2,
            (Category::Depth(n), SpanTag::Close(run)) => run == usize::from(*n) + 1,
            _ => false,
        }
    }

    /// Contribuição de um registro selecionado para os totais.
    pub fn credit(&self, record: &SpanRecord) -> usize {
        if self.is_depth_bucket() {
            1
        } else {
            record.weight
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    /// Tenta parsear a partir do rótulo (ex: "(s" → Sentence, "T2" → Depth(2))
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "(t" => Ok(Category::Text),
            "(s" => Ok(Category::Sentence),
            "(seg" => Ok(Category::Segment),
            "))" | ")" => Ok(Category::Closing),
            _ => match s.strip_prefix('T').and_then(|n| n.parse::<u8>().ok()) {
                Some(n) if (1..=MAX_DEPTH).contains(&n) => Ok(Category::Depth(n)),
                _ => Err(format!("unknown category `{}`", s)),
            },
        }
    }
}
