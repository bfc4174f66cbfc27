//! # Corpus de Demonstração
//!
//! Pequenos documentos em alemão com anotação manual (ground truth) e a saída bruta
//! do modelo (com eco da entrada e placeholders `(XX`). Servem para a interface web,
//! para o comando `demo` da CLI e para os testes.

use crate::encoder::encode_text;

/// Um documento de demonstração.
pub struct DemoDocument {
    /// Nome curto (usado como "File:" no relatório).
    pub name: &'static str,
    /// Texto bruto original.
    pub text: &'static str,
    /// Anotação manual em notação de colchetes.
    pub ground_truth: &'static str,
    /// Saída bruta do modelo, uma árvore por linha.
    pub prediction: &'static str,
}

impl DemoDocument {
    /// Fluxo de entrada da gramática, usado para resolver os placeholders.
    pub fn reference(&self) -> String {
        encode_text(self.text)
    }
}

/// Retorna todos os documentos de demonstração
pub fn demo_documents() -> Vec<DemoDocument> {
    vec![
        // Predição perfeita: duas sentenças, uma por linha
        DemoDocument {
            name: "urteil",
            text: "Der Vater kam. Georg schwieg.",
            ground_truth: "(t (s (w Der) (w Vater) (w kam) (c .)) (s (w Georg) (w schwieg) (c .)))",
            prediction: "Der Vater kam . (t (s (XX Der) (XX Vater) (XX kam) (XX .)))\n\
                         Georg schwieg . (t (s (XX Georg) (XX schwieg) (XX .)))",
        },
        // O modelo perde o primeiro segmento e junta a pontuação final ao último
        DemoDocument {
            name: "galerie",
            text: "»Ja«, sagte er, und ging hinaus.",
            ground_truth: "(t (s (seg (c ») (w Ja) (c «)) (c ,) (seg (w sagte) (w er)) (c ,) \
                           (seg (w und) (w ging) (w hinaus)) (c .)))",
            prediction: "» Ja « , sagte er , und ging hinaus . (t (s (XX ») (XX Ja) (XX «) (XX ,) \
                         (seg (XX sagte) (XX er) (XX ,)) (seg (XX und) (XX ging) (XX hinaus) (XX .))))",
        },
        // Segunda sentença prevista dentro da primeira
        DemoDocument {
            name: "friedemann",
            text: "Er lachte. Dann ging er.",
            ground_truth: "(t (s (w Er) (w lachte) (c .)) (s (seg (w Dann) (w ging)) (w er) (c .)))",
            prediction: "Er lachte . Dann ging er . (t (s (XX Er) (XX lachte) (XX .) \
                         (s (XX Dann) (XX ging) (XX er) (XX .))))",
        },
    ]
}

/// Procura um documento pelo nome.
pub fn demo_document(name: &str) -> Option<DemoDocument> {
    demo_documents().into_iter().find(|d| d.name == name)
}
