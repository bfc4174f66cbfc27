//! # Exportação TEI
//!
//! Serializa uma predição **já normalizada** como documento TEI (XML):
//!
//! ```text
//! (t (s (w Hi) (c !)))   →   <body><s n="1"><w>Hi</w><c> </c><c type="PUN">!</c><c> </c></s></body>
//! ```
//!
//! - `(s` vira `<s n=profundidade>`; `(seg` vira `<seg n=profundidade+1>`.
//! - `(w`/`(c` viram folhas `<w>`/`<c type="PUN">`, cada uma seguida de um `<c>` de espaço.
//! - O `(t` externo corresponde ao `<body>`.
//!
//! O cabeçalho (`publicationStmt`) traz estatísticas do documento: tokens,
//! formas distintas, pontuação, segmentos e sentenças por nível, aspas.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::StreamError;
use crate::span::extract_spans;
use crate::tokenizer::{OpenTag, Token, TokenKind};

/// Níveis de segmento reportados no cabeçalho.
const SEGMENT_LEVELS: usize = 7;
/// Níveis de sentença reportados no cabeçalho.
const SENTENCE_LEVELS: usize = 3;

/// Estatísticas que vão para o cabeçalho TEI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeiStats {
    pub words: usize,
    pub word_forms: usize,
    pub punctuation: usize,
    pub quotes: usize,
    pub segments: usize,
    /// Segmentos abertos em cada nível (índice 0 = nível 1).
    pub segments_per_level: Vec<usize>,
    pub sentences: usize,
    pub sentences_per_level: Vec<usize>,
}

impl TeiStats {
    /// Quantos dos primeiros `limit` níveis têm pelo menos um elemento.
    fn max_level(per_level: &[usize], limit: usize) -> usize {
        per_level.iter().take(limit).filter(|&&n| n > 0).count()
    }

    pub fn max_segment_level(&self) -> usize {
        Self::max_level(&self.segments_per_level, SEGMENT_LEVELS)
    }

    pub fn max_sentence_level(&self) -> usize {
        Self::max_level(&self.sentences_per_level, SENTENCE_LEVELS)
    }

    fn level(per_level: &[usize], level: usize) -> usize {
        per_level.get(level).copied().unwrap_or(0)
    }

    /// Pares `(type, valor)` do `publicationStmt`, na ordem do cabeçalho.
    fn publication_fields(&self, timestamp: &str) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = vec![
            ("Timestamp".into(), timestamp.to_string()),
            ("Number of tokens".into(), self.words.to_string()),
            ("Number of unknown tokens".into(), self.words.to_string()),
            ("Number of word forms".into(), self.word_forms.to_string()),
            ("TTR".into(), "0".into()),
            ("Guiraud".into(), "0".into()),
            ("MTLD".into(), "0".into()),
            ("Number of punctuation marks".into(), self.punctuation.to_string()),
            ("Number of lemmata".into(), "0".into()),
            ("Number of segments".into(), self.segments.to_string()),
        ];
        for level in 0..SEGMENT_LEVELS {
            fields.push((
                format!("Number of level-{} segments", level + 1),
                Self::level(&self.segments_per_level, level).to_string(),
            ));
        }
        fields.push(("Maximum segment level".into(), self.max_segment_level().to_string()));
        fields.push(("Number of quotes".into(), self.quotes.to_string()));
        fields.push(("Number of sentences".into(), self.sentences.to_string()));
        for level in 0..SENTENCE_LEVELS {
            fields.push((
                format!("Number of level-{} sentences", level + 1),
                Self::level(&self.sentences_per_level, level).to_string(),
            ));
        }
        fields.push(("Maximum sentence level".into(), self.max_sentence_level().to_string()));
        for unused in [
            "Number of paragraphs",
            "Number of divisions",
            "Number of captions",
            "Number of tables",
            "Number of named entities",
            "Number of nouns",
            "Number of verbs",
            "Number of adjectives",
            "Number of adverbs",
        ] {
            fields.push((unused.to_string(), "0".into()));
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Element {
    name: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Node>,
}

impl Element {
    fn new(name: &'static str) -> Self {
        Element { name, attrs: Vec::new(), children: Vec::new() }
    }

    fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((key, value.into()));
        self
    }

    fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    fn write(&self, out: &mut String, indent: usize) {
        out.push_str(&"  ".repeat(indent));
        out.push('<');
        out.push_str(self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            write_escaped_xml(out, value);
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>\n");
            return;
        }
        out.push('>');
        // Folhas com texto ficam em uma linha só
        if let [Node::Text(text)] = self.children.as_slice() {
            write_escaped_xml(out, text);
        } else {
            out.push('\n');
            for child in &self.children {
                match child {
                    Node::Element(element) => element.write(out, indent + 1),
                    Node::Text(text) => {
                        out.push_str(&"  ".repeat(indent + 1));
                        write_escaped_xml(out, text);
                        out.push('\n');
                    }
                }
            }
            out.push_str(&"  ".repeat(indent));
        }
        out.push_str("</");
        out.push_str(self.name);
        out.push_str(">\n");
    }
}

fn write_escaped_xml(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
}

/// Documento TEI construído a partir de um fluxo normalizado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeiDocument {
    body: Element,
    stats: TeiStats,
    timestamp: String,
}

impl TeiDocument {
    /// Constrói o documento. O fluxo é validado antes (mesmas regras do extrator de spans).
    pub fn from_tokens(tokens: &[Token]) -> Result<Self, StreamError> {
        extract_spans(tokens)?;

        let mut builder = TeiBuilder::default();
        let mut iter = tokens.iter();
        while let Some(token) = iter.next() {
            match &token.kind {
                TokenKind::Open(tag) if tag.is_leaf() => {
                    // Validado: o próximo token é o conteúdo
                    if let Some(Token { kind: TokenKind::Content(text), .. }) = iter.next() {
                        builder.leaf(*tag, text);
                    }
                }
                TokenKind::Open(tag) => builder.open(*tag),
                TokenKind::Close(n) => builder.close(*n),
                TokenKind::Content(_) => {}
            }
        }

        let (body, stats) = builder.finish();
        Ok(TeiDocument {
            body,
            stats,
            timestamp: "0".to_string(),
        })
    }

    /// Data gravada no cabeçalho (ex: `"18.10.2026"`).
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn stats(&self) -> &TeiStats {
        &self.stats
    }

    /// XML completo, indentado, com declaração UTF-8.
    pub fn to_xml(&self) -> String {
        let mut publication = Element::new("publicationStmt");
        for (kind, value) in self.stats.publication_fields(&self.timestamp) {
            publication = publication.child(Element::new("idno").attr("type", kind).text(value));
        }

        let header = Element::new("teiHeader").child(
            Element::new("fileDesc")
                .child(Element::new("titleStmt").child(Element::new("title").text("PlainText")))
                .child(publication)
                .child(
                    Element::new("sourceDesc")
                        .child(Element::new("p").text("Segmentation predicted by grammar induction")),
                ),
        );

        let tei = Element::new("TEI")
            .attr("id", "TEI1")
            .child(header)
            .child(Element::new("text").attr("id", "text1").child(self.body.clone()));

        let mut out = String::from("<?xml version='1.0' encoding='UTF-8'?>\n");
        tei.write(&mut out, 0);
        out
    }
}

/// Estado da construção: pilha de `<s>`/`<seg>` abertos sobre o `<body>`.
struct TeiBuilder {
    /// `open[0]` é sempre o `<body>`.
    open: Vec<Element>,
    /// Todas as tags abertas no fluxo, inclusive `(t` e folhas.
    tags: Vec<OpenTag>,
    stats: TeiStats,
    forms: HashSet<String>,
    sentence_depth: usize,
    segment_depth: usize,
}

impl Default for TeiBuilder {
    fn default() -> Self {
        TeiBuilder {
            open: vec![Element::new("body").attr("id", "body1")],
            tags: Vec::new(),
            stats: TeiStats::default(),
            forms: HashSet::new(),
            sentence_depth: 1,
            segment_depth: 1,
        }
    }
}

impl TeiBuilder {
    fn open(&mut self, tag: OpenTag) {
        self.tags.push(tag);
        match tag {
            OpenTag::Sentence => {
                let element = Element::new("s")
                    .attr("id", format!("s{}", self.stats.sentences))
                    .attr("n", self.sentence_depth.to_string());
                bump(&mut self.stats.sentences_per_level, self.sentence_depth - 1);
                self.stats.sentences += 1;
                self.sentence_depth += 1;
                self.open.push(element);
            }
            OpenTag::Segment => {
                let element = Element::new("seg")
                    .attr("id", format!("seg{}", self.stats.segments))
                    .attr("n", (self.segment_depth + 1).to_string());
                bump(&mut self.stats.segments_per_level, self.segment_depth - 1);
                self.stats.segments += 1;
                self.segment_depth += 1;
                self.open.push(element);
            }
            // (t é o próprio <body>
            _ => {}
        }
    }

    fn leaf(&mut self, tag: OpenTag, text: &str) {
        self.tags.push(tag);
        if text.contains('»') {
            self.stats.quotes += 1;
        }
        let element = match tag {
            OpenTag::Char => {
                self.stats.punctuation += 1;
                Element::new("c").attr("type", "PUN").text(text)
            }
            _ => {
                let element = Element::new("w")
                    .attr("id", format!("w{}", self.stats.words))
                    .attr("lemma", "unknown")
                    .attr("type", "unknown")
                    .attr("ana", "unknown")
                    .text(text);
                self.stats.words += 1;
                self.forms.insert(text.to_string());
                element
            }
        };
        self.append(element);
    }

    fn close(&mut self, run: usize) {
        let mut closed_leaf = false;
        for _ in 0..run {
            match self.tags.pop() {
                Some(OpenTag::Sentence) => {
                    self.sentence_depth -= 1;
                    self.close_element();
                }
                Some(OpenTag::Segment) => {
                    self.segment_depth -= 1;
                    self.close_element();
                }
                Some(tag) if tag.is_leaf() => closed_leaf = true,
                _ => {}
            }
        }
        if closed_leaf {
            self.append(Element::new("c").text(" "));
        }
    }

    fn close_element(&mut self) {
        if self.open.len() > 1 {
            if let Some(element) = self.open.pop() {
                self.append(element);
            }
        }
    }

    fn append(&mut self, element: Element) {
        if let Some(parent) = self.open.last_mut() {
            parent.children.push(Node::Element(element));
        }
    }

    fn finish(mut self) -> (Element, TeiStats) {
        while self.open.len() > 1 {
            self.close_element();
        }
        self.stats.word_forms = self.forms.len();
        let body = self.open.pop().unwrap_or_else(|| Element::new("body"));
        (body, self.stats)
    }
}

fn bump(per_level: &mut Vec<usize>, level: usize) {
    if per_level.len() <= level {
        per_level.resize(level + 1, 0);
    }
    per_level[level] += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::read_stream;

    fn document(text: &str) -> TeiDocument {
        TeiDocument::from_tokens(&read_stream(text)).expect("fluxo válido")
    }

    #[test]
    fn test_stats() {
        let doc = document("(t (s (seg (w ») (w Ja) (c «)) (seg (seg (w ja) (w Ja)))) (s (w Nein) (c !)))");
        let stats = doc.stats();
        assert_eq!(stats.words, 5);
        assert_eq!(stats.word_forms, 4);
        assert_eq!(stats.punctuation, 2);
        assert_eq!(stats.quotes, 1);
        assert_eq!(stats.sentences, 2);
        assert_eq!(stats.sentences_per_level, vec![2]);
        assert_eq!(stats.segments, 3);
        assert_eq!(stats.segments_per_level, vec![2, 1]);
        assert_eq!(stats.max_segment_level(), 2);
        assert_eq!(stats.max_sentence_level(), 1);
    }

    #[test]
    fn test_xml_structure() {
        let xml = document("(t (s (w Hi) (c !)))").with_timestamp("18.10.2026").to_xml();
        assert!(xml.starts_with("<?xml version='1.0' encoding='UTF-8'?>\n<TEI id=\"TEI1\">"));
        assert!(xml.contains("<idno type=\"Timestamp\">18.10.2026</idno>"));
        assert!(xml.contains("<s id=\"s0\" n=\"1\">"));
        assert!(xml.contains("<w id=\"w0\" lemma=\"unknown\" type=\"unknown\" ana=\"unknown\">Hi</w>"));
        assert!(xml.contains("<c type=\"PUN\">!</c>"));
        assert!(xml.contains("<c> </c>"));
        assert!(xml.contains("<idno type=\"Number of sentences\">1</idno>"));
        assert!(xml.trim_end().ends_with("</TEI>"));
    }

    #[test]
    fn test_nested_levels_in_attributes() {
        let xml = document("(t (s (seg (seg (w a)))))").to_xml();
        assert!(xml.contains("<seg id=\"seg0\" n=\"2\">"));
        assert!(xml.contains("<seg id=\"seg1\" n=\"3\">"));
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = document("(t (c &) (c <))").to_xml();
        assert!(xml.contains("<c type=\"PUN\">&amp;</c>"));
        assert!(xml.contains("<c type=\"PUN\">&lt;</c>"));
    }

    #[test]
    fn test_malformed_stream_is_rejected() {
        let err = TeiDocument::from_tokens(&read_stream("(t (s (w a)")).unwrap_err();
        assert!(matches!(err, StreamError::Unclosed { .. }));
    }
}
