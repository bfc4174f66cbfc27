//! # Matcher de Categorias
//!
//! Para cada categoria, filtra os dois inventários e alinha gulosamente cada span
//! previsto com o **primeiro** span ainda livre do ground truth na mesma posição.
//!
//! ## Algoritmo
//! 1. Soma os pesos (ou conta, para buckets `Tn`) dos spans da categoria em cada inventário.
//! 2. Percorre os spans previstos na ordem em que aparecem.
//! 3. Um acerto credita `min(peso previsto, peso real)` (ou 1 para `Tn`) e consome o
//!    registro do ground truth, mesmo que o crédito seja parcial.
//!
//! Nenhum registro participa de mais de um par. Um deslocamento de uma única
//! unidade de posição já zera o crédito do par: não há alinhamento aproximado.
//!
//! ## Nomenclatura
//! A "precisão" aqui é `acertos / total do ground truth` e o "recall" é
//! `acertos / total previsto`, o inverso da convenção usual. Os relatórios
//! existentes dependem desses rótulos, então eles são mantidos como estão.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::span::{SpanInventory, SpanRecord};

/// Resultado do matching de uma categoria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub gt_total: usize,
    pub pred_total: usize,
    pub matched: usize,
}

impl CategoryScore {
    /// `100 * matched / gt_total`, ou 0 quando a categoria não aparece no ground truth.
    pub fn precision(&self) -> f64 {
        percentage(self.matched, self.gt_total)
    }

    /// `100 * matched / pred_total`, ou 0 quando a categoria não aparece na predição.
    pub fn recall(&self) -> f64 {
        percentage(self.matched, self.pred_total)
    }
}

fn percentage(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * matched as f64 / total as f64
    }
}

/// Compara os dois inventários em uma categoria.
///
/// Os inventários não são alterados: os registros consumidos ficam numa estrutura
/// descartável criada a cada chamada, então repetir a chamada dá o mesmo resultado.
pub fn match_category(
    ground_truth: &SpanInventory,
    predicted: &SpanInventory,
    category: Category,
) -> CategoryScore {
    let mut gt_total = 0;
    // Posição -> registros do ground truth ainda livres, na ordem do fluxo
    let mut unmatched: HashMap<usize, VecDeque<&SpanRecord>> = HashMap::new();
    for record in ground_truth.iter().filter(|r| category.selects(r)) {
        gt_total += category.credit(record);
        unmatched.entry(record.position).or_default().push_back(record);
    }

    let mut pred_total = 0;
    let mut matched = 0;
    for candidate in predicted.iter().filter(|r| category.selects(r)) {
        pred_total += category.credit(candidate);

        let hit = unmatched
            .get_mut(&candidate.position)
            .and_then(|queue| queue.pop_front());
        if let Some(gt_record) = hit {
            matched += if category.is_depth_bucket() {
                1
            } else {
                candidate.weight.min(gt_record.weight)
            };
        }
    }

    CategoryScore {
        category,
        gt_total,
        pred_total,
        matched,
    }
}

/// Executa o matcher para todas as categorias do relatório, na ordem fixa.
pub fn match_all(ground_truth: &SpanInventory, predicted: &SpanInventory) -> Vec<CategoryScore> {
    Category::REPORT_ORDER
        .iter()
        .map(|&category| match_category(ground_truth, predicted, category))
        .collect()
}
