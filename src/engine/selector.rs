// src/engine/selector.rs
//! Выбор сбалансированной группы: окно размера k с минимальным разбросом скора.

use std::cmp::Ordering;

use crate::engine::scoring::ScoredCandidate;

/// Выбрать группу из `k` кандидатов с минимальным разбросом скора.
///
/// Алгоритм:
///   1. Сортируем по скору по убыванию; при равенстве - кто раньше в очереди.
///   2. Скользим окном размера `k`, spread = score[first] - score[last].
///   3. Берём окно с минимальным spread; при равенстве - первое (ближе к сильному краю).
///
/// Если кандидатов меньше `k` (или k = 0) - возвращаем пустой вектор:
/// это "сейчас некого назначать", а не ошибка.
///
/// Чистая функция: одинаковый вход → одинаковый выход.
pub fn select_group(candidates: &[ScoredCandidate], k: usize) -> Vec<ScoredCandidate> {
    if k == 0 || candidates.len() < k {
        return Vec::new();
    }

    let mut sorted: Vec<&ScoredCandidate> = candidates.iter().collect();
    sorted.sort_by(|a, b| compare_for_selection(a, b));

    let mut best_start = 0usize;
    let mut min_spread = sorted[0].score - sorted[k - 1].score;

    for start in 1..=(sorted.len() - k) {
        let spread = sorted[start].score - sorted[start + k - 1].score;
        if spread < min_spread {
            min_spread = spread;
            best_start = start;
        }
    }

    sorted[best_start..best_start + k]
        .iter()
        .map(|c| (*c).clone())
        .collect()
}

/// Разброс скора внутри группы (max - min).
pub fn group_spread(group: &[ScoredCandidate]) -> f64 {
    let max = group.iter().map(|c| c.score).fold(f64::NEG_INFINITY, f64::max);
    let min = group.iter().map(|c| c.score).fold(f64::INFINITY, f64::min);
    if group.is_empty() {
        0.0
    } else {
        max - min
    }
}

fn compare_for_selection(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.queue_order.cmp(&b.queue_order))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(id: &str, order: usize, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            participant_id: id.to_string(),
            queue_order: order,
            level: 1,
            age: 1,
            score,
        }
    }

    fn ids(group: &[ScoredCandidate]) -> Vec<&str> {
        group.iter().map(|c| c.participant_id.as_str()).collect()
    }

    #[test]
    fn not_enough_candidates_returns_empty() {
        let pool = vec![c("a", 0, 0.5), c("b", 1, 0.4)];
        assert!(select_group(&pool, 3).is_empty());
        assert!(select_group(&pool, 0).is_empty());
    }

    #[test]
    fn picks_tightest_window() {
        // sorted: a 0.9, b 0.5, c 0.48, d 0.1 -> окно [b, c] spread 0.02
        let pool = vec![c("d", 0, 0.1), c("a", 1, 0.9), c("b", 2, 0.5), c("c", 3, 0.48)];
        assert_eq!(ids(&select_group(&pool, 2)), vec!["b", "c"]);
    }

    #[test]
    fn equal_spread_prefers_high_end() {
        let pool = vec![c("a", 0, 0.9), c("b", 1, 0.8), c("c", 2, 0.7)];
        // [a,b] и [b,c] дают spread 0.1 - выигрывает первое окно.
        let group = select_group(&pool, 2);
        assert_eq!(group.len(), 2);
        assert_eq!(group[0].participant_id, "a");
    }

    #[test]
    fn ties_keep_queue_order() {
        let pool = vec![c("late", 3, 0.5), c("early", 0, 0.5), c("mid", 1, 0.5), c("x", 2, 0.5)];
        let group = select_group(&pool, 2);
        assert_eq!(ids(&group), vec!["early", "mid"]);
        assert_eq!(group_spread(&group), 0.0);
    }
}
