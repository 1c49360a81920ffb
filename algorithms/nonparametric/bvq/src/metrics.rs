use riskvq_helpers::Label;
use std::collections::{HashMap, VecDeque};

/// Default number of recent classifications tracked by
/// [`ConfusionMatrix::recent_accuracy`].
pub const DEFAULT_WINDOW: usize = 500;

/// Counts of (true label, predicted label) pairs.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    counts: HashMap<Label, HashMap<Label, usize>>,
    recent: VecDeque<bool>,
    window: usize,
}

impl Default for ConfusionMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfusionMatrix {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    pub fn with_window(window: usize) -> Self {
        ConfusionMatrix {
            counts: HashMap::new(),
            recent: VecDeque::with_capacity(window),
            window,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn add_result(&mut self, truth: &Label, predicted: &Label) {
        *self
            .counts
            .entry(truth.clone())
            .or_default()
            .entry(predicted.clone())
            .or_insert(0) += 1;

        if self.window > 0 {
            if self.recent.len() == self.window {
                self.recent.pop_front();
            }
            self.recent.push_back(truth == predicted);
        }
    }

    /// Number of points whose true label is `label`.
    pub fn total_of_label(&self, label: &Label) -> usize {
        self.counts.get(label).map_or(0, |row| row.values().sum())
    }

    /// Number of points predicted as `label`.
    pub fn predicted_as(&self, label: &Label) -> usize {
        self.counts
            .values()
            .map(|row| row.get(label).copied().unwrap_or(0))
            .sum()
    }

    /// Number of points whose true label is anything but `label`.
    pub fn negatives_of_label(&self, label: &Label) -> usize {
        self.counts
            .iter()
            .filter(|(truth, _)| *truth != label)
            .map(|(_, row)| row.values().sum::<usize>())
            .sum()
    }

    pub fn true_positives(&self, label: &Label) -> usize {
        self.counts
            .get(label)
            .and_then(|row| row.get(label))
            .copied()
            .unwrap_or(0)
    }

    pub fn predictions(&self) -> usize {
        self.counts.values().flat_map(|row| row.values()).sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.predictions();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = self.counts.keys().map(|l| self.true_positives(l)).sum();
        correct as f64 / total as f64
    }

    pub fn recall(&self, label: &Label) -> f64 {
        ratio(self.true_positives(label), self.total_of_label(label))
    }

    pub fn precision(&self, label: &Label) -> f64 {
        ratio(self.true_positives(label), self.predicted_as(label))
    }

    pub fn f1_score(&self, label: &Label) -> f64 {
        let recall = self.recall(label);
        let precision = self.precision(label);
        if recall + precision <= 0.0 {
            return 0.0;
        }
        2.0 * recall * precision / (recall + precision)
    }

    /// Accuracy over the last [`window`](Self::window) classifications.
    pub fn recent_accuracy(&self) -> f64 {
        let correct = self.recent.iter().filter(|&&hit| hit).count();
        ratio(correct, self.recent.len())
    }

    pub fn reset(&mut self) {
        self.counts.clear();
        self.recent.clear();
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}
