//! Detection page: an illustration of how the selected algorithm separates
//! anomalies. The data is a generated sample, not a real result.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::shaper::{self, Rgba, ANOMALY, F1, NORMAL, RECALL, SERIES};
use crate::data::Algorithm;
use crate::render::{Board, ChartData, ChartOptions, Dataset, DrawStyle, Family};

use super::mount;

pub const VISUALIZATION: &str = "algorithm-visualization";

/// Which illustration to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visualization {
    IsolationForest,
    Autoencoder,
    Kmeans,
    /// Feature profile radar, shown when no algorithm is selected
    Default,
}

impl From<Option<Algorithm>> for Visualization {
    fn from(algorithm: Option<Algorithm>) -> Self {
        match algorithm {
            Some(Algorithm::IsolationForest) => Visualization::IsolationForest,
            Some(Algorithm::Autoencoder) => Visualization::Autoencoder,
            Some(Algorithm::Kmeans) => Visualization::Kmeans,
            None => Visualization::Default,
        }
    }
}

pub struct AlgorithmPage {
    board: Board,
    selected: Option<Algorithm>,
    seed: u64,
}

impl AlgorithmPage {
    pub fn new(selected: Option<Algorithm>, seed: u64) -> Self {
        AlgorithmPage {
            board: Board::new(&[VISUALIZATION]),
            selected,
            seed,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn selected(&self) -> Option<Algorithm> {
        self.selected
    }

    pub fn visualization(&self) -> Visualization {
        self.selected.into()
    }

    pub fn render(&mut self) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let (family, data, options): (Family, _, _) = match self.visualization() {
            Visualization::IsolationForest => (
                Board::scatter_line,
                isolation_forest_sample(&mut rng),
                ChartOptions::titled("Isolation Forest Anomaly Scores (sample)")
                    .axes("Value", "Anomaly Score"),
            ),
            Visualization::Autoencoder => (
                Board::scatter_line,
                autoencoder_sample(&mut rng),
                ChartOptions::titled("AutoEncoder Reconstruction (sample)")
                    .axes("Time", "Energy Consumption"),
            ),
            Visualization::Kmeans => (
                Board::scatter_line,
                kmeans_sample(&mut rng),
                ChartOptions::titled("K-Means Clusters (sample)").axes("Feature 1", "Feature 2"),
            ),
            Visualization::Default => (
                Board::radar,
                feature_profile(),
                ChartOptions::titled("Feature Profile (sample)").begin_at_zero(),
            ),
        };
        mount(&mut self.board, VISUALIZATION, family, data, options);
    }

    /// Cycle none -> isolation forest -> autoencoder -> k-means
    pub fn select_next(&mut self) {
        self.selected = match self.selected {
            None => Some(Algorithm::ALL[0]),
            Some(current) => {
                let i = Algorithm::ALL.iter().position(|a| *a == current).unwrap_or(0);
                Algorithm::ALL.get(i + 1).copied()
            }
        };
        self.render();
    }

    pub fn select_prev(&mut self) {
        self.selected = match self.selected {
            None => Algorithm::ALL.last().copied(),
            Some(current) => {
                let i = Algorithm::ALL.iter().position(|a| *a == current).unwrap_or(0);
                i.checked_sub(1).map(|i| Algorithm::ALL[i])
            }
        };
        self.render();
    }

    /// Draw a fresh sample
    pub fn regenerate(&mut self) {
        self.seed = self.seed.wrapping_add(1);
        self.render();
    }

    pub fn teardown(&mut self) {
        self.board.teardown();
    }
}

/// Mostly low scores around the centre, with extreme values scoring high
fn isolation_forest_sample(rng: &mut impl Rng) -> ChartData {
    let mut normal = Vec::with_capacity(50);
    for _ in 0..50 {
        normal.push((50.0 + rng.gen_range(-15.0..15.0), rng.gen_range(0.0..0.3)));
    }
    let mut anomalies = Vec::with_capacity(10);
    for _ in 0..10 {
        let value = if rng.gen_bool(0.5) {
            rng.gen_range(100.0..130.0)
        } else {
            rng.gen_range(10.0..30.0)
        };
        anomalies.push((value, rng.gen_range(0.7..1.0)));
    }

    ChartData::new(
        Vec::new(),
        vec![
            scatter("Normal Points", &normal, NORMAL),
            scatter("Anomalies", &anomalies, ANOMALY),
        ],
    )
}

/// Sine wave with a noisy reconstruction; points with a large error are
/// flagged.
fn autoencoder_sample(rng: &mut impl Rng) -> ChartData {
    let n = 50;
    let original: Vec<f64> = (0..n)
        .map(|i| 50.0 + 20.0 * (i as f64 * 0.2).sin() + rng.gen_range(-2.5..2.5))
        .collect();
    let flags: Vec<bool> = (0..n).map(|i| i % 10 == 0 || i % 13 == 0).collect();
    let reconstructed: Vec<f64> = original
        .iter()
        .zip(&flags)
        .map(|(&v, &flag)| {
            if flag {
                v + rng.gen_range(10.0..20.0) * if rng.gen_bool(0.5) { 1.0 } else { -1.0 }
            } else {
                v + rng.gen_range(-1.5..1.5)
            }
        })
        .collect();
    let marked: Vec<Option<f64>> = original
        .iter()
        .zip(&flags)
        .map(|(&v, &flag)| flag.then_some(v))
        .collect();

    ChartData::new(
        (0..n).map(|i| i.to_string()).collect(),
        vec![
            Dataset::new("Original Data", original).color(SERIES),
            Dataset::new("Reconstructed Data", reconstructed).color(RECALL),
            Dataset::gapped("Anomalies", marked)
                .color(ANOMALY)
                .draw(DrawStyle::Points),
        ],
    )
}

const CLUSTER_CENTRES: [(f64, f64); 4] = [(20.0, 20.0), (70.0, 20.0), (20.0, 70.0), (70.0, 70.0)];
const CLUSTER_COLORS: [Rgba; 4] = [NORMAL, RECALL, F1, shaper::BASE_PALETTE[3]];

/// Four tight clusters and a handful of outliers between them
fn kmeans_sample(rng: &mut impl Rng) -> ChartData {
    let mut datasets: Vec<Dataset> = CLUSTER_CENTRES
        .iter()
        .zip(CLUSTER_COLORS)
        .enumerate()
        .map(|(i, (&(cx, cy), color))| {
            let points: Vec<(f64, f64)> = (0..20)
                .map(|_| (cx + rng.gen_range(-5.0..5.0), cy + rng.gen_range(-5.0..5.0)))
                .collect();
            scatter(format!("Cluster {}", i + 1), &points, color)
        })
        .collect();

    let outliers: Vec<(f64, f64)> = (0..8)
        .map(|_| (rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
        .collect();
    datasets.push(scatter("Anomalies", &outliers, ANOMALY));

    ChartData::new(Vec::new(), datasets)
}

fn feature_profile() -> ChartData {
    ChartData::new(
        (1..=5).map(|i| format!("Feature {i}")).collect(),
        vec![
            Dataset::new("Normal Pattern", vec![65.0, 59.0, 80.0, 81.0, 56.0])
                .colors(vec![NORMAL.with_alpha(0.2)], vec![NORMAL]),
            Dataset::new("Anomaly Pattern", vec![28.0, 48.0, 40.0, 19.0, 96.0])
                .colors(vec![ANOMALY.with_alpha(0.2)], vec![ANOMALY]),
        ],
    )
}

fn scatter(label: impl Into<String>, points: &[(f64, f64)], color: Rgba) -> Dataset {
    Dataset::new(label, points.iter().map(|p| p.1).collect())
        .xs(points.iter().map(|p| p.0).collect())
        .color(color)
        .draw(DrawStyle::Points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ChartKind;

    fn chart(page: &AlgorithmPage) -> &crate::render::ChartInstance {
        page.board().chart(VISUALIZATION).unwrap()
    }

    #[test]
    fn test_default_is_feature_radar() {
        let mut page = AlgorithmPage::new(None, 7);
        page.render();
        let chart = chart(&page);
        assert_eq!(chart.kind, ChartKind::Radar);
        assert_eq!(chart.data.labels[4], "Feature 5");
        assert_eq!(chart.data.datasets[1].values[4], Some(96.0));
    }

    #[test]
    fn test_isolation_forest_scores_separate_anomalies() {
        let mut page = AlgorithmPage::new(Some(Algorithm::IsolationForest), 7);
        page.render();
        let data = &chart(&page).data;
        assert_eq!(data.datasets[0].values.len(), 50);
        assert_eq!(data.datasets[1].values.len(), 10);
        assert!(data.datasets[0].values.iter().flatten().all(|&s| s < 0.3));
        assert!(data.datasets[1].values.iter().flatten().all(|&s| s >= 0.7));
    }

    #[test]
    fn test_autoencoder_flags_fixed_positions() {
        let mut page = AlgorithmPage::new(Some(Algorithm::Autoencoder), 7);
        page.render();
        let marked = &chart(&page).data.datasets[2].values;
        assert_eq!(marked.len(), 50);
        assert!(marked[0].is_some() && marked[13].is_some() && marked[20].is_some());
        assert!(marked[1].is_none());
    }

    #[test]
    fn test_kmeans_has_clusters_and_outliers() {
        let mut page = AlgorithmPage::new(Some(Algorithm::Kmeans), 7);
        page.render();
        let data = &chart(&page).data;
        assert_eq!(data.datasets.len(), 5);
        assert_eq!(data.datasets[4].label, "Anomalies");
        assert_eq!(data.datasets[4].values.len(), 8);
        let xs = data.datasets[0].xs.as_ref().unwrap();
        assert!(xs.iter().all(|x| (15.0..25.0).contains(x)));
    }

    #[test]
    fn test_same_seed_same_sample() {
        let mut a = AlgorithmPage::new(Some(Algorithm::Kmeans), 42);
        let mut b = AlgorithmPage::new(Some(Algorithm::Kmeans), 42);
        a.render();
        b.render();
        assert_eq!(chart(&a).data, chart(&b).data);

        b.regenerate();
        assert_ne!(chart(&a).data, chart(&b).data);
    }

    #[test]
    fn test_selection_cycles_through_default() {
        let mut page = AlgorithmPage::new(None, 1);
        page.select_next();
        assert_eq!(page.selected(), Some(Algorithm::IsolationForest));
        page.select_prev();
        assert_eq!(page.selected(), None);
        page.select_prev();
        assert_eq!(page.selected(), Some(Algorithm::Kmeans));
        page.select_next();
        assert_eq!(page.visualization(), Visualization::Default);
        assert_eq!(page.board().live_charts(), 1);
    }
}
