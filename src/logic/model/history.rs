//! Training History - per-epoch curves

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::artifact::{read_json, write_json};
use super::metrics::EvaluationReport;
use crate::error::PredictorResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub loss: Vec<f32>,
    pub accuracy: Vec<f32>,
    pub val_loss: Vec<f32>,
    pub val_accuracy: Vec<f32>,
    pub val_precision: Vec<f32>,
    pub val_recall: Vec<f32>,
    /// 0-based epoch whose parameters were kept
    pub best_epoch: Option<usize>,
    /// Epoch at which early stopping fired, if it did
    pub stopped_epoch: Option<usize>,
}

impl TrainingHistory {
    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    pub fn record(&mut self, loss: f32, accuracy: f32, validation: Option<&EvaluationReport>) {
        self.loss.push(loss);
        self.accuracy.push(accuracy);
        if let Some(val) = validation {
            self.val_loss.push(val.loss);
            self.val_accuracy.push(val.accuracy);
            self.val_precision.push(val.precision);
            self.val_recall.push(val.recall);
        }
    }

    pub fn stopped_early(&self) -> bool {
        self.stopped_epoch.is_some()
    }

    pub fn save(&self, path: &Path) -> PredictorResult<()> {
        write_json(path, self)?;
        log::info!("Training history saved to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> PredictorResult<Self> {
        read_json(path)
    }

    /// Loss (left) and accuracy (right) curves as a PNG.
    ///
    /// Training is blue, validation red, the kept epoch a green vertical
    /// line. The image carries no text.
    #[cfg(feature = "plot")]
    pub fn plot(&self, path: &Path) -> PredictorResult<()> {
        plot::render(self, path).map_err(|e| std::io::Error::other(e.to_string()))?;
        log::info!("Training curves saved to {}", path.display());
        Ok(())
    }
}

#[cfg(feature = "plot")]
mod plot {
    use plotters::coord::Shift;
    use plotters::prelude::*;
    use std::path::Path;

    use super::TrainingHistory;

    type DrawResult = Result<(), Box<dyn std::error::Error>>;

    pub fn render(history: &TrainingHistory, path: &Path) -> DrawResult {
        let root = BitMapBackend::new(path, (1200, 480)).into_drawing_area();
        root.fill(&WHITE)?;
        let (left, right) = root.split_horizontally(600);

        draw_panel(&left, &history.loss, &history.val_loss, history.best_epoch)?;
        draw_panel(&right, &history.accuracy, &history.val_accuracy, history.best_epoch)?;

        root.present()?;
        Ok(())
    }

    fn draw_panel(
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        train: &[f32],
        validation: &[f32],
        best_epoch: Option<usize>,
    ) -> DrawResult {
        let epochs = train.len().max(validation.len()).max(2);
        let y_max = train
            .iter()
            .chain(validation.iter())
            .cloned()
            .filter(|v| v.is_finite())
            .fold(0.0f32, f32::max)
            .max(1e-3)
            * 1.1;

        let mut chart = ChartBuilder::on(area)
            .margin(20)
            .build_cartesian_2d(0usize..epochs - 1, 0f32..y_max)?;

        // Frame and quarter gridlines
        chart.draw_series(std::iter::once(Rectangle::new(
            [(0, 0.0), (epochs - 1, y_max)],
            BLACK.stroke_width(1),
        )))?;
        for quarter in 1..4 {
            let y = y_max * quarter as f32 / 4.0;
            chart.draw_series(LineSeries::new(vec![(0, y), (epochs - 1, y)], BLACK.mix(0.15)))?;
        }

        if let Some(best) = best_epoch.filter(|&e| e < epochs) {
            chart.draw_series(LineSeries::new(vec![(best, 0.0), (best, y_max)], GREEN.stroke_width(1)))?;
        }

        chart.draw_series(LineSeries::new(series(train), BLUE.stroke_width(2)))?;
        if !validation.is_empty() {
            chart.draw_series(LineSeries::new(series(validation), RED.stroke_width(2)))?;
        }
        Ok(())
    }

    fn series(values: &[f32]) -> Vec<(usize, f32)> {
        values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, v)| (i, *v))
            .collect()
    }
}
