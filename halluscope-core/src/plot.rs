//! Chart rendering for the attribution report.
//!
//! Two fixed outputs: a grouped bar chart of hallucination rate by prompt
//! type (one bar series per model), and a two-panel bar chart of PS by model
//! and MV by prompt type.

use crate::attribution::{AttributionReport, MvRow, PsRow, RateRow};
use crate::error::HarnessError;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

pub const HR_PLOT_FILE: &str = "hallucination_rate_by_prompt.png";
pub const PS_MV_PLOT_FILE: &str = "ps_mv_scores.png";

/// Render both chart files into `plot_dir`.
pub fn render_charts(report: &AttributionReport, plot_dir: &Path) -> Result<(), HarnessError> {
    let hr_path = plot_dir.join(HR_PLOT_FILE);
    draw_hr_chart(&report.rates, &hr_path)
        .map_err(|e| HarnessError::service(format!("failed to render {}: {e}", hr_path.display())))?;
    tracing::info!(path = %hr_path.display(), "saved hallucination rate chart");

    let ps_mv_path = plot_dir.join(PS_MV_PLOT_FILE);
    draw_ps_mv_chart(
        &report.prompt_sensitivity,
        &report.model_variability,
        &ps_mv_path,
    )
    .map_err(|e| {
        HarnessError::service(format!("failed to render {}: {e}", ps_mv_path.display()))
    })?;
    tracing::info!(path = %ps_mv_path.display(), "saved PS/MV chart");
    Ok(())
}

/// Distinct values in first-seen order. Rates arrive pre-sorted from the
/// analyzer, so first-seen order is already deterministic.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.iter().any(|s: &String| s == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

fn draw_hr_chart(rates: &[RateRow], path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let prompts = distinct(rates.iter().map(|r| r.prompt_type.as_str()));
    let models = distinct(rates.iter().map(|r| r.model.as_str()));

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let prompts_for_labels = prompts.clone();
    let mut chart = ChartBuilder::on(&root)
        .caption("Hallucination Rate by Prompt Type", ("sans-serif", 28))
        .margin(24)
        .x_label_area_size(48)
        .y_label_area_size(56)
        .build_cartesian_2d(0f64..prompts.len().max(1) as f64, 0f64..1.05f64)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(prompts.len().max(1))
        .x_label_formatter(&move |x| {
            prompts_for_labels
                .get(*x as usize)
                .cloned()
                .unwrap_or_default()
        })
        .x_desc("Prompt Type")
        .y_desc("Hallucination Rate")
        .draw()?;

    let bar_width = 0.8 / models.len().max(1) as f64;
    for (mi, model) in models.iter().enumerate() {
        let color = Palette99::pick(mi).mix(0.85);
        let prompts = &prompts;
        chart
            .draw_series(
                rates
                    .iter()
                    .filter(|r| &r.model == model)
                    .map(move |r| {
                        let pi = prompts
                            .iter()
                            .position(|p| p == &r.prompt_type)
                            .unwrap_or(0) as f64;
                        let x0 = pi + 0.1 + mi as f64 * bar_width;
                        Rectangle::new(
                            [(x0, 0.0), (x0 + bar_width, r.hallucination_rate)],
                            color.filled(),
                        )
                    }),
            )?
            .label(model.clone())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
            });
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn draw_ps_mv_chart(
    ps: &[PsRow],
    mv: &[MvRow],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (1200, 500)).into_drawing_area();
    root.fill(&WHITE)?;
    let (left, right) = root.split_horizontally(600);

    let ps_labels: Vec<String> = ps.iter().map(|p| p.model.clone()).collect();
    let ps_values: Vec<Option<f64>> = ps.iter().map(|p| p.ps_score).collect();
    draw_score_panel(&left, "Prompt Sensitivity (PS)", &ps_labels, &ps_values)?;

    let mv_labels: Vec<String> = mv.iter().map(|m| m.prompt_type.clone()).collect();
    let mv_values: Vec<Option<f64>> = mv.iter().map(|m| m.mv_score).collect();
    draw_score_panel(&right, "Model Variability (MV)", &mv_labels, &mv_values)?;

    root.present()?;
    Ok(())
}

/// One bar per label; undefined scores draw no bar but keep their label.
fn draw_score_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    labels: &[String],
    values: &[Option<f64>],
) -> Result<(), Box<dyn std::error::Error>> {
    let y_max = values
        .iter()
        .filter_map(|v| *v)
        .fold(0.0f64, f64::max)
        .max(0.1)
        * 1.2;

    let labels_for_axis: Vec<String> = labels.to_vec();
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(48)
        .y_label_area_size(56)
        .build_cartesian_2d(0f64..labels.len().max(1) as f64, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len().max(1))
        .x_label_formatter(&move |x| {
            labels_for_axis
                .get(*x as usize)
                .cloned()
                .unwrap_or_default()
        })
        .y_desc("Standard Deviation of HR")
        .draw()?;

    chart.draw_series(values.iter().enumerate().filter_map(|(i, value)| {
        value.map(|v| {
            let x0 = i as f64 + 0.2;
            Rectangle::new([(x0, 0.0), (x0 + 0.6, v)], BLUE.mix(0.7).filled())
        })
    }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::analyze;
    use crate::records::GenerationRecord;

    fn scored(model: &str, prompt_type: &str, score: u8) -> GenerationRecord {
        GenerationRecord {
            model: model.into(),
            prompt_type: prompt_type.into(),
            question: "q".into(),
            formatted_prompt: "f".into(),
            response: "r".into(),
            similarity_score: None,
            hallucination_score: Some(score),
        }
    }

    #[test]
    fn test_distinct_preserves_order() {
        let values = ["b", "a", "b", "c"];
        assert_eq!(distinct(values.into_iter()), vec!["b", "a", "c"]);
    }

    #[test]
    #[ignore = "renders PNGs; requires system fonts"]
    fn test_render_charts_writes_both_files() {
        let records = vec![
            scored("A", "X", 0),
            scored("A", "Y", 2),
            scored("B", "X", 1),
            scored("B", "Y", 0),
        ];
        let report = analyze(&records).unwrap();
        let dir = tempfile::tempdir().unwrap();
        render_charts(&report, dir.path()).unwrap();

        let hr = std::fs::metadata(dir.path().join(HR_PLOT_FILE)).unwrap();
        let ps_mv = std::fs::metadata(dir.path().join(PS_MV_PLOT_FILE)).unwrap();
        assert!(hr.len() > 0);
        assert!(ps_mv.len() > 0);
    }
}
