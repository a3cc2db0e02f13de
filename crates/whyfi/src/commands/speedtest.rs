//! Speed test command handler.

use whyfi_core::{Monitor, SpeedTestResult};

use crate::cli::GlobalOpts;
use crate::commands::spinner;
use crate::error::CliError;
use crate::output::{self, Painter};

/// Run one throughput test through the monitor, behind a spinner.
pub async fn measure(monitor: &Monitor, global: &GlobalOpts) -> SpeedTestResult {
    let bar = spinner("Measuring throughput and responsiveness...", global);
    let result = monitor
        .run_speed_test()
        .await
        .unwrap_or_else(SpeedTestResult::already_running);
    bar.finish_and_clear();
    result
}

pub async fn handle(monitor: &Monitor, global: &GlobalOpts) -> Result<(), CliError> {
    let result = measure(monitor, global).await;
    if let Some(error) = &result.error {
        return Err(CliError::SpeedTest {
            message: error.to_string(),
        });
    }

    let painter = Painter::new(global.color);
    let out = output::render_single(global.output, &result, |r| detail(r, painter))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn detail(result: &SpeedTestResult, painter: Painter) -> String {
    if let Some(error) = &result.error {
        return output::render_pairs(&[("Error", error.to_string())]);
    }
    let bufferbloat = if result.has_bufferbloat() {
        painter.warn("Yes")
    } else {
        "No".into()
    };
    output::render_pairs(&[
        ("Download", format!("{:.1} Mbps", result.download_mbps)),
        ("Upload", format!("{:.1} Mbps", result.upload_mbps)),
        (
            "Responsiveness",
            format!(
                "{} RPM ({})",
                result.responsiveness_rpm,
                result.responsiveness_class()
            ),
        ),
        ("Idle latency", output::fmt_ms(Some(result.idle_latency_ms))),
        (
            "Loaded latency",
            format!(
                "{} down / {} up",
                output::fmt_ms(Some(result.download_latency_ms)),
                output::fmt_ms(Some(result.upload_latency_ms))
            ),
        ),
        ("Bufferbloat", bufferbloat),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ColorMode;
    use whyfi_core::SpeedTestError;

    #[test]
    fn detail_lists_figures() {
        let result = SpeedTestResult {
            download_mbps: 512.3,
            upload_mbps: 40.0,
            responsiveness_rpm: 240,
            idle_latency_ms: 18.5,
            download_latency_ms: 100.0,
            upload_latency_ms: 250.0,
            error: None,
        };
        let text = detail(&result, Painter::new(ColorMode::Never));
        assert!(text.contains("512.3 Mbps"));
        assert!(text.contains("240 RPM (Medium)"));
        assert!(text.contains("Bufferbloat"));
        assert!(text.contains("Yes"));
    }

    #[test]
    fn detail_shows_error_message() {
        let text = detail(
            &SpeedTestResult::failed(SpeedTestError::NetworkUnavailable),
            Painter::new(ColorMode::Never),
        );
        assert!(text.contains("Network unavailable"));
    }
}
