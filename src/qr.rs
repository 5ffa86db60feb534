use anyhow::{Context, Result};
use qrcode::render::unicode;
use qrcode::QrCode;

/// Renders `content` as a QR code built from unicode half-blocks, suitable
/// for printing straight to a terminal.
pub fn render_terminal(content: &str) -> Result<String> {
    let code = QrCode::new(content.as_bytes()).context("Failed to encode QR code")?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .quiet_zone(false)
        .build())
}
