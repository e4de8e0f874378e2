//! QR code matrices, generated at render time.

use postcraft_core::element::DEFAULT_QR_URL;
use qrcode::{Color, EcLevel, QrCode};
use tracing::warn;

/// Square module grid, row-major, `true` for dark modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    width: usize,
    modules: Vec<bool>,
}

impl QrMatrix {
    /// Modules per side.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the module at (`x`, `y`) is dark. Out of range is light.
    #[must_use]
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }

    /// Number of dark modules.
    #[must_use]
    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|m| **m).count()
    }
}

/// The URL actually encoded: empty or unparsable input falls back to the
/// placeholder URL.
#[must_use]
pub fn effective_url(url: &str) -> &str {
    let trimmed = url.trim();
    if trimmed.is_empty() || url::Url::parse(trimmed).is_err() {
        DEFAULT_QR_URL
    } else {
        trimmed
    }
}

/// Encode `url` with high error correction.
///
/// Returns `None` when the encoder rejects the payload (e.g. too long); the
/// caller renders a placeholder instead.
#[must_use]
pub fn generate(url: &str) -> Option<QrMatrix> {
    let target = effective_url(url);
    match QrCode::with_error_correction_level(target.as_bytes(), EcLevel::H) {
        Ok(code) => Some(QrMatrix {
            width: code.width(),
            modules: code.to_colors().into_iter().map(|c| c == Color::Dark).collect(),
        }),
        Err(err) => {
            warn!("QR generation failed for {target}: {err}");
            None
        }
    }
}
