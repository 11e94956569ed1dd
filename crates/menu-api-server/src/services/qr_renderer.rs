use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

use super::artifact_sync::ArtifactError;
use crate::config::QrConfig;

pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Renders text payloads into PNG QR codes. Output is deterministic for a
/// given payload and settings.
#[derive(Debug, Clone)]
pub struct QrRenderer {
    ec_level: EcLevel,
    module_size: u32,
}

impl QrRenderer {
    pub fn new(ec_level: EcLevel, module_size: u32) -> Self {
        Self {
            ec_level,
            module_size: module_size.max(1),
        }
    }

    pub fn from_config(config: &QrConfig) -> Result<Self, ArtifactError> {
        let ec_level = parse_ec_level(&config.error_correction)?;
        Ok(Self::new(ec_level, config.module_size))
    }

    pub fn render(&self, payload: &str) -> Result<Vec<u8>, ArtifactError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.ec_level)
            .map_err(|e| ArtifactError::Encoding(format!("{} ({} bytes)", e, payload.len())))?;

        let image = code
            .render::<Luma<u8>>()
            .quiet_zone(true)
            .module_dimensions(self.module_size, self.module_size)
            .build();

        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| ArtifactError::Encoding(e.to_string()))?;

        Ok(buffer.into_inner())
    }
}

impl Default for QrRenderer {
    fn default() -> Self {
        Self::new(EcLevel::M, 4)
    }
}

fn parse_ec_level(level: &str) -> Result<EcLevel, ArtifactError> {
    match level.trim().to_ascii_uppercase().as_str() {
        "L" => Ok(EcLevel::L),
        "M" => Ok(EcLevel::M),
        "Q" => Ok(EcLevel::Q),
        "H" => Ok(EcLevel::H),
        other => Err(ArtifactError::Encoding(format!(
            "unknown error correction level: {}",
            other
        ))),
    }
}
