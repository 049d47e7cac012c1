use derive_more::Display;
use image::ImageFormat;
use serde::{Deserialize, Serialize};

/// Output format of rendered images.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    #[display("png")]
    Png,
    #[display("jpeg")]
    Jpeg,
}
impl Encoding {
    /// Quality used when encoding JPEG output.
    pub const JPEG_QUALITY: u8 = 90;
}
impl From<Encoding> for ImageFormat {
    fn from(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Png => ImageFormat::Png,
            Encoding::Jpeg => ImageFormat::Jpeg,
        }
    }
}
