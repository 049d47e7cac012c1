use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Non-destructive edits applied to an original image.
///
/// Parameters left out of the persisted form default to "no adjustment".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Exposure adjustment in stops (-5.0 to +5.0).
    pub exposure: f32,
    /// Contrast adjustment (-100.0 to +100.0).
    pub contrast: f32,
    /// Saturation adjustment (-100.0 to +100.0); -100.0 is grayscale.
    pub saturation: f32,
}

impl Transform {
    pub const EXPOSURE_RANGE: f32 = 5.0;
    pub const PERCENT_RANGE: f32 = 100.0;

    /// Reconstruct a transform from its persisted form, a plain mapping
    /// (stored as `darkroom_storage::TransformMap`).
    ///
    /// An empty mapping is the persisted form of "no transform" and yields
    /// `None`.
    pub fn from_persisted(map: &Map<String, Value>) -> Result<Option<Self>> {
        if map.is_empty() {
            return Ok(None);
        }
        let transform: Self = serde_json::from_value(Value::Object(map.clone()))
            .or_raise(|| ErrorKind::InvalidTransform("unexpected parameter type"))?;
        transform.validate()?;
        Ok(Some(transform))
    }

    /// Project the transform into its persisted form.
    pub fn to_persisted(&self) -> Result<Map<String, Value>> {
        self.validate()?;
        match serde_json::to_value(self).or_raise(|| ErrorKind::InvalidTransform("not serializable"))? {
            Value::Object(map) => Ok(map),
            _ => exn::bail!(ErrorKind::InvalidTransform("not a mapping")),
        }
    }

    /// Check every parameter is finite and within its documented range.
    pub fn validate(&self) -> Result<()> {
        if !self.exposure.is_finite() || self.exposure.abs() > Self::EXPOSURE_RANGE {
            exn::bail!(ErrorKind::InvalidTransform("exposure"));
        }
        if !self.contrast.is_finite() || self.contrast.abs() > Self::PERCENT_RANGE {
            exn::bail!(ErrorKind::InvalidTransform("contrast"));
        }
        if !self.saturation.is_finite() || self.saturation.abs() > Self::PERCENT_RANGE {
            exn::bail!(ErrorKind::InvalidTransform("saturation"));
        }
        Ok(())
    }

    /// `true` when applying the transform leaves every pixel untouched.
    pub fn is_identity(&self) -> bool {
        self.exposure == 0.0 && self.contrast == 0.0 && self.saturation == 0.0
    }

    /// Apply the adjustments to a single RGB triple (channels in `0.0..=1.0`).
    pub(crate) fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let gain = self.exposure.exp2();
        let contrast = 1.0 + self.contrast / Self::PERCENT_RANGE;
        let saturation = 1.0 + self.saturation / Self::PERCENT_RANGE;
        let [r, g, b] = rgb.map(|c| (c * gain - 0.5) * contrast + 0.5);
        // Rec. 709 luma
        let luma = 0.2126 * r + 0.7152 * g + 0.0722 * b;
        [r, g, b].map(|c| (luma + (c - luma) * saturation).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be an object"),
        }
    }

    #[test]
    fn test_empty_mapping_is_no_transform() {
        assert_eq!(Transform::from_persisted(&Map::new()).unwrap(), None);
    }

    #[rstest]
    #[case(json!({"exposure": 1.5}), Transform { exposure: 1.5, ..Transform::default() })]
    #[case(json!({"contrast": -20.0, "saturation": 30}), Transform { contrast: -20.0, saturation: 30.0, ..Transform::default() })]
    #[case(json!({"exposure": 0.0, "contrast": 0.0, "saturation": 0.0}), Transform::default())]
    fn test_from_persisted(#[case] persisted: Value, #[case] expected: Transform) {
        assert_eq!(Transform::from_persisted(&map(persisted)).unwrap(), Some(expected));
    }

    #[rstest]
    #[case(json!({"exposure": "bright"}))]
    #[case(json!({"exposure": 6.0}))]
    #[case(json!({"contrast": -101.0}))]
    #[case(json!({"saturation": 250}))]
    fn test_from_persisted_invalid(#[case] persisted: Value) {
        let err = Transform::from_persisted(&map(persisted)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidTransform(_)));
    }

    #[test]
    fn test_persisted_form_round_trips() {
        let transform = Transform { exposure: 0.1, contrast: 12.5, saturation: -100.0 };
        let persisted = transform.to_persisted().unwrap();
        assert_eq!(persisted.len(), 3);
        assert_eq!(Transform::from_persisted(&persisted).unwrap(), Some(transform));
    }

    #[test]
    fn test_to_persisted_rejects_nan() {
        let transform = Transform { exposure: f32::NAN, ..Transform::default() };
        assert!(transform.to_persisted().is_err());
    }

    #[test]
    fn test_identity_apply() {
        let rgb = [0.25, 0.5, 0.75];
        let out = Transform::default().apply(rgb);
        for (a, b) in rgb.iter().zip(out) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_full_desaturation_is_grey() {
        let [r, g, b] = Transform { saturation: -100.0, ..Transform::default() }.apply([1.0, 0.0, 0.0]);
        assert!((r - g).abs() < 1e-6 && (g - b).abs() < 1e-6);
    }
}
