use std::fmt;
use std::str::FromStr;
use tokio::sync::watch;

/// Opacity steps offered for the overlay texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BlendIntensity {
    /// 0.2
    Light,
    /// 0.4
    #[default]
    Medium,
    /// 0.7
    Strong,
}

impl BlendIntensity {
    pub const ALL: [BlendIntensity; 3] = [
        BlendIntensity::Light,
        BlendIntensity::Medium,
        BlendIntensity::Strong,
    ];

    pub fn opacity(self) -> f32 {
        match self {
            BlendIntensity::Light => 0.2,
            BlendIntensity::Medium => 0.4,
            BlendIntensity::Strong => 0.7,
        }
    }
}

impl fmt::Display for BlendIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opacity())
    }
}

impl FromStr for BlendIntensity {
    type Err = String;

    /// Accepts either the opacity (`0.4`) or the step name (`medium`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(value) = s.parse::<f32>() {
            return Self::ALL
                .into_iter()
                .find(|i| (i.opacity() - value).abs() < 1e-3)
                .ok_or_else(|| format!("unsupported intensity {value}; use 0.2, 0.4 or 0.7"));
        }
        <Self as clap::ValueEnum>::from_str(s, true)
    }
}

/// What the overlay paints: which texture, and how strongly.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSelection {
    pub texture_id: String,
    pub intensity: BlendIntensity,
}

impl TextureSelection {
    pub fn new(texture_id: impl Into<String>, intensity: BlendIntensity) -> Self {
        Self {
            texture_id: texture_id.into(),
            intensity,
        }
    }
}

/// Latest-value cell for the selection.
///
/// The UI is the only writer; the frame loop reads a fresh copy at the top of
/// every pass. Updates replace the whole value under the channel lock, so a
/// reader never sees a half-applied change.
pub struct SelectionCell {
    tx: watch::Sender<TextureSelection>,
}

impl SelectionCell {
    pub fn new(initial: TextureSelection) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn latest(&self) -> TextureSelection {
        self.tx.borrow().clone()
    }

    pub fn select_texture(&self, texture_id: impl Into<String>) {
        let texture_id = texture_id.into();
        self.tx.send_modify(|selection| selection.texture_id = texture_id);
    }

    pub fn set_intensity(&self, intensity: BlendIntensity) {
        self.tx.send_modify(|selection| selection.intensity = intensity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::light("0.2", BlendIntensity::Light)]
    #[case::medium("0.4", BlendIntensity::Medium)]
    #[case::strong("0.7", BlendIntensity::Strong)]
    #[case::by_name("strong", BlendIntensity::Strong)]
    #[case::padded(" 0.20 ", BlendIntensity::Light)]
    fn test_parse_intensity(#[case] input: &str, #[case] expected: BlendIntensity) {
        assert_eq!(input.parse::<BlendIntensity>().unwrap(), expected);
    }

    #[rstest]
    #[case::off_grid("0.5")]
    #[case::unknown("max")]
    fn test_parse_intensity_rejects(#[case] input: &str) {
        assert!(input.parse::<BlendIntensity>().is_err());
    }

    #[test]
    fn test_default_intensity_is_medium() {
        assert_eq!(BlendIntensity::default().opacity(), 0.4);
    }

    #[test]
    fn test_latest_reflects_every_write() {
        let cell = SelectionCell::new(TextureSelection::new("iris1", BlendIntensity::Medium));
        cell.select_texture("iris2");
        assert_eq!(cell.latest().texture_id, "iris2");
        cell.set_intensity(BlendIntensity::Strong);
        assert_eq!(
            cell.latest(),
            TextureSelection::new("iris2", BlendIntensity::Strong)
        );
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_writes() {
        let cell = SelectionCell::new(TextureSelection::new("iris1", BlendIntensity::Light));
        let snapshot = cell.latest();
        cell.select_texture("iris3");
        assert_eq!(snapshot.texture_id, "iris1");
    }

    #[test]
    fn test_intensity_change_keeps_texture() {
        let cell = SelectionCell::new(TextureSelection::new("iris1", BlendIntensity::Light));
        cell.set_intensity(BlendIntensity::Medium);
        assert_eq!(
            cell.latest(),
            TextureSelection::new("iris1", BlendIntensity::Medium)
        );
    }
}
