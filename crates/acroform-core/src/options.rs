//! Tunable thresholds for detection, filling and transcripts.
//!
//! All distances are in PDF user-space units (1/72 inch).

/// Widgets whose width and height are both below this are treated as
/// checkboxes when a synthesized button widget has to be typed.
pub const CHECKBOX_MAX_SIZE: f64 = 30.0;

/// Options controlling field detection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectOptions {
    /// How far left of a field the nearby-label search reaches (default: 250).
    pub label_search_left: f64,
    /// How far above and below a field the nearby-label search reaches (default: 20).
    pub label_search_vertical: f64,
    /// Vertical distances closer than this rank as ties, broken by
    /// horizontal distance (default: 5).
    pub label_tie_band: f64,
    /// A runner-up fragment within this many units of the best one is
    /// joined to it as a second label line (default: 15).
    pub label_second_line_band: f64,
    /// Fields whose Y differs by less than this sort as one line (default: 10).
    pub line_tolerance: f64,
    /// Size cutoff for typing synthesized button widgets as checkboxes (default: 30).
    pub checkbox_max_size: f64,
    /// Maximum depth of the field tree walk, guarding against cycles (default: 64).
    pub max_field_depth: usize,
    /// Maximum nesting of form XObjects followed while reading page text (default: 8).
    pub max_xobject_depth: usize,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            label_search_left: 250.0,
            label_search_vertical: 20.0,
            label_tie_band: 5.0,
            label_second_line_band: 15.0,
            line_tolerance: 10.0,
            checkbox_max_size: CHECKBOX_MAX_SIZE,
            max_field_depth: 64,
            max_xobject_depth: 8,
        }
    }
}

/// Options controlling form filling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FillOptions {
    /// Bake values into page content and drop interactivity (default: false).
    pub flatten: bool,
}

impl FillOptions {
    pub fn flattened() -> Self {
        Self { flatten: true }
    }
}

/// Counters reported by one fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FillReport {
    /// Fields that received a value.
    pub filled: usize,
    /// Fields left untouched: no value given, or an empty choice.
    pub skipped: usize,
    /// Fields whose write failed.
    pub failed: usize,
}

/// Options controlling page transcripts.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TranscriptOptions {
    /// Text runs closer than this vertically join one line (default: 10).
    ///
    /// Independent of [`DetectOptions::label_second_line_band`].
    pub line_tolerance: f64,
    /// Gap, in units, above which adjacent runs on a line are separated by
    /// a space (default: 1).
    pub word_gap: f64,
}

impl Default for TranscriptOptions {
    fn default() -> Self {
        Self {
            line_tolerance: 10.0,
            word_gap: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_defaults() {
        let opts = DetectOptions::default();
        assert_eq!(opts.label_search_left, 250.0);
        assert_eq!(opts.label_search_vertical, 20.0);
        assert_eq!(opts.label_tie_band, 5.0);
        assert_eq!(opts.label_second_line_band, 15.0);
        assert_eq!(opts.line_tolerance, 10.0);
        assert_eq!(opts.checkbox_max_size, CHECKBOX_MAX_SIZE);
    }

    #[test]
    fn fill_defaults_keep_form_interactive() {
        assert!(!FillOptions::default().flatten);
        assert!(FillOptions::flattened().flatten);
    }

    #[test]
    fn transcript_tolerance_is_independent() {
        let transcript = TranscriptOptions {
            line_tolerance: 4.0,
            ..TranscriptOptions::default()
        };
        assert_eq!(transcript.line_tolerance, 4.0);
        assert_eq!(DetectOptions::default().label_second_line_band, 15.0);
    }
}
