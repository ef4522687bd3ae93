use std::fmt;

/// Binary risk outcome of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskLabel {
    Low,
    High,
}

impl RiskLabel {
    /// Map a classifier class label to a risk label. Only 0 and 1 are valid.
    pub fn from_class(class: i64) -> Option<Self> {
        match class {
            0 => Some(Self::Low),
            1 => Some(Self::High),
            _ => None,
        }
    }

    /// Text shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Low => "Low risk of cardiovascular disease",
            Self::High => "High risk of cardiovascular disease",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
