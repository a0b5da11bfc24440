use std::fmt;

/// Canonical reaction triggers sent by the approve/disapprove buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Approve,
    Disapprove,
}

impl Trigger {
    pub const APPROVE: &'static str = "approve";
    pub const DISAPPROVE: &'static str = "disapprove";

    /// Recognise a trigger sentinel. Anything else is custom text.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            Self::APPROVE => Some(Trigger::Approve),
            Self::DISAPPROVE => Some(Trigger::Disapprove),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Approve => Self::APPROVE,
            Trigger::Disapprove => Self::DISAPPROVE,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
