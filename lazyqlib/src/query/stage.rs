//! Stage identifiers used to tag evaluation errors.

use std::fmt;

/// The operator a pipeline node implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Filter,
    Project,
    Join,
    GroupBy,
    OrderBy,
    Aggregate,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Filter => "filter",
            StageKind::Project => "project",
            StageKind::Join => "join",
            StageKind::GroupBy => "group_by",
            StageKind::OrderBy => "order_by",
            StageKind::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
