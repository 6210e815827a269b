use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Kind of edit event recorded in a page change log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Page created (`C`)
    Create,
    /// Regular edit (`E`)
    Edit,
    /// Minor edit (`e`)
    MinorEdit,
    /// Old revision restored (`R`)
    Restore,
    /// Page deleted (`D`)
    Delete,
}

impl ChangeType {
    /// The single-letter code used in `.changes` files
    pub fn code(&self) -> &'static str {
        match self {
            ChangeType::Create => "C",
            ChangeType::Edit => "E",
            ChangeType::MinorEdit => "e",
            ChangeType::Restore => "R",
            ChangeType::Delete => "D",
        }
    }

    /// Whether this event left a revision snapshot in the attic
    pub fn is_content_bearing(&self) -> bool {
        match self {
            ChangeType::Create | ChangeType::Edit | ChangeType::MinorEdit | ChangeType::Restore => {
                true
            }
            ChangeType::Delete => false,
        }
    }
}

impl FromStr for ChangeType {
    type Err = String;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code {
            "C" => Ok(ChangeType::Create),
            "E" => Ok(ChangeType::Edit),
            "e" => Ok(ChangeType::MinorEdit),
            "R" => Ok(ChangeType::Restore),
            "D" => Ok(ChangeType::Delete),
            other => Err(format!("invalid change type '{other}'")),
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
