use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which dataset a report covers. The row shape depends on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    #[default]
    Sales,
    Registration,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Sales => "SALES",
            DataType::Registration => "REGISTRATION",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SALES" => Ok(DataType::Sales),
            "REGISTRATION" => Ok(DataType::Registration),
            _ => Err(()),
        }
    }
}
