use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who an event or todo list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Person {
    Husband,
    Wife,
    Shared,
}

impl Person {
    pub const ALL: [Person; 3] = [Person::Husband, Person::Wife, Person::Shared];

    pub fn as_str(&self) -> &'static str {
        match self {
            Person::Husband => "husband",
            Person::Wife => "wife",
            Person::Shared => "shared",
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Person {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "husband" => Ok(Person::Husband),
            "wife" => Ok(Person::Wife),
            "shared" => Ok(Person::Shared),
            _ => Err(format!(
                "Invalid person '{}'. Valid options: husband, wife, shared",
                s
            )),
        }
    }
}
