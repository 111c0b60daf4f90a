//! Checked identifier newtypes (§3's "ambient addition"): callers cannot
//! accidentally pass a player id where a table id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(TableId);
string_id!(PlayerId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_id_and_player_id_are_distinct_types() {
        let table_id = TableId::new("t1");
        let player_id = PlayerId::new("p1");
        assert_eq!(table_id.as_str(), "t1");
        assert_eq!(player_id.as_str(), "p1");
    }

    #[test]
    fn ids_compare_by_their_string_value() {
        assert_eq!(TableId::new("t1"), TableId::from("t1".to_string()));
        assert_ne!(TableId::new("t1"), TableId::new("t2"));
    }
}
