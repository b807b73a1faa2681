//! Authorization scheme tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Discriminant of an authorization configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheme {
    #[serde(rename = "BASIC")]
    Basic,
    #[serde(rename = "BEARER")]
    Bearer,
    #[serde(rename = "OAUTH1")]
    OAuth1,
    #[serde(rename = "OAUTH2")]
    OAuth2,
    #[serde(rename = "INHERIT_FROM_PARENT")]
    InheritFromParent,
}

impl Scheme {
    /// All registered schemes, in declaration order.
    pub const ALL: [Scheme; 5] = [
        Scheme::Basic,
        Scheme::Bearer,
        Scheme::OAuth1,
        Scheme::OAuth2,
        Scheme::InheritFromParent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Basic => "BASIC",
            Scheme::Bearer => "BEARER",
            Scheme::OAuth1 => "OAUTH1",
            Scheme::OAuth2 => "OAUTH2",
            Scheme::InheritFromParent => "INHERIT_FROM_PARENT",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scheme::ALL
            .into_iter()
            .find(|scheme| scheme.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Configuration(format!("unknown authorization scheme: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_display() {
        for scheme in Scheme::ALL {
            assert_eq!(scheme.to_string().parse::<Scheme>().unwrap(), scheme);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("oauth2".parse::<Scheme>().unwrap(), Scheme::OAuth2);
        assert_eq!(
            " inherit_from_parent ".parse::<Scheme>().unwrap(),
            Scheme::InheritFromParent
        );
    }

    #[test]
    fn test_unknown_scheme_is_configuration_error() {
        let err = "DIGEST".parse::<Scheme>().unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_serde_uses_wire_tags() {
        let json = serde_json::to_string(&Scheme::InheritFromParent).unwrap();
        assert_eq!(json, "\"INHERIT_FROM_PARENT\"");
        let parsed: Scheme = serde_json::from_str("\"OAUTH1\"").unwrap();
        assert_eq!(parsed, Scheme::OAuth1);
    }
}
