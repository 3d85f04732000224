use serde::{Deserialize, Serialize};

/// How a URI was reached from its referrer
///
/// One character per hop accumulates in a CrawlURI's `path_from_seed`, so
/// the whole discovery path reads as a string like `"LLRE"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hop {
    /// Ordinary navigational link
    Link,
    /// Embedded resource (image, stylesheet, script)
    Embed,
    /// HTTP redirect
    Redirect,
    /// Speculative embed extracted from script/CSS text
    SpeculativeEmbed,
    /// Precondition fetch (DNS, robots.txt) required before the referrer
    Precondition,
}

impl Hop {
    /// The single character recorded in `path_from_seed`
    pub fn as_char(&self) -> char {
        match self {
            Hop::Link => 'L',
            Hop::Embed => 'E',
            Hop::Redirect => 'R',
            Hop::SpeculativeEmbed => 'X',
            Hop::Precondition => 'P',
        }
    }

    /// Parses a hop-path character
    pub fn from_char(c: char) -> Option<Hop> {
        match c {
            'L' => Some(Hop::Link),
            'E' => Some(Hop::Embed),
            'R' => Some(Hop::Redirect),
            'X' => Some(Hop::SpeculativeEmbed),
            'P' => Some(Hop::Precondition),
            _ => None,
        }
    }
}

/// Coarse priority class carried on a CrawlURI
///
/// Variant order doubles as priority order: `High` sorts before `Low`.
/// Within one work queue, directive is consulted before the breadth-first
/// ordinal tiebreak.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum SchedulingDirective {
    High,
    Medium,
    #[default]
    Normal,
    Low,
}
