use std::fmt::{Display, Formatter};

/// One of the 26 lowercase letters a string graph can represent.
///
/// Characters outside this alphabet are not an error: building a graph from
/// a string containing one degrades the whole graph to `Max` instead.
///
/// # Examples
///
/// ```
/// use stringgraph_rs::alphabet::Letter;
///
/// let q = Letter::from_char('q').unwrap();
/// assert_eq!(q.as_char(), 'q');
/// assert_eq!(Letter::from_char('|'), None);
/// assert_eq!(Letter::from_char('Q'), None);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Letter(u8);

impl Letter {
    /// Map a `char` onto the alphabet, if it is supported.
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'a'..='z' => Some(Self(c as u8 - b'a')),
            _ => None,
        }
    }

    pub const fn as_char(self) -> char {
        (b'a' + self.0) as char
    }
}

impl Display for Letter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
