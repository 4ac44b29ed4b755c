use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    /// Absolute API reference with a trailing `#name` anchor. The leading greedy
    /// `.*` selects the rightmost `/api/<type>` segment and the second one the
    /// fragment after the last `#`.
    static ref ABSOLUTE_REF: Regex = Regex::new(r"^.*/api/(\w+).*#(.*)").unwrap();

    /// Portable reference produced by `rewrite_reference`
    static ref PORTABLE_REF: Regex = Regex::new(r"^/api/(\w+)/\?name=(.*)$").unwrap();
}

/// Location and identity independent reference: `/api/<type>/?name=<anchor>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortableReference {
    pub object_type: String,
    pub anchor: String,
}

impl PortableReference {
    /// Recognize a string already in portable form
    pub fn parse(value: &str) -> Option<Self> {
        let caps = PORTABLE_REF.captures(value)?;
        Some(Self {
            object_type: caps[1].to_string(),
            anchor: caps[2].to_string(),
        })
    }

    /// Path portion preceding the anchor, e.g. `/api/pool/?name=`
    pub fn path_prefix(&self) -> String {
        format!("/api/{}/?name=", self.object_type)
    }
}

impl fmt::Display for PortableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.path_prefix(), self.anchor)
    }
}

/// Match an absolute reference carrying an anchor fragment
pub fn match_reference(value: &str) -> Option<PortableReference> {
    let caps = ABSOLUTE_REF.captures(value)?;
    Some(PortableReference {
        object_type: caps[1].to_string(),
        anchor: caps[2].to_string(),
    })
}

/// Rewrite `value` into portable form, or return it unchanged when it is not
/// an anchored API reference.
pub fn rewrite_reference(value: &str) -> String {
    match match_reference(value) {
        Some(reference) => reference.to_string(),
        None => value.to_string(),
    }
}
