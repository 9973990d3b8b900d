//! Container frames and path rendering shared by the reader and writer.
//!
//! Both sides keep a stack of [`JsonPosition`] frames plus the frame for the
//! innermost open container; the derived path string is rebuilt from the
//! live frames on demand so it always reflects the current position.

use std::fmt::Write as _;

/// Kind of an open container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContainerKind {
    Object,
    Array,
    Constructor,
}

impl ContainerKind {
    pub(crate) fn name(self) -> &'static str {
        match self {
            ContainerKind::Object => "Object",
            ContainerKind::Array => "Array",
            ContainerKind::Constructor => "Constructor",
        }
    }
}

/// One open container frame.
///
/// `index` is the zero-based slot of the last value started inside an array
/// or constructor frame; `None` until the first value starts.
/// `property_name` is the last property name seen inside an object frame.
#[derive(Debug, Clone)]
pub(crate) struct JsonPosition {
    pub(crate) kind: ContainerKind,
    pub(crate) index: Option<usize>,
    pub(crate) property_name: Option<String>,
}

impl JsonPosition {
    pub(crate) fn new(kind: ContainerKind) -> Self {
        Self {
            kind,
            index: None,
            property_name: None,
        }
    }

    /// Record that a value has started in this frame.
    pub(crate) fn value_started(&mut self) {
        if matches!(self.kind, ContainerKind::Array | ContainerKind::Constructor) {
            self.index = Some(self.index.map_or(0, |i| i + 1));
        }
    }

    fn write_to(&self, out: &mut String) {
        match self.kind {
            ContainerKind::Object => {
                if let Some(name) = &self.property_name {
                    if name_needs_brackets(name) {
                        out.push_str("['");
                        for ch in name.chars() {
                            match ch {
                                '\\' => out.push_str("\\\\"),
                                '\'' => out.push_str("\\'"),
                                _ => out.push(ch),
                            }
                        }
                        out.push_str("']");
                    } else {
                        if !out.is_empty() {
                            out.push('.');
                        }
                        out.push_str(name);
                    }
                }
            }
            ContainerKind::Array | ContainerKind::Constructor => {
                if let Some(index) = self.index {
                    let _ = write!(out, "[{index}]");
                }
            }
        }
    }
}

// Names containing any of these switch from dotted to bracketed form.
fn name_needs_brackets(name: &str) -> bool {
    name.chars().any(|c| {
        matches!(
            c,
            '.' | ' '
                | '\''
                | '/'
                | '"'
                | '['
                | ']'
                | '('
                | ')'
                | '\t'
                | '\n'
                | '\r'
                | '\u{c}'
                | '\u{8}'
                | '\\'
                | '\u{85}'
                | '\u{2028}'
                | '\u{2029}'
        )
    })
}

/// Render the breadcrumb for the given frames, innermost last.
pub(crate) fn build_path<'a>(frames: impl IntoIterator<Item = &'a JsonPosition>) -> String {
    let mut out = String::new();
    for frame in frames {
        frame.write_to(&mut out);
    }
    out
}
