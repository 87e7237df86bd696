use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GadgetSpecError>;

/// A single problem found while tokenizing the raw document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Byte offset into the raw input where the problem was noticed.
    pub position: u64,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn new(position: u64, message: impl Into<String>) -> Self {
        Diagnostic {
            position,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {}: {}", self.position, self.message)
    }
}

/// Every way a gadget definition can be rejected.
///
/// Parsing is all-or-nothing: any of these aborts the call and no partial spec is returned.
#[derive(Debug, Error)]
pub enum GadgetSpecError {
    #[error("Error parsing gadget xml:\n{}", render_diagnostics(.diagnostics))]
    Syntax { diagnostics: Vec<Diagnostic> },

    #[error("document of {size} bytes exceeds the configured limit of {limit} bytes")]
    DocumentTooLarge { size: usize, limit: usize },

    #[error("Missing ModulePrefs block")]
    MissingModulePrefs,

    #[error("More than one ModulePrefs block found ({count})")]
    DuplicateModulePrefs { count: usize },

    #[error("A gadget can only have one Icon element ({count} found)")]
    DuplicateIcon { count: usize },

    #[error("A gadget needs to have at least one view")]
    NoViews,

    #[error("Malformed <Content> href value: url view `{views}` has no href")]
    MalformedContentHref { views: String },
}

impl GadgetSpecError {
    /// The diagnostic messages carried by this failure.
    ///
    /// Syntax failures yield one message per collected diagnostic, everything else yields its
    /// display string.
    pub fn messages(&self) -> Vec<String> {
        match self {
            GadgetSpecError::Syntax { diagnostics } => {
                diagnostics.iter().map(|d| d.to_string()).collect()
            }
            other => vec![other.to_string()],
        }
    }

    pub fn is_syntax_error(&self) -> bool {
        matches!(self, GadgetSpecError::Syntax { .. })
    }
}

fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("{d} \n"))
        .collect::<Vec<_>>()
        .concat()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_syntax_error_lists_every_diagnostic() {
        let err = GadgetSpecError::Syntax {
            diagnostics: vec![
                Diagnostic::new(3, "first"),
                Diagnostic::new(10, "second"),
            ],
        };

        assert_eq!(
            err.messages(),
            vec!["offset 3: first".to_string(), "offset 10: second".to_string()]
        );

        let rendered = err.to_string();
        assert!(rendered.contains("offset 3: first"));
        assert!(rendered.contains("offset 10: second"));
        assert!(err.is_syntax_error());
    }

    #[test]
    fn test_structural_error_has_single_message() {
        let err = GadgetSpecError::DuplicateModulePrefs { count: 2 };
        assert_eq!(err.messages().len(), 1);
        assert!(!err.is_syntax_error());
    }
}
