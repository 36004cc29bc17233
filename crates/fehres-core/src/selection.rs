//! Library selection.
//!
//! Mirrors a selection control: an explicit choice must name an existing
//! library, and when nothing is chosen the first listed library is the
//! default. The API layer never applies this default on its own.

use crate::error::ValidationError;
use crate::models::Library;

/// Resolve the library a page should operate on.
///
/// Returns `Ok(None)` only when no library was requested and the backend
/// listed none.
pub fn resolve_library<'a>(
    libraries: &'a [Library],
    requested: Option<&str>,
) -> Result<Option<&'a Library>, ValidationError> {
    match requested {
        Some(name) => libraries
            .iter()
            .find(|lib| lib.name == name)
            .map(Some)
            .ok_or_else(|| ValidationError::UnknownLibrary {
                name: name.to_string(),
            }),
        None => Ok(libraries.first()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn libs() -> Vec<Library> {
        vec![
            Library {
                id: 3,
                name: "langchain".into(),
            },
            Library {
                id: 7,
                name: "tokio".into(),
            },
        ]
    }

    #[test]
    fn defaults_to_first() {
        let libs = libs();
        let selected = resolve_library(&libs, None).unwrap().unwrap();
        assert_eq!(selected.id, 3);
    }

    #[test]
    fn explicit_choice_wins() {
        let libs = libs();
        let selected = resolve_library(&libs, Some("tokio")).unwrap().unwrap();
        assert_eq!(selected.id, 7);
    }

    #[test]
    fn unknown_choice_is_rejected() {
        let libs = libs();
        let err = resolve_library(&libs, Some("nope")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownLibrary {
                name: "nope".into()
            }
        );
    }

    #[test]
    fn empty_listing_yields_none() {
        assert!(resolve_library(&[], None).unwrap().is_none());
    }
}
