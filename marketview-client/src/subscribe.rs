//! Conversions for specifying which event kinds to subscribe to.

use crate::event::AppEventKind;

/// Trait for types that can be converted into a list of event kinds.
///
/// ```rust,ignore
/// hub.subscribe(AppEventKind::Removed.into_kinds()).await?;
/// hub.subscribe(AppEventKind::ALL.into_kinds()).await?;
/// ```
pub trait IntoEventKinds {
    /// Convert into a vector of kinds, dropping duplicates but keeping order.
    fn into_kinds(self) -> Vec<AppEventKind>;
}

fn dedup(kinds: impl IntoIterator<Item = AppEventKind>) -> Vec<AppEventKind> {
    let mut out: Vec<AppEventKind> = Vec::new();
    for kind in kinds {
        if !out.contains(&kind) {
            out.push(kind);
        }
    }
    out
}

impl IntoEventKinds for AppEventKind {
    fn into_kinds(self) -> Vec<AppEventKind> {
        vec![self]
    }
}

impl<const N: usize> IntoEventKinds for [AppEventKind; N] {
    fn into_kinds(self) -> Vec<AppEventKind> {
        dedup(self)
    }
}

impl IntoEventKinds for &[AppEventKind] {
    fn into_kinds(self) -> Vec<AppEventKind> {
        dedup(self.iter().copied())
    }
}

impl IntoEventKinds for Vec<AppEventKind> {
    fn into_kinds(self) -> Vec<AppEventKind> {
        dedup(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_kind() {
        assert_eq!(AppEventKind::Removed.into_kinds(), vec![AppEventKind::Removed]);
    }

    #[test]
    fn test_array_dedups() {
        let kinds = [AppEventKind::Added, AppEventKind::Removed, AppEventKind::Added].into_kinds();
        assert_eq!(kinds, vec![AppEventKind::Added, AppEventKind::Removed]);
    }

    #[test]
    fn test_all_kinds() {
        assert_eq!(AppEventKind::ALL.as_slice().into_kinds().len(), 4);
    }
}
