use std::collections::BTreeSet;

/// Attach/detach delta between the relations Keycloak has and the ones wanted.
///
/// Callers apply `to_detach` before `to_attach`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDiff<T> {
    pub to_detach: Vec<T>,
    pub to_attach: Vec<T>,
}

impl<T: Ord + Clone> RelationDiff<T> {
    pub fn compute<C, D>(current: C, desired: D) -> Self
    where
        C: IntoIterator<Item = T>,
        D: IntoIterator<Item = T>,
    {
        let current: BTreeSet<T> = current.into_iter().collect();
        let desired: BTreeSet<T> = desired.into_iter().collect();

        Self {
            to_detach: current.difference(&desired).cloned().collect(),
            to_attach: desired.difference(&current).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_detach.is_empty() && self.to_attach.is_empty()
    }
}
