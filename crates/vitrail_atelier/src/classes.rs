//! Class attribute reconciliation.
//!
//! A component type manages part of its node's `class` attribute: the classes
//! it always needs (`required`) and a few option families, each a set of
//! mutually exclusive variants such as shadow depth or color. Everything else
//! in the attribute belongs to the user and survives every reconciliation.

use std::fmt;

use vitrail_carton::{CompactString, SmallVec};

/// Ordered set of class names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ClassList {
    classes: SmallVec<[CompactString; 8]>,
}

impl ClassList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `class` attribute value. Duplicates are dropped.
    pub fn parse(attribute: &str) -> Self {
        attribute.split_ascii_whitespace().collect()
    }

    /// Add `class` at the end. Returns `false` if it was already present or blank.
    pub fn insert(&mut self, class: &str) -> bool {
        let class = class.trim();
        if class.is_empty() || self.contains(class) {
            return false;
        }
        self.classes.push(CompactString::from(class));
        true
    }

    pub fn remove(&mut self, class: &str) -> bool {
        match self.classes.iter().position(|c| c == class) {
            Some(index) => {
                self.classes.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(CompactString::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Render back to a `class` attribute value.
    pub fn to_attribute(&self) -> String {
        self.iter().collect::<Vec<_>>().join(" ")
    }
}

impl<'a> FromIterator<&'a str> for ClassList {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut list = ClassList::new();
        for class in iter {
            list.insert(class);
        }
        list
    }
}

impl fmt::Display for ClassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_attribute())
    }
}

/// Error type for class spec construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassSpecError {
    #[error("class '{class}' is both required and a member of option family {family}")]
    RequiredInFamily { class: CompactString, family: usize },

    #[error("class '{class}' belongs to option families {first} and {second}")]
    AmbiguousClass {
        class: CompactString,
        first: usize,
        second: usize,
    },
}

/// The classes a component type manages on its node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedClassSpec {
    required: ClassList,
    families: Vec<ClassList>,
}

impl ManagedClassSpec {
    /// Build a spec, rejecting any class claimed twice.
    pub fn new(required: ClassList, families: Vec<ClassList>) -> Result<Self, ClassSpecError> {
        for (index, family) in families.iter().enumerate() {
            for class in family.iter() {
                if required.contains(class) {
                    return Err(ClassSpecError::RequiredInFamily {
                        class: class.into(),
                        family: index,
                    });
                }
                if let Some(other) = families[index + 1..]
                    .iter()
                    .position(|later| later.contains(class))
                {
                    return Err(ClassSpecError::AmbiguousClass {
                        class: class.into(),
                        first: index,
                        second: index + 1 + other,
                    });
                }
            }
        }
        Ok(Self { required, families })
    }

    /// Convenience constructor from string slices.
    pub fn from_slices(required: &[&str], families: &[&[&str]]) -> Result<Self, ClassSpecError> {
        Self::new(
            required.iter().copied().collect(),
            families
                .iter()
                .map(|family| family.iter().copied().collect())
                .collect(),
        )
    }

    pub fn required(&self) -> &ClassList {
        &self.required
    }

    pub fn families(&self) -> &[ClassList] {
        &self.families
    }

    pub fn family(&self, index: usize) -> Option<&ClassList> {
        self.families.get(index)
    }

    /// Index of the family `class` belongs to.
    pub fn family_of(&self, class: &str) -> Option<usize> {
        self.families.iter().position(|family| family.contains(class))
    }

    pub fn is_managed(&self, class: &str) -> bool {
        self.required.contains(class) || self.family_of(class).is_some()
    }

    /// Compute the next class list from `current` and the active selections.
    pub fn reconcile<S: AsRef<str>>(&self, current: &ClassList, selections: &[S]) -> ClassList {
        reconcile(current, self, selections)
    }
}

/// Compute the next class list for a component.
///
/// The result lists the user's classes first (original order), then the
/// required classes, then the active selections. Empty selections contribute
/// nothing. A selection may hold several whitespace separated classes; a
/// selection outside every family passes through verbatim. When two
/// selections name members of the same family only the first one is applied.
///
/// Selections are never counted as user classes, which makes the operation
/// idempotent: feeding the result back in with the same arguments yields the
/// same list.
pub fn reconcile<S: AsRef<str>>(
    current: &ClassList,
    spec: &ManagedClassSpec,
    selections: &[S],
) -> ClassList {
    let active: SmallVec<[&str; 8]> = selections
        .iter()
        .flat_map(|selection| selection.as_ref().split_ascii_whitespace())
        .collect();

    let mut next = ClassList::new();
    for class in current.iter() {
        if !spec.is_managed(class) && !active.contains(&class) {
            next.insert(class);
        }
    }
    for class in spec.required.iter() {
        next.insert(class);
    }

    let mut claimed: SmallVec<[usize; 4]> = SmallVec::new();
    for class in active {
        if let Some(family) = spec.family_of(class) {
            if claimed.contains(&family) {
                tracing::debug!("ignoring '{}': option family {} already selected", class, family);
                continue;
            }
            claimed.push(family);
        }
        next.insert(class);
    }
    next
}

/// [`reconcile`] over raw attribute strings, for callers without a registered spec.
pub fn reconcile_classes<S: AsRef<str>>(
    current: &str,
    required: &[&str],
    families: &[&[&str]],
    selections: &[S],
) -> Result<String, ClassSpecError> {
    let spec = ManagedClassSpec::from_slices(required, families)?;
    Ok(reconcile(&ClassList::parse(current), &spec, selections).to_attribute())
}
