//! Assembly Elements
//!
//! The ordered list of pieces that "fly in" during assembly. Each element
//! carries an explicit reveal offset; the default layout staggers them
//! `base + i × stride` but that arithmetic happens once, when the specs are
//! built, never in rendering code.

use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;

/// Default offset of the first element
pub const DEFAULT_ELEMENT_BASE: Duration = Duration::from_millis(1200);

/// Default gap between consecutive elements
pub const DEFAULT_ELEMENT_STRIDE: Duration = Duration::from_millis(600);

/// `(id, label)` pairs of the portfolio's default elements
pub const DEFAULT_ELEMENTS: [(&str, &str); 6] = [
    ("html", "HTML"),
    ("css", "CSS"),
    ("js", "JavaScript"),
    ("api", "API"),
    ("db", "Database"),
    ("deploy", "Deploy"),
];

/// Rejected element list
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ElementError {
    /// An element has an empty id
    #[error("element #{index} has an empty id")]
    EmptyId {
        /// Position in the list
        index: usize,
    },

    /// Two elements share an id
    #[error("element id '{id}' is declared more than once")]
    DuplicateId {
        /// The repeated id
        id: String,
    },
}

/// Declarative description of one element
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementSpec {
    /// Stable identifier
    pub id: String,
    /// Display label
    pub label: String,
    /// Mount-relative reveal offset
    pub offset: Duration,
}

impl ElementSpec {
    /// Describe an element
    pub fn new(id: impl Into<String>, label: impl Into<String>, offset: Duration) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            offset,
        }
    }

    /// Specs for `(id, label)` pairs at `base + i × stride`
    #[must_use]
    pub fn staggered(items: &[(&str, &str)], base: Duration, stride: Duration) -> Vec<Self> {
        let mut specs: Vec<Self> = items
            .iter()
            .map(|(id, label)| Self::new(*id, *label, Duration::ZERO))
            .collect();
        restagger(&mut specs, base, stride);
        specs
    }

    /// The six portfolio elements at the default stagger
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        Self::staggered(&DEFAULT_ELEMENTS, DEFAULT_ELEMENT_BASE, DEFAULT_ELEMENT_STRIDE)
    }
}

/// `base + index × stride`, saturating at [`Duration::MAX`]
#[must_use]
pub fn stagger_offset(base: Duration, stride: Duration, index: usize) -> Duration {
    u32::try_from(index)
        .ok()
        .and_then(|index| stride.checked_mul(index))
        .and_then(|step| base.checked_add(step))
        .unwrap_or(Duration::MAX)
}

/// Reassign offsets to `base + i × stride`, keeping ids and labels
pub fn restagger(specs: &mut [ElementSpec], base: Duration, stride: Duration) {
    for (index, spec) in specs.iter_mut().enumerate() {
        spec.offset = stagger_offset(base, stride, index);
    }
}

/// Check ids are present and unique
///
/// # Errors
///
/// Returns the first [`ElementError`] found.
pub fn validate_specs(specs: &[ElementSpec]) -> Result<(), ElementError> {
    let mut seen = HashSet::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        if spec.id.trim().is_empty() {
            return Err(ElementError::EmptyId { index });
        }
        if !seen.insert(spec.id.as_str()) {
            return Err(ElementError::DuplicateId {
                id: spec.id.clone(),
            });
        }
    }
    Ok(())
}

/// An element and whether it has been revealed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblyElement {
    spec: ElementSpec,
    ready: bool,
}

impl AssemblyElement {
    /// Stable identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.spec.id
    }

    /// Display label
    #[must_use]
    pub fn label(&self) -> &str {
        &self.spec.label
    }

    /// Mount-relative reveal offset
    #[must_use]
    pub fn scheduled_offset(&self) -> Duration {
        self.spec.offset
    }

    /// Whether the element has been revealed
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Readiness bookkeeping over the ordered element list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementRevealTracker {
    elements: Vec<AssemblyElement>,
    ready_count: usize,
}

impl ElementRevealTracker {
    /// Build a tracker with every element pending
    ///
    /// # Errors
    ///
    /// Returns [`ElementError`] if ids are empty or repeated.
    pub fn new(specs: Vec<ElementSpec>) -> Result<Self, ElementError> {
        validate_specs(&specs)?;
        Ok(Self {
            elements: specs
                .into_iter()
                .map(|spec| AssemblyElement { spec, ready: false })
                .collect(),
            ready_count: 0,
        })
    }

    /// Flip element `index` to ready
    ///
    /// Returns `false` if it was already ready or does not exist.
    pub fn mark_ready(&mut self, index: usize) -> bool {
        match self.elements.get_mut(index) {
            Some(element) if !element.ready => {
                element.ready = true;
                self.ready_count += 1;
                true
            }
            _ => false,
        }
    }

    /// Elements in declaration order
    #[must_use]
    pub fn elements(&self) -> &[AssemblyElement] {
        &self.elements
    }

    /// How many elements are ready
    #[must_use]
    pub fn ready_count(&self) -> usize {
        self.ready_count
    }

    /// Total number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether there are no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Every element is ready
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        self.ready_count == self.elements.len()
    }
}
