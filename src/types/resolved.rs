use std::fmt;
use std::sync::Arc;

use super::element::Element;
use super::feature_type::FeatureType;

/// One feature type produced for an element, together with the element as
/// it looked when the type was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Resolved {
    feature_type: Arc<FeatureType>,
    element: Element,
}

impl Resolved {
    pub(crate) fn new(feature_type: Arc<FeatureType>, element: Element) -> Self {
        Self {
            feature_type,
            element,
        }
    }

    #[must_use]
    pub fn feature_type(&self) -> &FeatureType {
        &self.feature_type
    }

    /// The element's tags at the time of the match, after the rule's actions
    /// and the finalize section have run.
    #[must_use]
    pub fn element(&self) -> &Element {
        &self.element
    }

    pub(crate) fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }

    #[must_use]
    pub fn into_element(self) -> Element {
        self.element
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {}", self.feature_type, self.element)
    }
}
