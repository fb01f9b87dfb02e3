//! Opaque data records carried by diagram cells.
//!
//! The engine never interprets RDF. An element wraps an IRI, a list of type
//! IRIs, language-tagged labels, and a property map; a link wraps its type IRI
//! and the IRIs of its endpoints.

use std::{collections::BTreeMap, fmt};

use indexmap::IndexMap;

use ontoscope_core::identifier::Id;

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Id);

        impl $name {
            pub fn new(value: &str) -> Self {
                Self(Id::new(value))
            }

            /// Creates a fresh session-unique identifier.
            pub fn generate() -> Self {
                Self(Id::generate($prefix))
            }

            pub fn id(self) -> Id {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

interned_id!(
    /// Engine-assigned identity of an element, stable for the session.
    ElementId,
    "element"
);

interned_id!(
    /// Identity of a link.
    LinkId,
    "link"
);

interned_id!(
    /// IRI of an RDF resource: an entity, a class, a property or a link type.
    Iri,
    "urn:ontoscope:generated"
);

impl Iri {
    /// Returns the last path segment or fragment of the IRI.
    ///
    /// # Examples
    ///
    /// ```
    /// use ontoscope::model::Iri;
    ///
    /// assert_eq!(Iri::new("http://xmlns.com/foaf/0.1/Person").local_name(), "Person");
    /// assert_eq!(Iri::new("http://www.w3.org/2002/07/owl#Thing").local_name(), "Thing");
    /// assert_eq!(Iri::new("urn:isbn").local_name(), "urn:isbn");
    /// ```
    pub fn local_name(self) -> String {
        let full = self.0.to_string();
        let trimmed = full.trim_end_matches(['/', '#']);
        match trimmed.rfind(['/', '#']) {
            Some(pos) if pos + 1 < trimmed.len() => trimmed[pos + 1..].to_string(),
            _ => full,
        }
    }
}

/// Language-tagged text value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    text: String,
    language: Option<String>,
}

impl Literal {
    pub fn new(text: impl Into<String>, language: Option<&str>) -> Self {
        Self {
            text: text.into(),
            language: language.map(str::to_string),
        }
    }

    /// Creates a literal without a language tag.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, None)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

/// Property values keyed by property IRI, in insertion order.
pub type PropertyMap = IndexMap<Iri, Vec<Literal>>;

/// Free-form per-cell extension state.
pub type StateMap = BTreeMap<String, String>;

/// Picks the best label for `language`.
///
/// Preference order: exact language match, then an untagged literal, then
/// the first literal.
///
/// # Examples
///
/// ```
/// use ontoscope::model::{choose_label, Literal};
///
/// let labels = vec![
///     Literal::new("Personne", Some("fr")),
///     Literal::plain("Person"),
///     Literal::new("Person (en)", Some("en")),
/// ];
/// assert_eq!(choose_label(&labels, "en").map(Literal::text), Some("Person (en)"));
/// assert_eq!(choose_label(&labels, "de").map(Literal::text), Some("Person"));
/// assert_eq!(choose_label(&[], "en"), None);
/// ```
pub fn choose_label<'a>(labels: &'a [Literal], language: &str) -> Option<&'a Literal> {
    labels
        .iter()
        .find(|label| label.language() == Some(language))
        .or_else(|| labels.iter().find(|label| label.language().is_none()))
        .or_else(|| labels.first())
}

/// Data record of an element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub iri: Iri,
    pub types: Vec<Iri>,
    pub label: Vec<Literal>,
    pub properties: PropertyMap,
    pub image: Option<String>,
}

impl ElementData {
    pub fn new(iri: Iri) -> Self {
        Self {
            iri,
            types: Vec::new(),
            label: Vec::new(),
            properties: PropertyMap::new(),
            image: None,
        }
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = Iri>) -> Self {
        self.types = types.into_iter().collect();
        self
    }

    pub fn with_label(mut self, label: Literal) -> Self {
        self.label.push(label);
        self
    }

    pub fn with_property(mut self, property: Iri, values: Vec<Literal>) -> Self {
        self.properties.insert(property, values);
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    /// Display label in `language`, falling back to the IRI's local name.
    pub fn display_label(&self, language: &str) -> String {
        choose_label(&self.label, language)
            .map(|label| label.text().to_string())
            .unwrap_or_else(|| self.iri.local_name())
    }
}

impl From<Iri> for ElementData {
    fn from(iri: Iri) -> Self {
        Self::new(iri)
    }
}

/// Data record of a link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkData {
    pub link_type_id: Iri,
    pub source_iri: Iri,
    pub target_iri: Iri,
    pub link_iri: Option<Iri>,
    pub properties: PropertyMap,
}

impl LinkData {
    pub fn new(link_type_id: Iri, source_iri: Iri, target_iri: Iri) -> Self {
        Self {
            link_type_id,
            source_iri,
            target_iri,
            link_iri: None,
            properties: PropertyMap::new(),
        }
    }

    pub fn with_link_iri(mut self, link_iri: Iri) -> Self {
        self.link_iri = Some(link_iri);
        self
    }

    pub fn with_property(mut self, property: Iri, values: Vec<Literal>) -> Self {
        self.properties.insert(property, values);
        self
    }

    /// Returns true if both records describe the same typed connection.
    pub fn same_identity(&self, other: &LinkData) -> bool {
        self.link_type_id == other.link_type_id
            && self.source_iri == other.source_iri
            && self.target_iri == other.target_iri
    }
}
