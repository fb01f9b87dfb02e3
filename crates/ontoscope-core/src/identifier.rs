//! Interned identifiers.
//!
//! Diagram cells, IRIs, and type keys are compared and hashed constantly while
//! routing and rendering. [`Id`] stores each distinct string once in a global
//! interner and is `Copy`, so comparisons are symbol comparisons.

use std::{
    fmt,
    str::FromStr,
    sync::{
        Mutex, MutexGuard, OnceLock, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

static GENERATED: AtomicU64 = AtomicU64::new(0);

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Interned string identifier.
///
/// # Examples
///
/// ```
/// use ontoscope_core::identifier::Id;
///
/// let person = Id::new("http://example.com/Person");
/// assert_eq!(person, Id::new("http://example.com/Person"));
/// assert_eq!(person, "http://example.com/Person");
///
/// let a = Id::generate("element");
/// let b = Id::generate("element");
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Interns `name` and returns its identifier.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Creates a process-unique identifier with the given prefix.
    ///
    /// Generated identifiers have the form `{prefix}_{n}` where `n` is a
    /// monotonically increasing counter. Names already interned through
    /// [`Id::new`] are skipped, so a generated id never equals an existing one.
    pub fn generate(prefix: &str) -> Self {
        let mut interner = interner();
        loop {
            let idx = GENERATED.fetch_add(1, Ordering::Relaxed);
            let name = format!("{prefix}_{idx}");
            if interner.get(&name).is_none() {
                return Self(interner.get_or_intern(name));
            }
        }
    }

    /// Returns a copy of the interned string.
    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner();
        match interner.resolve(self.0) {
            Some(name) => f.write_str(name),
            None => write!(f, "<unresolved:{:?}>", self.0),
        }
    }
}

impl FromStr for Id {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        interner().get(other) == Some(self.0)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
