//! Secondary index definitions
//!
//! An index is a name plus a typed accessor selecting the index value from
//! a record. It owns no storage of its own; entries live at the paths built
//! in `crate::path`.

use std::fmt;
use std::sync::Arc;

type Extractor<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// A named, field-based secondary index over records of type `T`
///
/// # Example
///
/// ```ignore
/// let by_state = Index::new("State", |job: &Job| job.state.clone());
/// ```
pub struct Index<T> {
    name: String,
    extract: Extractor<T>,
}

impl<T> Index<T> {
    /// Declare an index called `name` whose value is computed by `extract`
    pub fn new<F>(name: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Index {
            name: name.into(),
            extract: Arc::new(extract),
        }
    }

    /// Index name, used as the path segment after `__index_`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index value of `record`
    pub fn value_of(&self, record: &T) -> String {
        (self.extract)(record)
    }
}

impl<T> Clone for Index<T> {
    fn clone(&self) -> Self {
        Index {
            name: self.name.clone(),
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<T> fmt::Debug for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index").field("name", &self.name).finish()
    }
}
