//! Link configurations and the registry mapping shortcuts to them.

mod configuration;
mod registry;

pub use configuration::{
    FieldSet, FieldSetStrings, IndexFinder, LinkConfiguration, ObjectFinder, SearchStrings,
    DEFAULT_URL_FIELD,
};
pub use registry::Registry;
