pub mod types;
pub mod error;
pub mod stem;
pub mod content;
pub mod index;
pub mod template;
pub mod conf;
pub mod maintainer;
pub mod parser;
pub mod field;
pub mod custom;
pub mod api;

pub use error::{SmartlinkError, Result};
pub use types::*;
pub use stem::stem;
pub use content::{
    Content, ContentSchema, EmbedOptions, FieldValue, Member, MemorySource, ObjectSource,
    DISPLAY_FIELD, PK_FIELD,
};
pub use index::{SearchIndex, RedbIndex, CURRENT_SCHEMA_VERSION};
pub use template::{SimpleRenderer, Template, TemplateContext, TemplateRenderer, TemplateValue, Templates};
pub use conf::{
    FieldSet, FieldSetStrings, IndexFinder, LinkConfiguration, ObjectFinder, Registry,
    SearchStrings, DEFAULT_URL_FIELD,
};
pub use maintainer::{IndexMaintainer, RebuildReport};
pub use parser::{Grammar, LinkEngine, LinkKind, ParsedLink, Resolution};
pub use field::{normalize_input, SmartLink, SmartLinkValidator};
pub use custom::{CustomLink, ShortcutLines, CUSTOM_LINK_TYPE};
pub use api::Smartlinks;
