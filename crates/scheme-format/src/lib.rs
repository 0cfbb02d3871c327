pub mod accordion;
pub mod registry;
pub mod render;
pub mod score;
pub mod sections;

pub use accordion::{
    build_accordion, parse_response, render_accordion, ParsedResponse, ParsedScheme,
};
pub use registry::SectionKind;
pub use render::{escape_html, render_markdown};
pub use score::{MatchScore, ScoreBand};
pub use sections::{render_split, split_sections, SchemeSection, SectionSplit};
