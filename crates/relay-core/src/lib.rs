pub mod builder;
pub mod error;
pub mod parser;
pub mod sender;
pub mod severity;
pub mod template;

pub use builder::{ObjectsLayout, TrapBuilder, TrapBuilderConfig, UserObject};
pub use error::{RelayError, Result};
pub use parser::{AlertParser, OidResolution, ParserConfig};
pub use sender::{SystemClock, TrapClock, TrapSender};
pub use severity::SeverityRanking;
pub use template::{TemplateRenderer, TemplateService, DEFAULT_DESCRIPTION_TEMPLATE};
