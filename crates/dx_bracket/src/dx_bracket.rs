//! Bracket-syntax utility class compiler.
//!
//! Turns tokens such as `p-[24px]`, `bg-[#111]` or `md:hover:text-[16px]` into validated,
//! deduplicated CSS rules, or into structured rejections explaining what is wrong.
//!
//! ```rust,ignore
//! use dx_bracket::{ClassCompiler, CompilerConfig, GenerationOptions};
//!
//! let compiler = ClassCompiler::new(CompilerConfig::default())?;
//! let output = compiler.generate("p-[24px] bg-[#FFF]", &GenerationOptions::default())?;
//! println!("{}", output.css);
//! ```

pub mod cache;
pub mod compiler;
pub mod config;
pub mod dedup;
pub mod error;
pub mod options;
pub mod rule;
pub mod safety;
pub mod stylesheet;
pub mod syntax;
pub mod tables;
pub mod value;

pub use cache::{CacheContext, CacheStats, Clock, ManualClock, SystemClock};
pub use compiler::{BatchInput, BatchResult, ClassCompiler, GenerationOutput, GenerationStats};
pub use config::{CacheConfig, CompilerConfig, MatcherConfig};
pub use dedup::{Deduplicator, GroupedRule};
pub use error::{CompileError, Rejection, RejectionKind};
pub use options::GenerationOptions;
pub use rule::{CssRule, Declaration, RuleBuilder};
pub use safety::{RiskLevel, Sanitizer, ThreatDetector, ThreatReport};
pub use syntax::{ClassSyntaxParser, ParsedClass};
pub use tables::{BreakpointTable, PropertyTable, Tables, VariantTable};
pub use value::{ValueParser, ValueType, ValueValidator};
