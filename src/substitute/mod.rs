//! The substitution engine.
//!
//! - Comment detection in [`comments`]
//! - Reference scanning in [`scanner`]
//! - Precedence resolution in [`resolve`]
//! - Literal encoding in [`literal`]
//! - Filters in [`filter`]
//! - Rewriting in [`apply`]
//!
//! # Example
//!
//! ```
//! use safe_env::substitute::{substitute_env, EnvSources, Filter};
//! use safe_env::value::{EnvMap, EnvValue};
//!
//! let defaults = EnvMap::from([("CUSTOM_VAR".to_string(), EnvValue::from("default-value"))]);
//! let sources = EnvSources::default().defaults(&defaults);
//! let out = substitute_env("x = process.env.CUSTOM_VAR", &sources, &Filter::default()).unwrap();
//! assert_eq!(out, r#"x = "default-value""#);
//! ```

pub mod apply;
pub mod comments;
pub mod filter;
pub mod literal;
pub mod resolve;
pub mod scanner;

pub use apply::{decide, substitute_env, Replacement};
pub use comments::{comment_spans, strip_comments};
pub use filter::Filter;
pub use literal::{encode, encode_str, parse_number};
pub use resolve::EnvSources;
pub use scanner::{scan, References, VariableRef, RESERVED_REFERENCE};
