//! Scope Tree - Directory-scoped PCH declarations and their composition
//!
//! Every declaration becomes a node keyed by its directory. A directory's
//! logical parent is the nearest declared ancestor, computed from path
//! segments. The resolver walks the chain root-to-leaf and the validator
//! checks the result before it is handed to the compile step.

pub mod node;
pub mod tree;
pub mod resolver;
pub mod validator;
pub mod cache;

pub use node::{ScopeDeclaration, ScopeNode};
pub use tree::ScopeTree;
pub use resolver::{Composition, CompositionResult, EffectiveIncludeSet, Resolver};
pub use validator::Validator;
pub use cache::ResolutionCache;
