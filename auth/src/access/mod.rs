pub mod context;
pub mod policy;

pub use context::SecurityContext;
pub use policy::Access;
pub use policy::AuthorizationPolicy;
pub use policy::AuthorizationRule;
pub use policy::Decision;
pub use policy::PathPattern;
pub use policy::PathPatternError;
