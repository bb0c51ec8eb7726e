pub mod classifier;
pub mod descriptor;
pub mod exclusion;
pub mod rules;
pub mod verdict;

pub use classifier::{RequestClassifier, truncate_for_log};
pub use descriptor::RequestDescriptor;
pub use exclusion::ExclusionList;
pub use rules::{CatalogError, RuleSetKind, SecurityViolation};
pub use verdict::{RejectCode, Verdict};
