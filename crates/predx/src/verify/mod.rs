//! Checking a table against an expected set of predictions.
//!
//! An [`ExpectedSpec`] is a list of [`RequirementBlock`]s, each denoting the
//! cross product of its fields' allowed values. [`verify_expected`] reports
//! which of those keys have no valid record and which records fall outside
//! every block.

mod report;
mod spec;
mod verifier;

pub use report::{COMPLETE_MESSAGE, Discrepancy, DiscrepancyKind, VerificationReport};
pub use spec::{
    BlockKeys, CAT_FIELD, CLASS_FIELD, ExpectedSpec, LWR_FIELD, PredictionKey, RequirementBlock,
    canonical_value, is_bin_field,
};
pub use verifier::verify_expected;
