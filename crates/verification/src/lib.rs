pub mod error;
pub mod registry;
pub mod tolerance;
pub mod verifier;
pub mod verifiers;

pub use error::VerificationError;
pub use registry::{BoxedVerifier, VerifierRegistry};
pub use tolerance::{parse_quantity, within_tolerance, DEFAULT_TOLERANCE};
pub use verifier::Verifier;
pub use verifiers::{
    BlueprintAreaVerifier, EmployeeCountVerifier, PowerConsumptionVerifier, WaterSourceVerifier,
};
