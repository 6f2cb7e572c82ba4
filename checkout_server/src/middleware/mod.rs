mod signature;

pub use signature::{StripeSignatureFactory, StripeSignatureService};
