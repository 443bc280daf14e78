//! Provider-facing descriptors (data), the effect catalog, and upstream error classification.
//!
//! `descriptor` exposes validated endpoint metadata (`ProviderDescriptor`) covering the REST base
//! URL and the client-credentials token endpoint. `effect` defines the closed [`Effect`] and
//! [`Style`] enumerations together with the static endpoint table. `strategy` classifies the
//! provider's numeric error codes into [`UpstreamErrorKind`].

pub mod descriptor;
pub mod effect;
pub mod strategy;

pub use descriptor::*;
pub use effect::*;
pub use strategy::*;
