pub mod error;
pub mod profile;
pub mod settings;
pub mod credentials;
pub mod invocation;
pub mod runner;
pub mod sign;

pub use error::{Error, Result};
pub use profile::{BuildProfile, SigningMaterial};
pub use settings::{SignSettings, ToolHome};
pub use credentials::{ResolvedCredentials, SecretResolver};
pub use invocation::SignInvocation;
pub use sign::AppSigner;
