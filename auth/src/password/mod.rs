pub mod errors;
pub mod pbkdf2;
pub mod policy;

pub use errors::PasswordError;
pub use errors::WeakPassword;
pub use pbkdf2::PasswordHasher;
pub use policy::PasswordPolicy;
pub use policy::PolicyViolation;
