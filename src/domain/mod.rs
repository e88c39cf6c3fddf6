//! Domain types for SMTP authentication and the credentials it references.

pub mod credential;
pub mod id;
pub mod smtp_auth;

pub use credential::{
    CredentialDomain, CredentialKind, CredentialsScope, DomainRequirement, EncryptedSecret,
    StoredCredential,
};
pub use id::CredentialsId;
pub use smtp_auth::{
    CredentialBinding, LegacyCredentials, SmtpAuthentication, SmtpAuthenticationDocument,
};
