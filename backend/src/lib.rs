//! Backend library modules for the detect-auto diagnostic service.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;

#[cfg(test)]
pub(crate) mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
