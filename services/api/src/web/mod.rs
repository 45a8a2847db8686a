pub mod goals;
pub mod progress;
pub mod rest;
pub mod state;

// Re-export the OpenAPI definition to make it easily accessible to the
// binaries that serve and generate the specification.
pub use rest::ApiDoc;
