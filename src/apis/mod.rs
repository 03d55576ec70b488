/// External service clients
///
/// One submodule per provider, each owning its wire types and auth scheme.
/// Shared HTTP plumbing lives in `client`.
pub mod client;
pub mod llm;
pub mod signals;
pub mod upbit;
