/// Authentication and authorization utilities
///
/// - `jwt`: Access-token generation and validation (HS256)
/// - `password`: Argon2id password hashing and verification
/// - `middleware`: Request auth context and extractors

pub mod jwt;
pub mod middleware;
pub mod password;
