use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purpose of a signed token: which operation may accept it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    EmailVerify,
}

/// JWT payload shared by all token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // user ID
    pub jti: Uuid,       // unique token id, makes every issued token distinct
    pub iat: usize,      // issued at (unix timestamp)
    pub exp: usize,      // expires at (unix timestamp)
    pub iss: String,     // issuer
    pub aud: String,     // audience
    pub kind: TokenKind, // token purpose
}
