use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct LoginDTO {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenDTO {
    pub token: Option<String>,
    pub access_token: Option<String>,
}

impl TokenDTO {
    pub fn into_token(self) -> Option<String> {
        self.token.or(self.access_token).filter(|t| !t.is_empty())
    }
}
