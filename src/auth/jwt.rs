use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Access token claims. Tokens are issued by the identity provider; this
/// service only verifies them.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub(crate) sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl JwtConfig {
    pub fn from_env(secret: String) -> Self {
        Self {
            secret,
            issuer: non_empty_env("JWT_ISSUER"),
            audience: non_empty_env("JWT_AUDIENCE"),
        }
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(audience) = &self.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;

        if let Some(ref typ) = token_data.claims.typ {
            if typ != "access" {
                return Err(jsonwebtoken::errors::Error::from(
                    jsonwebtoken::errors::ErrorKind::InvalidToken,
                ));
            }
        }

        Ok(token_data.claims)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}


#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::test_tokens::{config, token};

    #[test]
    fn accepts_access_token() {
        let config = config();
        let user_id = Uuid::new_v4();
        let claims = config
            .verify_token(&token(&config, user_id, Some("access")))
            .unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[test]
    fn accepts_token_without_typ() {
        let config = config();
        let result = config.verify_token(&token(&config, Uuid::new_v4(), None));
        assert!(result.is_ok());
        assert!(result.unwrap().typ.is_none());
    }

    #[test]
    fn rejects_non_access_token() {
        let config = config();
        let result = config.verify_token(&token(&config, Uuid::new_v4(), Some("email_verification")));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let mut other = config();
        other.secret = "other".to_string();
        let result = config().verify_token(&token(&other, Uuid::new_v4(), None));
        assert!(result.is_err());
    }
}
