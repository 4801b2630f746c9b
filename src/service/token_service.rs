use crate::config::parameter;
use crate::dto::token_dto::{TokenClaimsDto, TokenPairDto};
use crate::error::token_error::TokenError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const ISSUER: &str = "roomkeep";
const ACCESS_AUDIENCE: &str = "roomkeep-access";
const REFRESH_AUDIENCE: &str = "roomkeep-refresh";
const MIN_SECRET_LENGTH: usize = 32;
const MAX_ACCESS_TTL_MINUTES: i64 = 24 * 60;
const MAX_REFRESH_TTL_DAYS: i64 = 365;

/// Signing secrets and lifetimes for both token kinds.
#[derive(Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

impl TokenSettings {
    /// Reads the JWT parameters. A missing or unusable secret is fatal.
    pub fn from_parameters() -> Result<Self, TokenError> {
        Ok(Self {
            access_secret: parameter::get_optional("JWT_ACCESS_SECRET")
                .ok_or(TokenError::MissingSecret("JWT_ACCESS_SECRET"))?,
            refresh_secret: parameter::get_optional("JWT_REFRESH_SECRET")
                .ok_or(TokenError::MissingSecret("JWT_REFRESH_SECRET"))?,
            access_ttl_minutes: parameter::get_i64("JWT_ACCESS_TTL_IN_MINUTES"),
            refresh_ttl_days: parameter::get_i64("JWT_REFRESH_TTL_IN_DAYS"),
        })
    }

    fn validate(&self) -> Result<(), TokenError> {
        for (key, secret) in [
            ("JWT_ACCESS_SECRET", &self.access_secret),
            ("JWT_REFRESH_SECRET", &self.refresh_secret),
        ] {
            if secret.is_empty() {
                return Err(TokenError::MissingSecret(key));
            }
            if secret.len() < MIN_SECRET_LENGTH {
                return Err(TokenError::WeakSecret {
                    key,
                    length: secret.len(),
                });
            }
        }

        if self.access_secret == self.refresh_secret {
            return Err(TokenError::SharedSecret);
        }

        for (key, value, max) in [
            ("JWT_ACCESS_TTL_IN_MINUTES", self.access_ttl_minutes, MAX_ACCESS_TTL_MINUTES),
            ("JWT_REFRESH_TTL_IN_DAYS", self.refresh_ttl_days, MAX_REFRESH_TTL_DAYS),
        ] {
            if !(1..=max).contains(&value) {
                return Err(TokenError::InvalidLifetime { key, value, max });
            }
        }

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenKind {
    Access,
    Refresh,
}

#[derive(Clone)]
pub struct TokenService {
    settings: Arc<TokenSettings>,
}

pub trait TokenServiceTrait {
    fn issue_token_pair(&self, user_id: Uuid, email: &str) -> Result<TokenPairDto, TokenError>;
    fn retrieve_access_claims(&self, token: &str) -> Result<TokenClaimsDto, TokenError>;
    fn retrieve_refresh_claims(&self, token: &str) -> Result<TokenClaimsDto, TokenError>;
}

impl TokenService {
    pub fn new(settings: TokenSettings) -> Result<Self, TokenError> {
        settings.validate()?;

        info!(
            "SECURITY: Token service initialized with access TTL: {} minutes, refresh TTL: {} days",
            settings.access_ttl_minutes, settings.refresh_ttl_days
        );

        Ok(Self {
            settings: Arc::new(settings),
        })
    }

    pub fn from_parameters() -> Result<Self, TokenError> {
        Self::new(TokenSettings::from_parameters()?)
    }

    fn secret(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.settings.access_secret,
            TokenKind::Refresh => &self.settings.refresh_secret,
        }
    }

    fn audience(kind: TokenKind) -> &'static str {
        match kind {
            TokenKind::Access => ACCESS_AUDIENCE,
            TokenKind::Refresh => REFRESH_AUDIENCE,
        }
    }

    fn lifetime(&self, kind: TokenKind) -> chrono::Duration {
        match kind {
            TokenKind::Access => chrono::Duration::minutes(self.settings.access_ttl_minutes),
            TokenKind::Refresh => chrono::Duration::days(self.settings.refresh_ttl_days),
        }
    }

    fn sign(&self, kind: TokenKind, user_id: Uuid, email: &str) -> Result<String, TokenError> {
        let now = chrono::Utc::now();
        let exp = now
            .checked_add_signed(self.lifetime(kind))
            .ok_or_else(|| {
                TokenError::TokenCreationError("Token expiration calculation overflow".to_string())
            })?
            .timestamp();

        let claims = TokenClaimsDto {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp,
            jti: Uuid::now_v7().to_string(),
            iss: ISSUER.to_string(),
            aud: Self::audience(kind).to_string(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret(kind).as_bytes()),
        )
        .map_err(|e| TokenError::TokenCreationError(e.to_string()))
    }

    fn verify(&self, kind: TokenKind, token: &str) -> jsonwebtoken::errors::Result<TokenClaimsDto> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[Self::audience(kind)]);
        validation.validate_exp = true;
        validation.leeway = 30;

        decode::<TokenClaimsDto>(
            token,
            &DecodingKey::from_secret(self.secret(kind).as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
    }
}

impl TokenServiceTrait for TokenService {
    fn issue_token_pair(&self, user_id: Uuid, email: &str) -> Result<TokenPairDto, TokenError> {
        Ok(TokenPairDto {
            access_token: self.sign(TokenKind::Access, user_id, email)?,
            refresh_token: self.sign(TokenKind::Refresh, user_id, email)?,
            token_type: "Bearer".to_string(),
            expires_in: self.lifetime(TokenKind::Access).num_seconds(),
        })
    }

    fn retrieve_access_claims(&self, token: &str) -> Result<TokenClaimsDto, TokenError> {
        self.verify(TokenKind::Access, token).map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::TokenExpired,
            _ => TokenError::InvalidToken,
        })
    }

    fn retrieve_refresh_claims(&self, token: &str) -> Result<TokenClaimsDto, TokenError> {
        self.verify(TokenKind::Refresh, token).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => warn!("SECURITY: Expired refresh token presented"),
                _ => warn!("SECURITY: Malformed or foreign refresh token presented"),
            }
            TokenError::InvalidRefreshToken
        })
    }
}
