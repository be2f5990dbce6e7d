use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::models::user::Role;
use crate::services::authorization::Actor;

/// Claims issued by the authentication service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl TryFrom<&Claims> for Actor {
    type Error = Error;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| Error::Unauthorized("Token subject is not a user id".to_string()))?;
        let role = claims
            .role
            .as_deref()
            .ok_or_else(|| Error::Unauthorized("Token carries no role".to_string()))?
            .parse::<Role>()
            .map_err(|_| Error::Unauthorized("Token carries an unknown role".to_string()))?;
        Ok(Actor::new(id, role))
    }
}

/// HS256 verification key shared by the authenticated routes.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| Error::Unauthorized("invalid_token".to_string()))
    }
}

/// `Ok(None)` when the request carries no Authorization header at all.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, Error> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| Error::Unauthorized("bad_authorization".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or_else(|| Error::Unauthorized("unsupported_scheme".to_string()))
}

/// Resolves a bearer token into an [`Actor`] request extension. Requests without a token
/// pass through anonymously; handlers that need an identity extract `Actor` and get a 401.
/// A token that is present but invalid is rejected here.
pub async fn resolve_bearer_auth(
    State(verifier): State<JwtVerifier>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();
    let actor = match bearer_token(&parts) {
        Ok(Some(token)) => verifier
            .verify(token)
            .and_then(|claims| Actor::try_from(&claims))
            .map(Some),
        Ok(None) => Ok(None),
        Err(e) => Err(e),
    };

    match actor {
        Ok(Some(actor)) => {
            parts.extensions.insert(actor);
            next.run(Request::from_parts(parts, body)).await
        }
        Ok(None) => next.run(Request::from_parts(parts, body)).await,
        Err(e) => {
            tracing::debug!(error = %e, "rejected bearer token");
            e.into_response()
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .copied()
            .ok_or_else(|| Error::Unauthorized("missing_authorization".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, role: Option<&str>) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            role: role.map(String::from),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_resolves_to_an_actor() {
        let id = Uuid::new_v4();
        let verifier = JwtVerifier::new("secret");
        let claims = verifier
            .verify(&token("secret", &id.to_string(), Some("HR")))
            .unwrap();
        let actor = Actor::try_from(&claims).unwrap();
        assert_eq!(actor, Actor::recruiter(id));
    }

    #[test]
    fn wrong_secret_or_missing_role_is_unauthorized() {
        let id = Uuid::new_v4().to_string();
        let verifier = JwtVerifier::new("secret");
        assert!(matches!(
            verifier.verify(&token("other", &id, Some("CANDIDATE"))),
            Err(Error::Unauthorized(_))
        ));
        let claims = verifier.verify(&token("secret", &id, None)).unwrap();
        assert!(matches!(Actor::try_from(&claims), Err(Error::Unauthorized(_))));
    }
}
