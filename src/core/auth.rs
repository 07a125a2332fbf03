use crate::core::{AppError, AppState};
use axum::extract::State;
use axum::{Error, body::Body, extract::Request, http, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

// struct che codifica il contenuto del token jwt
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub id: i64,
    pub username: String,
}

#[instrument(skip(secret), fields(username = %username, id = %id))]
pub fn encode_jwt(username: String, id: i64, secret: &String) -> Result<String, Error> {
    debug!("Encoding JWT token for user");
    let now = Utc::now();
    let expire: chrono::TimeDelta = Duration::hours(24);
    let exp: usize = (now + expire).timestamp() as usize;
    let iat: usize = now.timestamp() as usize;
    let claim = Claims {
        iat,
        exp,
        username,
        id,
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        Error::new("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: String, secret: &String) -> Result<TokenData<Claims>, Error> {
    debug!("Decoding JWT token");
    decode(
        &jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        error!("Failed to decode JWT token: {:?}", e);
        Error::new("Error in decoding jwt token")
    })
}

/// Middleware di autenticazione: decodifica il bearer token, carica
/// l'utente dal database e lo inserisce nelle Extension della request.
/// Fallisce chiuso: nessuna connessione o route protetta è raggiungibile
/// con un token mancante o non valido.
#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    let auth_header = req.headers_mut().get(http::header::AUTHORIZATION);
    let auth_header = match auth_header {
        Some(header) => header.to_str().map_err(|_| {
            warn!("Invalid authorization header format");
            AppError::forbidden("Empty header is not allowed")
        })?,
        None => {
            warn!("Missing authorization header");
            return Err(AppError::forbidden("Please add the JWT token to the header"));
        }
    };
    let mut header = auth_header.split_whitespace();
    let (_bearer, token) = (header.next(), header.next());
    let token = token.ok_or_else(|| {
        warn!("Malformed authorization header");
        AppError::forbidden("Malformed authorization header")
    })?;
    let token_data = match decode_jwt(token.to_string(), &state.jwt_secret) {
        Ok(data) => data,
        Err(_) => {
            warn!("Failed to decode JWT token");
            return Err(AppError::unauthorized("Unable to decode token"));
        }
    };

    // Fetch the user details from the database
    let current_user = match state.user.find_by_id(&token_data.claims.id).await? {
        Some(user) => {
            info!("User authenticated: {}", user.username);
            user
        }
        None => {
            warn!("User not found in database: {}", token_data.claims.id);
            return Err(AppError::unauthorized("You are not an authorized user"));
        }
    };
    req.extensions_mut().insert(current_user);
    Ok(next.run(req).await)
}
