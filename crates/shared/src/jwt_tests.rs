//! Unit tests for JWT issuing and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use crate::auth::Claims;
use crate::jwt::{JwtConfig, JwtError, JwtService};

fn create_test_service(audience: Option<&str>) -> JwtService {
    JwtService::new(JwtConfig {
        secret: "test-secret-key-for-testing".to_string(),
        audience: audience.map(str::to_string),
        token_expires_minutes: 15,
    })
}

#[test]
fn test_issue_and_validate_token() {
    let service = create_test_service(None);
    let user_id = Uuid::new_v4();

    let token = service
        .issue_token(user_id, Some("ana@example.com"))
        .unwrap();
    let claims = service.validate_token(&token).unwrap();

    assert_eq!(claims.user_id(), user_id);
    assert_eq!(claims.email.as_deref(), Some("ana@example.com"));
    assert_eq!(claims.role, "authenticated");
}

#[test]
fn test_validate_with_audience() {
    let service = create_test_service(Some("authenticated"));
    let token = service.issue_token(Uuid::new_v4(), None).unwrap();
    assert!(service.validate_token(&token).is_ok());
}

#[test]
fn test_wrong_audience_rejected() {
    let issuer = create_test_service(Some("other"));
    let validator = create_test_service(Some("authenticated"));
    let token = issuer.issue_token(Uuid::new_v4(), None).unwrap();
    assert!(matches!(
        validator.validate_token(&token),
        Err(JwtError::DecodingError(_))
    ));
}

#[test]
fn test_wrong_secret_rejected() {
    let service = create_test_service(None);
    let forged = JwtService::new(JwtConfig {
        secret: "another-secret".to_string(),
        ..JwtConfig::default()
    });
    let token = forged.issue_token(Uuid::new_v4(), None).unwrap();
    assert!(service.validate_token(&token).is_err());
}

#[test]
fn test_expired_token() {
    let claims = Claims::new(Uuid::new_v4(), None, Utc::now() - Duration::hours(2));
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret-key-for-testing"),
    )
    .unwrap();

    let service = create_test_service(None);
    assert!(matches!(
        service.validate_token(&token),
        Err(JwtError::Expired)
    ));
}

#[test]
fn test_invalid_token() {
    let service = create_test_service(None);
    assert!(service.validate_token("invalid.token.here").is_err());
}
