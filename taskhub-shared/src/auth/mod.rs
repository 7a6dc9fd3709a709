/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: HS256 token creation and validation
/// - [`middleware`]: Bearer header to [`middleware::AuthContext`]
/// - [`authorization`]: static role permission table and access checks
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::auth::password::{hash_password, verify_password};
/// use taskhub_shared::auth::jwt::{create_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_P4ssword!")?;
/// assert!(verify_password("user_P4ssword!", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), "admin", "a@example.com");
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
