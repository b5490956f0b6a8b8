//! User accounts.

use chrono::{DateTime, Utc};
use coursehub_types::{DomainError, Email, RoleId, UserId, UserRole, UserStatus};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;

use crate::error::DbError;
use crate::serializable::{Reader, Serializable, Writer};

/// A one-time token with an expiry, used for password reset and e-mail
/// confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiringToken {
    /// Opaque token value.
    pub token: String,
    /// Instant after which the token is no longer accepted.
    pub expires_at: DateTime<Utc>,
}

impl ExpiringToken {
    /// Whether the token is still valid at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// A user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    name: String,
    email: Option<Email>,
    #[serde(skip)]
    password: String,
    status: UserStatus,
    role: Option<UserRole>,
    github_username: Option<String>,
    #[serde(skip)]
    reset_password: Option<ExpiringToken>,
    #[serde(skip)]
    confirm_email: Option<ExpiringToken>,
}

impl User {
    /// Factory name.
    pub const TYPE_NAME: &'static str = "User";
    /// Table holding user rows.
    pub const TABLE: &'static str = "users";
    /// Column used for lookups by e-mail address.
    pub const EMAIL_COLUMN: &'static str = "email";

    /// Storage identity.
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Login e-mail address.
    pub const fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    /// Set the login e-mail address.
    pub fn set_email(&mut self, email: Email) {
        self.email = Some(email);
    }

    /// Stored password hash.
    pub fn password_hash(&self) -> &str {
        &self.password
    }

    /// Replace the password hash. Hashing happens outside this layer.
    pub fn set_password_hash(&mut self, hash: impl Into<String>) {
        self.password = hash.into();
    }

    /// Account status.
    pub const fn status(&self) -> UserStatus {
        self.status
    }

    /// Confirm the account; also clears a pending confirmation token.
    pub fn confirm(&mut self) -> Result<(), DomainError> {
        self.status = self.status.confirm()?;
        self.confirm_email = None;
        Ok(())
    }

    /// Suspend the account.
    pub fn suspend(&mut self) -> Result<(), DomainError> {
        self.status = self.status.suspend()?;
        Ok(())
    }

    /// Remove the account.
    pub fn remove(&mut self) -> Result<(), DomainError> {
        self.status = self.status.remove()?;
        Ok(())
    }

    /// Resolved role, if one is assigned.
    pub const fn role(&self) -> Option<&UserRole> {
        self.role.as_ref()
    }

    /// Assign a role.
    pub fn set_role(&mut self, role: UserRole) {
        self.role = Some(role);
    }

    /// Linked GitHub account.
    pub fn github_username(&self) -> Option<&str> {
        self.github_username.as_deref()
    }

    /// Link or unlink a GitHub account.
    pub fn set_github_username(&mut self, username: Option<String>) {
        self.github_username = username;
    }

    /// Pending password-reset token.
    pub const fn reset_password_token(&self) -> Option<&ExpiringToken> {
        self.reset_password.as_ref()
    }

    /// Issue a password-reset token.
    pub fn set_reset_password_token(&mut self, token: impl Into<String>, expires_at: DateTime<Utc>) {
        self.reset_password = Some(ExpiringToken {
            token: token.into(),
            expires_at,
        });
    }

    /// Drop the password-reset token.
    pub fn clear_reset_password_token(&mut self) {
        self.reset_password = None;
    }

    /// Whether `token` is the current, unexpired password-reset token.
    pub fn has_valid_reset_token(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.reset_password
            .as_ref()
            .is_some_and(|t| t.token == token && t.is_valid_at(now))
    }

    /// Pending e-mail confirmation token.
    pub const fn confirm_email_token(&self) -> Option<&ExpiringToken> {
        self.confirm_email.as_ref()
    }

    /// Issue an e-mail confirmation token.
    pub fn set_confirm_email_token(&mut self, token: impl Into<String>, expires_at: DateTime<Utc>) {
        self.confirm_email = Some(ExpiringToken {
            token: token.into(),
            expires_at,
        });
    }

    /// Whether `token` is the current, unexpired confirmation token.
    pub fn has_valid_confirm_token(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.confirm_email
            .as_ref()
            .is_some_and(|t| t.token == token && t.is_valid_at(now))
    }
}

fn read_token(
    reader: &dyn Reader,
    token_attribute: &str,
    expiry_attribute: &str,
) -> Result<Option<ExpiringToken>, DbError> {
    let token = reader.read_string(token_attribute)?;
    let expires_at = reader.read_date_time(expiry_attribute)?;
    Ok(token
        .zip(expires_at)
        .map(|(token, expires_at)| ExpiringToken { token, expires_at }))
}

fn write_token(
    writer: &mut dyn Writer,
    token: Option<&ExpiringToken>,
    token_attribute: &str,
    expiry_attribute: &str,
) {
    writer.write_string(token_attribute, token.map(|t| t.token.as_str()));
    writer.write_date_time(expiry_attribute, token.map(|t| t.expires_at));
}

impl Serializable for User {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn table(&self) -> &'static str {
        Self::TABLE
    }

    fn id(&self) -> i64 {
        self.id.into_inner()
    }

    fn set_id(&mut self, id: i64) {
        self.id = UserId::new(id);
    }

    fn read_from<'a>(&'a mut self, reader: &'a mut dyn Reader) -> BoxFuture<'a, Result<(), DbError>> {
        async move {
            self.name = reader.read_string("name")?.unwrap_or_default();
            self.email = reader.read_email(Self::EMAIL_COLUMN)?;
            self.password = reader.read_string("password")?.unwrap_or_default();
            self.status = match reader.read_string("status")? {
                Some(status) => status.parse()?,
                None => UserStatus::default(),
            };
            self.github_username = reader.read_string("githubUsername")?;
            self.reset_password = read_token(&*reader, "resetPasswordToken", "resetPasswordExpire")?;
            self.confirm_email = read_token(&*reader, "confirmEmailToken", "confirmEmailExpire")?;
            self.role = match reader.read_number("roleId")? {
                Some(id) => Some(UserRole::from_id(RoleId::new(id), reader.role_registry())?),
                None => None,
            };
            Ok(())
        }
        .boxed()
    }

    fn write_to(&self, writer: &mut dyn Writer) {
        writer.write_string("name", Some(&self.name));
        writer.write_string(Self::EMAIL_COLUMN, self.email.as_ref().map(Email::as_str));
        writer.write_string("password", Some(&self.password));
        writer.write_string("status", Some(self.status.as_str()));
        writer.write_string("githubUsername", self.github_username.as_deref());
        write_token(
            writer,
            self.reset_password.as_ref(),
            "resetPasswordToken",
            "resetPasswordExpire",
        );
        write_token(
            writer,
            self.confirm_email.as_ref(),
            "confirmEmailToken",
            "confirmEmailExpire",
        );
        writer.write_number("roleId", self.role.as_ref().map(|r| r.id().into_inner()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::serializable::RowWriter;
    use crate::value::Value;

    #[test]
    fn status_changes_go_through_the_state_machine() {
        let mut user = User::default();
        user.set_confirm_email_token("abc", Utc::now() + Duration::hours(1));
        user.confirm().unwrap();
        assert_eq!(user.status(), UserStatus::Confirmed);
        assert!(user.confirm_email_token().is_none());

        user.remove().unwrap();
        assert!(user.suspend().is_err());
        assert_eq!(user.status(), UserStatus::Removed);
    }

    #[test]
    fn reset_token_expires() {
        let now = Utc::now();
        let mut user = User::default();
        user.set_reset_password_token("t0k3n", now + Duration::minutes(30));
        assert!(user.has_valid_reset_token("t0k3n", now));
        assert!(!user.has_valid_reset_token("other", now));
        assert!(!user.has_valid_reset_token("t0k3n", now + Duration::hours(1)));
        user.clear_reset_password_token();
        assert!(!user.has_valid_reset_token("t0k3n", now));
    }

    #[test]
    fn writes_every_user_column() {
        let mut user = User::default();
        user.set_name("Ada");
        user.set_email(Email::parse("ada@example.org").unwrap());
        user.set_password_hash("$argon2id$...");

        let mut writer = RowWriter::new();
        user.write_to(&mut writer);
        let row = writer.into_row();

        for column in [
            "name",
            "email",
            "password",
            "status",
            "githubUsername",
            "resetPasswordToken",
            "resetPasswordExpire",
            "confirmEmailToken",
            "confirmEmailExpire",
            "roleId",
        ] {
            assert!(row.get(column).is_some(), "missing column {column}");
        }
        assert_eq!(row.get("status"), Some(&Value::from("unconfirmed")));
        assert_eq!(row.get("roleId"), Some(&Value::Number(None)));
        assert!(row.get("id").is_none());
    }

    #[test]
    fn serialized_form_hides_secrets() {
        let mut user = User::default();
        user.set_password_hash("secret-hash");
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"status\":\"unconfirmed\""));
    }
}
